/// Character identifiers are opaque strings (UUID v4 for records created
/// here, but rows typed into the sheet by hand may carry anything).
pub type CharacterId = String;

/// Wall-clock time of the last save, as written to the store.
///
/// The sheet holds local time without a zone, so this is naive.
pub type Timestamp = chrono::NaiveDateTime;

/// `strftime` format of the last-modified column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generate a fresh identifier for a record that has not been persisted yet.
pub fn new_character_id() -> CharacterId {
    uuid::Uuid::new_v4().to_string()
}

/// Render a timestamp in the store's column format.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse the store's column format. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    chrono::NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}
