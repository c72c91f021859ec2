/// Errors from the tabular store layer.
///
/// The record adapter collapses all of these into a single write failure
/// (or an empty listing) before they reach the session.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Neither the key file nor the secret environment variable exists.
    #[error("No service-account credentials found (looked for {path} and ${env_var})")]
    MissingCredentials { path: String, env_var: &'static str },

    /// Credentials were found but could not be parsed or used for signing.
    #[error("Invalid service-account credentials: {0}")]
    Credentials(String),

    /// The token endpoint or the Sheets API refused our identity.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store is switched off or otherwise cannot be reached.
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// The store answered with a non-2xx status.
    #[error("Sheets API error ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// More than one row carries the identifier being written.
    #[error("Identifier {id} appears in {rows} rows; refusing to pick one")]
    DuplicateIdentifier { id: String, rows: usize },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}
