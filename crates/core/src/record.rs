//! Character record model.
//!
//! A record is a handful of denormalized columns (name, image, timestamp)
//! plus a typed [`Sections`] tree that is persisted as a single JSON blob.
//! The JSON keys are the ones already present in the live sheet, so they
//! must not be renamed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{CharacterId, Timestamp};

/// Shown in listings for records whose name was left empty.
pub const UNNAMED_PLACEHOLDER: &str = "名称未設定";

/// Allowed values of `profile.gender`, in display order.
pub const GENDER_OPTIONS: &[&str] = &["男性", "女性", "その他", "不明"];

/// Gender preselected on a fresh form.
pub const DEFAULT_GENDER: &str = "男性";

/* --------------------------------------------------------------------------
Lenient deserializers
-------------------------------------------------------------------------- */

/// Accept strings, `null`, numbers and booleans where a string is expected.
///
/// Cells edited by hand in the sheet (or rows saved by older clients) are
/// not always strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Decode a section from a JSON object only. Derived struct impls would
/// also take an array and fill fields by position.
fn from_object<T, E>(map: Map<String, Value>) -> Result<T, E>
where
    T: for<'a> Deserialize<'a>,
    E: serde::de::Error,
{
    T::deserialize(Value::Object(map)).map_err(E::custom)
}

/// A scalar section: an object, or `null`/missing for the default.
fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> Deserialize<'a> + Default,
{
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        Some(map) => from_object(map),
        None => Ok(T::default()),
    }
}

/// A table section: a list of objects, or `null`/missing for no rows.
fn object_rows_or_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> Deserialize<'a>,
{
    Option::<Vec<Map<String, Value>>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(from_object)
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/* --------------------------------------------------------------------------
Scalar sections
-------------------------------------------------------------------------- */

/// Declare a section made only of string fields.
///
/// Each field is `ident => "json key"`. The ident doubles as the form
/// field name, so form paths stay ASCII even where the blob key is not.
macro_rules! text_section {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $field:ident => $key:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                #[serde(rename = $key, deserialize_with = "lenient_string")]
                pub $field: String,
            )*
        }

        impl $name {
            /// Form field names, in display order.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            /// Blob keys, parallel to [`Self::FIELDS`].
            pub const KEYS: &'static [&'static str] = &[$($key),*];

            pub fn get(&self, field: &str) -> Option<&str> {
                match field {
                    $(f if f == stringify!($field) => Some(self.$field.as_str()),)*
                    _ => None,
                }
            }

            pub fn get_mut(&mut self, field: &str) -> Option<&mut String> {
                match field {
                    $(f if f == stringify!($field) => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
}

text_section! {
    /// Basic profile. `name` and `image_file` are mirrored into the
    /// display-name and image columns on every save.
    Profile {
        name => "name",
        kana => "kana",
        image_file => "image_file",
        age_info => "age_info",
        gender => "gender",
        address => "address",
    }
}

text_section! {
    /// Motivation and self-promotion essays.
    Essay {
        motivation => "motivation",
        self_pr => "self_pr",
    }
}

text_section! {
    Appearance {
        height => "身長",
        weight => "体重",
        hair => "髪型",
        face => "顔の特徴",
        medical_history => "既往症",
        rewards_and_punishments => "賞罰",
    }
}

text_section! {
    Environment {
        family => "家族構成",
        partner => "恋人の有無",
        hobbies => "趣味",
        habits => "嗜好",
    }
}

text_section! {
    Personality {
        strengths => "長所",
        weaknesses => "短所",
    }
}

text_section! {
    /// Answers keyed by the full question text.
    Emotions {
        joy => "この人物が作品に登場するまでの人生でいちばん嬉しかったことはなんですか",
        sadness => "この人物が作品に登場するまでの人生でいちばん悲しかったことはなんですか",
        anger => "この人物が作品に登場するまでの人生でいちばん怒ったことはなんですか",
        fun => "この人物が作品に登場するまでの人生でいちばん楽しかったことはなんですか",
        suffering => "この人物が作品に登場するまでの人生でいちばん苦しかったことはなんですか",
    }
}

text_section! {
    /// Where the story sits in the character's life. Keyed by question text.
    StoryRole {
        position => "この人物が作品に登場することは、それまでの人生でどんな位置にありますか",
        goal => "この人物の、この作品での目的はどんなことですか",
        feared_future => "この人物がこれからの人生で最も起こってほしくないことはどんなことですか",
        wished_future => "この人物がこれからの人生で最も起きてほしいことはどんなことですか",
    }
}

text_section! {
    Others {
        note => "note",
    }
}

/* --------------------------------------------------------------------------
Table sections
-------------------------------------------------------------------------- */

/// One row of the licenses/qualifications table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub content: String,
}

impl LicenseEntry {
    pub fn is_blank(&self) -> bool {
        self.date.trim().is_empty() && self.content.trim().is_empty()
    }
}

/// One row of the life timeline (education, work history, events).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub event: String,
    #[serde(deserialize_with = "lenient_string")]
    pub note: String,
}

impl TimelineEntry {
    pub fn is_blank(&self) -> bool {
        self.date.trim().is_empty() && self.event.trim().is_empty() && self.note.trim().is_empty()
    }
}

/* --------------------------------------------------------------------------
Sections
-------------------------------------------------------------------------- */

/// Names of the scalar (non-table) sections, as used in form paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Profile,
    Essay,
    Appearance,
    Environment,
    Personality,
    Emotions,
    StoryRole,
    Others,
}

impl SectionName {
    pub const ALL: &'static [SectionName] = &[
        Self::Profile,
        Self::Essay,
        Self::Appearance,
        Self::Environment,
        Self::Personality,
        Self::Emotions,
        Self::StoryRole,
        Self::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Essay => "essay",
            Self::Appearance => "appearance",
            Self::Environment => "environment",
            Self::Personality => "personality",
            Self::Emotions => "emotions",
            Self::StoryRole => "story_role",
            Self::Others => "others",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == raw)
    }

    /// Form field names belonging to this section.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Profile => Profile::FIELDS,
            Self::Essay => Essay::FIELDS,
            Self::Appearance => Appearance::FIELDS,
            Self::Environment => Environment::FIELDS,
            Self::Personality => Personality::FIELDS,
            Self::Emotions => Emotions::FIELDS,
            Self::StoryRole => StoryRole::FIELDS,
            Self::Others => Others::FIELDS,
        }
    }

    /// Blob keys belonging to this section, parallel to [`Self::fields`].
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Profile => Profile::KEYS,
            Self::Essay => Essay::KEYS,
            Self::Appearance => Appearance::KEYS,
            Self::Environment => Environment::KEYS,
            Self::Personality => Personality::KEYS,
            Self::Emotions => Emotions::KEYS,
            Self::StoryRole => StoryRole::KEYS,
            Self::Others => Others::KEYS,
        }
    }
}

/// The full nested body of a character, persisted as the blob column.
///
/// Field order matches the blob layout written by earlier clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    #[serde(deserialize_with = "object_or_default")]
    pub profile: Profile,
    #[serde(deserialize_with = "object_rows_or_default")]
    pub licenses: Vec<LicenseEntry>,
    #[serde(deserialize_with = "object_or_default")]
    pub essay: Essay,
    #[serde(deserialize_with = "object_rows_or_default")]
    pub timeline: Vec<TimelineEntry>,
    #[serde(deserialize_with = "object_or_default")]
    pub appearance: Appearance,
    #[serde(deserialize_with = "object_or_default")]
    pub environment: Environment,
    #[serde(deserialize_with = "object_or_default")]
    pub personality: Personality,
    #[serde(deserialize_with = "object_or_default")]
    pub emotions: Emotions,
    #[serde(deserialize_with = "object_or_default")]
    pub story_role: StoryRole,
    #[serde(deserialize_with = "object_or_default")]
    pub others: Others,
}

impl Sections {
    /// Parse a blob column value.
    ///
    /// Only a JSON object is accepted; arrays and scalars are errors.
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str(blob)? {
            Value::Object(map) => from_object(map),
            other => Err(serde_json::Error::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Canonical blob encoding. Non-ASCII text is written as-is.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Remove table rows whose cells are all empty.
    pub fn drop_blank_rows(&mut self) {
        self.licenses.retain(|row| !row.is_blank());
        self.timeline.retain(|row| !row.is_blank());
    }

    pub fn scalar(&self, section: SectionName, field: &str) -> Option<&str> {
        match section {
            SectionName::Profile => self.profile.get(field),
            SectionName::Essay => self.essay.get(field),
            SectionName::Appearance => self.appearance.get(field),
            SectionName::Environment => self.environment.get(field),
            SectionName::Personality => self.personality.get(field),
            SectionName::Emotions => self.emotions.get(field),
            SectionName::StoryRole => self.story_role.get(field),
            SectionName::Others => self.others.get(field),
        }
    }

    pub fn scalar_mut(&mut self, section: SectionName, field: &str) -> Option<&mut String> {
        match section {
            SectionName::Profile => self.profile.get_mut(field),
            SectionName::Essay => self.essay.get_mut(field),
            SectionName::Appearance => self.appearance.get_mut(field),
            SectionName::Environment => self.environment.get_mut(field),
            SectionName::Personality => self.personality.get_mut(field),
            SectionName::Emotions => self.emotions.get_mut(field),
            SectionName::StoryRole => self.story_role.get_mut(field),
            SectionName::Others => self.others.get_mut(field),
        }
    }
}

/* --------------------------------------------------------------------------
Record
-------------------------------------------------------------------------- */

/// A character as reconstructed from one store row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    /// Column copy of `sections.profile.name`.
    pub display_name: String,
    /// Column copy of `sections.profile.image_file`.
    pub image_reference: String,
    /// `None` when the column is empty or unparseable.
    pub last_modified: Option<Timestamp>,
    pub sections: Sections,
}

/// Row shown in the listing and gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub name: String,
    pub age: String,
    pub image: String,
}

impl CharacterRecord {
    /// A record that exists only in memory until its first save.
    pub fn new(id: CharacterId) -> Self {
        Self {
            id,
            display_name: String::new(),
            image_reference: String::new(),
            last_modified: None,
            sections: Sections::default(),
        }
    }

    pub fn summary(&self) -> CharacterSummary {
        let name = if self.display_name.trim().is_empty() {
            UNNAMED_PLACEHOLDER.to_string()
        } else {
            self.display_name.clone()
        };
        CharacterSummary {
            id: self.id.clone(),
            name,
            age: self.sections.profile.age_info.clone(),
            image: self.image_reference.clone(),
        }
    }
}
