//! Form schema and the flatten/unflatten mapping between [`Sections`] and
//! editable form values.
//!
//! Scalar fields are addressed by `"<section>.<field>"` paths (for example
//! `profile.name` or `appearance.height`). The two table sections,
//! licenses and timeline, travel as ordered row lists next to the scalar map.
//!
//! This module has no I/O and no knowledge of the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::record::{
    LicenseEntry, SectionName, Sections, TimelineEntry, DEFAULT_GENDER, GENDER_OPTIONS,
};

// ---------------------------------------------------------------------------
// Field paths
// ---------------------------------------------------------------------------

/// A validated reference to one scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub section: SectionName,
    pub field: &'static str,
}

impl FieldPath {
    /// Parse `"<section>.<field>"`, rejecting anything not in the schema.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let (section, field) = raw
            .split_once('.')
            .ok_or_else(|| CoreError::Validation(format!("Malformed field path '{raw}'")))?;
        let section = SectionName::parse(section)
            .ok_or_else(|| CoreError::Validation(format!("Unknown section '{section}'")))?;
        let field = section
            .fields()
            .iter()
            .copied()
            .find(|f| *f == field)
            .ok_or_else(|| CoreError::Validation(format!("Unknown field '{raw}'")))?;
        Ok(Self { section, field })
    }

    pub fn to_path_string(self) -> String {
        format!("{}.{}", self.section.as_str(), self.field)
    }

    /// Every scalar field, in schema order.
    pub fn all() -> impl Iterator<Item = FieldPath> {
        SectionName::ALL.iter().flat_map(|section| {
            section.fields().iter().map(move |field| FieldPath {
                section: *section,
                field: *field,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Form values
// ---------------------------------------------------------------------------

/// Editable state of an open form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues {
    /// Scalar fields keyed by path.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub licenses: Vec<LicenseEntry>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

/// A partial update sent by the form UI. Tables, when present, replace the
/// whole table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormPatch {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    pub licenses: Option<Vec<LicenseEntry>>,
    pub timeline: Option<Vec<TimelineEntry>>,
}

impl FormValues {
    /// Set one scalar field. The path must exist in the schema.
    pub fn set(&mut self, path: &str, value: impl Into<String>) -> Result<(), CoreError> {
        let path = FieldPath::parse(path)?;
        self.fields.insert(path.to_path_string(), value.into());
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    /// Apply a patch atomically: nothing changes if any path is unknown.
    pub fn apply(&mut self, patch: FormPatch) -> Result<(), CoreError> {
        for path in patch.fields.keys() {
            FieldPath::parse(path)?;
        }
        self.fields.extend(patch.fields);
        if let Some(licenses) = patch.licenses {
            self.licenses = licenses;
        }
        if let Some(timeline) = patch.timeline {
            self.timeline = timeline;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Flatten / unflatten
// ---------------------------------------------------------------------------

/// Spread a record's sections into form values.
///
/// Every schema field is present in the result. An empty table is
/// presented as a single blank row so the editor has somewhere to type.
pub fn flatten(sections: &Sections) -> FormValues {
    let fields = FieldPath::all()
        .map(|path| {
            let value = sections
                .scalar(path.section, path.field)
                .unwrap_or_default()
                .to_string();
            (path.to_path_string(), value)
        })
        .collect();

    let licenses = if sections.licenses.is_empty() {
        vec![LicenseEntry::default()]
    } else {
        sections.licenses.clone()
    };
    let timeline = if sections.timeline.is_empty() {
        vec![TimelineEntry::default()]
    } else {
        sections.timeline.clone()
    };

    FormValues {
        fields,
        licenses,
        timeline,
    }
}

/// Reassemble sections from form values, dropping blank table rows.
///
/// Fields missing from the map stay empty.
pub fn unflatten(form: &FormValues) -> Result<Sections, CoreError> {
    let mut sections = Sections::default();
    for (raw, value) in &form.fields {
        let path = FieldPath::parse(raw)?;
        if let Some(slot) = sections.scalar_mut(path.section, path.field) {
            slot.clone_from(value);
        }
    }
    sections.licenses = form.licenses.clone();
    sections.timeline = form.timeline.clone();
    sections.drop_blank_rows();
    Ok(sections)
}

/// Form values for a record that does not exist yet.
pub fn blank_form() -> FormValues {
    let mut form = flatten(&Sections::default());
    form.fields
        .insert("profile.gender".to_string(), DEFAULT_GENDER.to_string());
    form
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The tabs of the character form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormTab {
    Profile,
    Timeline,
    Traits,
    Emotions,
    StoryRole,
}

impl FormTab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "基本プロフィール",
            Self::Timeline => "年表(履歴)",
            Self::Traits => "外見・環境・性格等",
            Self::Emotions => "喜怒哀楽",
            Self::StoryRole => "人生における作品の位置",
        }
    }
}

/// Input widget used for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Text,
    TextArea,
    Select,
}

/// Definition of one scalar form field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    /// `"<section>.<field>"`.
    pub path: String,
    pub label: String,
    pub tab: FormTab,
    pub widget: WidgetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// One column of a table section.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
}

/// Definition of a table section (licenses, timeline).
#[derive(Debug, Clone, Serialize)]
pub struct TableDef {
    pub name: &'static str,
    pub label: &'static str,
    pub tab: FormTab,
    pub columns: Vec<ColumnDef>,
}

/// Full form layout handed to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub tabs: Vec<(FormTab, &'static str)>,
    pub fields: Vec<FieldDef>,
    pub tables: Vec<TableDef>,
}

fn field(
    section: SectionName,
    name: &str,
    label: &str,
    tab: FormTab,
    widget: WidgetKind,
) -> FieldDef {
    FieldDef {
        path: format!("{}.{}", section.as_str(), name),
        label: label.to_string(),
        tab,
        widget,
        help: None,
        options: vec![],
    }
}

/// Fields whose label is the question text stored as the blob key.
fn question_fields(section: SectionName, tab: FormTab) -> impl Iterator<Item = FieldDef> {
    section
        .fields()
        .iter()
        .zip(section.keys())
        .map(move |(name, question)| field(section, name, question, tab, WidgetKind::TextArea))
}

/// Return the canonical scalar field definitions.
pub fn field_defs() -> Vec<FieldDef> {
    use FormTab::*;
    use SectionName as S;
    use WidgetKind::*;

    let mut image = field(S::Profile, "image_file", "画像URL", Profile, Text);
    image.help = Some("Googleドライブの画像の共有リンクなどを貼ってください".into());

    let mut gender = field(S::Profile, "gender", "性別", Profile, Select);
    gender.options = GENDER_OPTIONS.iter().map(|s| s.to_string()).collect();

    let mut medical = field(S::Appearance, "medical_history", "既往症", Traits, TextArea);
    medical.help = Some("病歴やアレルギーなど".into());

    let mut rewards = field(S::Appearance, "rewards_and_punishments", "賞罰", Traits, TextArea);
    rewards.help = Some("受賞歴や前科など".into());

    let mut defs = vec![
        image,
        field(S::Profile, "name", "氏名", Profile, Text),
        field(S::Profile, "kana", "ふりがな", Profile, Text),
        field(S::Profile, "age_info", "年齢・生年月日", Profile, Text),
        gender,
        field(S::Profile, "address", "現住所", Profile, Text),
        field(S::Essay, "motivation", "志望動機", Profile, TextArea),
        field(S::Essay, "self_pr", "自己PR", Profile, TextArea),
        field(S::Appearance, "height", "身長", Traits, Text),
        field(S::Appearance, "weight", "体重", Traits, Text),
        field(S::Appearance, "hair", "髪型", Traits, Text),
        field(S::Appearance, "face", "顔の特徴", Traits, TextArea),
        medical,
        rewards,
        field(S::Environment, "family", "家族構成", Traits, TextArea),
        field(S::Environment, "partner", "恋人の有無", Traits, Text),
        field(S::Environment, "hobbies", "趣味", Traits, TextArea),
        field(S::Environment, "habits", "嗜好歴・喫煙・飲酒歴", Traits, TextArea),
        field(S::Personality, "strengths", "長所", Traits, TextArea),
        field(S::Personality, "weaknesses", "短所", Traits, TextArea),
    ];
    defs.extend(question_fields(S::Emotions, Emotions));
    defs.extend(question_fields(S::StoryRole, StoryRole));
    defs.push(field(S::Others, "note", "設定事項（どんなことでも）", StoryRole, TextArea));
    defs
}

/// Return the table section definitions.
pub fn table_defs() -> Vec<TableDef> {
    vec![
        TableDef {
            name: "licenses",
            label: "免許・資格",
            tab: FormTab::Profile,
            columns: vec![
                ColumnDef {
                    key: "date",
                    label: "年月",
                    help: Some("例: 2015年4月"),
                },
                ColumnDef {
                    key: "content",
                    label: "免許・資格の内容",
                    help: None,
                },
            ],
        },
        TableDef {
            name: "timeline",
            label: "学歴・職歴・出来事",
            tab: FormTab::Timeline,
            columns: vec![
                ColumnDef {
                    key: "date",
                    label: "年月",
                    help: Some("例: 2010年4月"),
                },
                ColumnDef {
                    key: "event",
                    label: "出来事",
                    help: None,
                },
                ColumnDef {
                    key: "note",
                    label: "備考・詳細",
                    help: None,
                },
            ],
        },
    ]
}

pub fn form_schema() -> FormSchema {
    let tabs = [
        FormTab::Profile,
        FormTab::Timeline,
        FormTab::Traits,
        FormTab::Emotions,
        FormTab::StoryRole,
    ]
    .into_iter()
    .map(|tab| (tab, tab.label()))
    .collect();

    FormSchema {
        tabs,
        fields: field_defs(),
        tables: table_defs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_sections() -> Sections {
        let mut s = Sections::default();
        s.profile.name = "Aki".into();
        s.profile.gender = "女性".into();
        s.essay.self_pr = "負けず嫌い".into();
        s.appearance.height = "158cm".into();
        s.environment.family = "父、母、弟".into();
        s.emotions.anger = "約束を破られた".into();
        s.story_role.wished_future = "家族の再会".into();
        s.others.note = "左利き".into();
        s.timeline = vec![TimelineEntry {
            date: "2010年4月".into(),
            event: "小学校入学".into(),
            note: String::new(),
        }];
        s.licenses = vec![LicenseEntry {
            date: "2020年3月".into(),
            content: "英検2級".into(),
        }];
        s
    }

    #[test]
    fn field_path_parses_known_fields() {
        let path = FieldPath::parse("appearance.height").unwrap();
        assert_eq!(path.section, SectionName::Appearance);
        assert_eq!(path.field, "height");
    }

    #[test]
    fn field_path_rejects_unknown_input() {
        assert!(FieldPath::parse("profile").is_err());
        assert!(FieldPath::parse("villain.name").is_err());
        assert!(FieldPath::parse("profile.height").is_err());
    }

    #[test]
    fn flatten_then_unflatten_roundtrips() {
        let sections = sample_sections();
        assert_eq!(unflatten(&flatten(&sections)).unwrap(), sections);
    }

    #[test]
    fn flatten_covers_every_schema_field() {
        let form = flatten(&Sections::default());
        let schema_paths: HashSet<String> = field_defs().into_iter().map(|d| d.path).collect();
        let form_paths: HashSet<String> = form.fields.keys().cloned().collect();
        assert_eq!(schema_paths, form_paths);
    }

    #[test]
    fn empty_tables_get_one_blank_row_and_lose_it_on_unflatten() {
        let form = flatten(&Sections::default());
        assert_eq!(form.timeline, vec![TimelineEntry::default()]);
        assert_eq!(form.licenses, vec![LicenseEntry::default()]);

        let sections = unflatten(&form).unwrap();
        assert!(sections.timeline.is_empty());
        assert!(sections.licenses.is_empty());
    }

    #[test]
    fn unflatten_filters_blank_rows_between_populated_ones() {
        let mut form = flatten(&Sections::default());
        form.timeline = vec![
            TimelineEntry {
                date: "2001".into(),
                event: "誕生".into(),
                note: String::new(),
            },
            TimelineEntry::default(),
            TimelineEntry {
                date: "2019".into(),
                event: "上京".into(),
                note: "一人暮らし".into(),
            },
        ];
        let sections = unflatten(&form).unwrap();
        let events: Vec<&str> = sections.timeline.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, ["誕生", "上京"]);
    }

    #[test]
    fn unflatten_rejects_unknown_paths() {
        let mut form = FormValues::default();
        form.fields.insert("profile.blood_type".into(), "A".into());
        assert!(unflatten(&form).is_err());
    }

    #[test]
    fn blank_form_preselects_default_gender() {
        let form = blank_form();
        assert_eq!(form.get("profile.gender"), Some(DEFAULT_GENDER));
        assert_eq!(form.get("profile.name"), Some(""));
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut form = blank_form();
        let mut patch = FormPatch::default();
        patch.fields.insert("profile.name".into(), "Aki".into());
        patch.fields.insert("profile.nope".into(), "x".into());
        assert!(form.apply(patch).is_err());
        assert_eq!(form.get("profile.name"), Some(""));
    }

    #[test]
    fn apply_replaces_tables_when_given() {
        let mut form = blank_form();
        let patch = FormPatch {
            fields: BTreeMap::new(),
            licenses: Some(vec![]),
            timeline: None,
        };
        form.apply(patch).unwrap();
        assert!(form.licenses.is_empty());
        assert_eq!(form.timeline.len(), 1);
    }

    #[test]
    fn schema_paths_are_unique_and_parseable() {
        let defs = field_defs();
        let unique: HashSet<&str> = defs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(unique.len(), defs.len());
        for def in &defs {
            assert!(FieldPath::parse(&def.path).is_ok(), "{}", def.path);
        }
    }

    #[test]
    fn gender_field_lists_options() {
        let gender = field_defs()
            .into_iter()
            .find(|d| d.path == "profile.gender")
            .unwrap();
        assert_eq!(gender.widget, WidgetKind::Select);
        assert_eq!(gender.options.len(), GENDER_OPTIONS.len());
    }

    #[test]
    fn question_fields_use_question_text_as_label() {
        let joy = field_defs()
            .into_iter()
            .find(|d| d.path == "emotions.joy")
            .unwrap();
        assert!(joy.label.contains("嬉しかった"));
        assert_eq!(joy.tab, FormTab::Emotions);
    }
}
