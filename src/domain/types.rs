use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Declared semantic type of a field, as supplied by the result metadata.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Date,
    Duration,
    Integer,
    Number,
    Percentage,
    String,
}

impl FieldType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Duration => "duration",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Percentage => "percentage",
            Self::String => "string",
        }
    }
}

/// Per-field declared types for one result set.
pub type MetaTypes = BTreeMap<String, FieldType>;

/// One row of event data: field name to dynamic value.
///
/// Values come straight from the data layer and may be strings, numbers,
/// arrays, or absent. Formatters never assume a shape; they probe and
/// degrade to a placeholder.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EventRow {
    pub values: BTreeMap<String, Value>,
}

impl EventRow {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.values.get(field).and_then(Value::as_f64)
    }

    pub fn items(&self, field: &str) -> Option<&Vec<Value>> {
        self.values.get(field).and_then(Value::as_array)
    }

    /// Field names in deterministic (key) order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, Value); N]> for EventRow {
    fn from(entries: [(&str, Value); N]) -> Self {
        Self {
            values: entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Organization {
    pub slug: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ProjectRecord {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Observable surface of the asynchronous slug→project lookup.
///
/// Until the background resolution lands, `loading` is true and `by_slug`
/// is empty; renderers fall back to a slug-only badge either way.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProjectLookup {
    pub loading: bool,
    pub by_slug: BTreeMap<String, ProjectRecord>,
}

impl ProjectLookup {
    pub fn loading() -> Self {
        Self {
            loading: true,
            by_slug: BTreeMap::new(),
        }
    }

    pub fn resolved(projects: Vec<ProjectRecord>) -> Self {
        Self {
            loading: false,
            by_slug: projects
                .into_iter()
                .map(|project| (project.slug.clone(), project))
                .collect(),
        }
    }

    pub fn get(&self, slug: &str) -> Option<&ProjectRecord> {
        self.by_slug.get(slug)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ThreadFrame {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// A stack-trace thread as reported on one event.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Thread {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crashed: bool,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub frame: Option<ThreadFrame>,
}

/// One exception value attached to an event, tied to the thread it crashed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ExceptionValue {
    #[serde(default)]
    pub thread_id: Option<u64>,
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Stack-trace detail for one event row.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct EventDetail {
    #[serde(default)]
    pub threads: Vec<Thread>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionValue>,
}
