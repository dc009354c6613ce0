use serde_json::{Map, Value};

pub const RESULT_FIELD: &str = "FolderCreationResult";
pub const DESCRIPTION_FIELD: &str = "FolderCreationDescription";

/// Default size of the appended fields, in characters.
pub const DEFAULT_FIELD_SIZE: usize = 200;

/// One row of the stream. Column order is the order of insertion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Read a column as text. Missing and `null` values read as `""`; numbers
    /// and booleans read as their JSON text.
    pub fn field_as_string(&self, name: &str) -> String {
        match self.fields.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Add a column after all existing ones.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_owned(), Value::String(value.into()));
    }
}

/// Ordered column names of a stream, taken from its first record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    columns: Vec<String>,
}

impl Layout {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn from_record(record: &Record) -> Self {
        Self::new(record.names().map(str::to_owned).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/// Metadata describing a field the tool adds to every row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub size: usize,
    pub source: String,
    pub description: String,
}

impl FieldInfo {
    pub fn result(tool_id: u32, size: usize) -> Self {
        Self {
            name: RESULT_FIELD.to_owned(),
            size,
            source: source_label(tool_id),
            description: "Result of folder creation".to_owned(),
        }
    }

    pub fn description(tool_id: u32, size: usize) -> Self {
        Self {
            name: DESCRIPTION_FIELD.to_owned(),
            size,
            source: source_label(tool_id),
            description: "Detailed status / error message for folder creation".to_owned(),
        }
    }
}

fn source_label(tool_id: u32) -> String {
    format!("DirectoryCreate Tool - ID: {}", tool_id)
}

/// Input layout followed by the appended fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    pub passthrough: Layout,
    pub appended: Vec<FieldInfo>,
}

impl OutputLayout {
    pub fn column_names(&self) -> Vec<&str> {
        self.passthrough
            .columns()
            .iter()
            .map(String::as_str)
            .chain(self.appended.iter().map(|field| field.name.as_str()))
            .collect()
    }
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_to(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_owned(),
        None => text.to_owned(),
    }
}
