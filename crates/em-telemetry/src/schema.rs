//! Arrow schema definitions for telemetry tables.
//!
//! Tables defined:
//! - `page_visited_table`: One row per page render
//! - `emotion_clf_table`: One row per successful classification

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use em_common::IST_TZ;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Table names for telemetry storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableName {
    PageVisited,
    EmotionClf,
}

impl TableName {
    /// Both tables, in startup order.
    pub const ALL: [TableName; 2] = [TableName::PageVisited, TableName::EmotionClf];

    /// Get the string name for directory layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::PageVisited => "page_visited_table",
            TableName::EmotionClf => "emotion_clf_table",
        }
    }

    /// The fixed schema of this table.
    pub fn schema(&self) -> Arc<Schema> {
        match self {
            TableName::PageVisited => Arc::new(page_visited_schema()),
            TableName::EmotionClf => Arc::new(emotion_clf_schema()),
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Helper to create a timestamp field (microseconds, IST offset).
fn timestamp_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Microsecond, Some(IST_TZ.into())),
        false,
    )
}

fn string_field(name: &str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

/// Schema for `page_visited_table`.
pub fn page_visited_schema() -> Schema {
    Schema::new(vec![string_field("pagename"), timestamp_field("visit_time")])
}

/// Schema for `emotion_clf_table`.
pub fn emotion_clf_schema() -> Schema {
    Schema::new(vec![
        string_field("rawtext"),
        string_field("prediction"),
        Field::new("probability", DataType::Float64, false),
        timestamp_field("time_of_visit"),
    ])
}

/// On-disk description of a table, written once by `ensure_schema`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaManifest {
    pub table: String,
    pub schema_version: String,
    pub fields: Vec<FieldManifest>,
}

/// One column of a [`SchemaManifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldManifest {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

impl SchemaManifest {
    /// Describe the current schema of `table`.
    pub fn for_table(table: TableName) -> Self {
        let fields = table
            .schema()
            .fields()
            .iter()
            .map(|f| FieldManifest {
                name: f.name().clone(),
                data_type: f.data_type().to_string(),
                nullable: f.is_nullable(),
            })
            .collect();
        SchemaManifest {
            table: table.as_str().to_string(),
            schema_version: crate::SCHEMA_VERSION.to_string(),
            fields,
        }
    }
}
