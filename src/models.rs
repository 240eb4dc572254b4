use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub step: usize,
    pub file_name: String,
    pub caption: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExportInfo {
    pub file_name: String,
    pub mime_type: String,
}

/// A generated guide, returned to the caller and never stored server-side.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TestingGuide {
    pub id: Uuid,
    pub instructions: String,
    #[serde(default)]
    pub context: Option<String>, // as supplied, if any
    pub steps: Vec<StepSummary>,
    pub model: String,
    pub export: ExportInfo,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GenerateQuery {
    #[serde(default)]
    pub download: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportRequest {
    pub instructions: String,
}
