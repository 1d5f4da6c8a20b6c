//! Run report (`mas_report.json`) model
//!
//! The report is produced by an external multi-agent run. No schema is
//! enforced: every field is optional and malformed sections read as absent
//! so that timeline reconstruction always gets something to work with.

use crate::error::Result;
use crate::types::{LogEntry, SquadTag};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

/// Top-level run artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MasReport {
    pub base_prompt: Option<String>,
    pub timestamp: Option<String>,
    /// Base directory of the run, used for synthesized squad render paths
    pub run_dir: Option<String>,
    pub intermediates_dir: Option<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub final_images: Vec<String>,
    pub final_state: Option<FinalState>,
    /// Older runs keep the history at the top level
    #[serde(deserialize_with = "lenient_history")]
    pub history: Option<Vec<LogEntry>>,
}

/// Orchestrator state at the end of the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalState {
    pub iteration: Option<u32>,
    pub user_prompt: Option<String>,
    pub mood_report: Value,
    pub visual_blueprint: Value,
    pub conceptual_elements: Value,
    pub final_draft: Option<FinalDraft>,
    pub squad_selection_instructions: Value,
    pub squad_assignments: Option<SquadAssignments>,
    #[serde(deserialize_with = "lenient_history")]
    pub history: Option<Vec<LogEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalDraft {
    pub main_prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub style_guidelines: Option<String>,
}

/// Agents assigned to each squad lane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadAssignments {
    pub harmonic: Vec<AgentInfo>,
    pub conflict: Vec<AgentInfo>,
    pub random: Vec<AgentInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub prompt: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub category: Option<String>,
}

impl MasReport {
    /// Interpret an already-parsed JSON document as a report.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a report file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let report = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            entries = report.history().len(),
            "Loaded run report"
        );
        Ok(report)
    }

    /// The ordered run log.
    ///
    /// `final_state.history` wins whenever it is present, even when empty;
    /// the top-level `history` is only consulted otherwise.
    pub fn history(&self) -> &[LogEntry] {
        self.final_state
            .as_ref()
            .and_then(|state| state.history.as_deref())
            .or(self.history.as_deref())
            .unwrap_or(&[])
    }

    pub fn final_images(&self) -> &[String] {
        &self.final_images
    }

    /// Non-empty run directory, if declared
    pub fn run_dir(&self) -> Option<&str> {
        self.run_dir.as_deref().filter(|dir| !dir.is_empty())
    }

    /// Agents assigned to a squad (empty when the report has no assignments).
    pub fn squad_members(&self, tag: SquadTag) -> &[AgentInfo] {
        let Some(assignments) = self
            .final_state
            .as_ref()
            .and_then(|state| state.squad_assignments.as_ref())
        else {
            return &[];
        };
        match tag {
            SquadTag::Harmonic => &assignments.harmonic,
            SquadTag::Conflict => &assignments.conflict,
            SquadTag::Random => &assignments.random,
        }
    }
}

/// Accept any JSON for a history field; only arrays count, and only object
/// elements become entries.
fn lenient_history<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<LogEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.iter().filter_map(LogEntry::from_value).collect()),
        _ => None,
    })
}

/// Accept any JSON for a path list; keep string elements only.
fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
