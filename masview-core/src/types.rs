//! Core domain types for masview
//!
//! These types describe the phase tree reconstructed from a multi-agent
//! creative run (audio interpretation, competing squads, critique, image
//! synthesis).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **LogEntry** | One `{role, content}` record of the run's linear history |
//! | **Source** | Which pipeline produced the run (`qwen` or `chatgpt`) |
//! | **Director** | A fixed pipeline role (interpreter, visual director, orchestrator, ...) |
//! | **Squad** | One of three fixed competing lanes: harmonic, conflict, random |
//! | **Round** | One discussion, generation and critique cycle across the active squads |
//! | **Phase** | A top-level timeline section: setup, a round, or the final result |
//!
//! The tree is built once per parse and never mutated afterwards; every
//! event and session is owned by exactly one phase.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ============================================
// Log input
// ============================================

/// One record of the upstream run history.
///
/// `role` is free text; its pattern is the only structural signal. `content`
/// is usually a string (plain text or serialized JSON) but is kept as a raw
/// JSON value so non-string payloads pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Value,
}

impl LogEntry {
    pub fn new(role: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Build an entry from an arbitrary JSON value without failing.
    ///
    /// Returns `None` for anything that is not an object. A missing or
    /// non-string role becomes `""`; missing content becomes `null`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let role = obj
            .get("role")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let content = obj.get("content").cloned().unwrap_or(Value::Null);
        Some(Self { role, content })
    }
}

// ============================================
// Source
// ============================================

/// Pipeline that produced a run. Only affects image path resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Qwen,
    #[serde(rename = "chatgpt")]
    ChatGpt,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Qwen, Source::ChatGpt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Qwen => "qwen",
            Source::ChatGpt => "chatgpt",
        }
    }

    /// Directory under the web root holding this source's runs
    pub fn output_dir(&self) -> &'static str {
        match self {
            Source::Qwen => "output_qwen",
            Source::ChatGpt => "output_chatgpt",
        }
    }

    /// Detect the source from a report path such as
    /// `public/output_qwen/<run>/mas_report.json`.
    pub fn infer_from_path(path: &Path) -> Option<Source> {
        path.components().find_map(|component| {
            let name = component.as_os_str().to_str()?;
            Source::ALL.into_iter().find(|s| s.output_dir() == name)
        })
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qwen" => Ok(Source::Qwen),
            "chatgpt" => Ok(Source::ChatGpt),
            _ => Err(format!("unknown source: {}", s)),
        }
    }
}

// ============================================
// Roles and events
// ============================================

/// Rendering and segmentation category derived from a role label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleCategory {
    Interpreter,
    Visual,
    Concept,
    Orchestrator,
    Critic,
    System,
    SquadMember,
}

impl RoleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCategory::Interpreter => "interpreter",
            RoleCategory::Visual => "visual",
            RoleCategory::Concept => "concept",
            RoleCategory::Orchestrator => "orchestrator",
            RoleCategory::Critic => "critic",
            RoleCategory::System => "system",
            RoleCategory::SquadMember => "squad-member",
        }
    }
}

impl std::fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Director output during setup
    Info,
    /// Squad discussion
    Dialogue,
    /// Summarized prompt (role mentions "prompt")
    Prompt,
    /// Director feedback after generation
    Critique,
    /// Synthesized image summary
    Image,
}

/// Critic metrics, metric name to value, in the order the log gave them.
///
/// Always an object: a critic's `scores` field that is not a JSON object
/// is not kept, and its `ci_score` is used instead when numeric.
pub type Scores = serde_json::Map<String, Value>;

/// The normalized unit of display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// Unique within one parse (derived from history position)
    pub id: String,
    pub kind: EventKind,
    /// Copy of the source role
    pub agent_label: String,
    pub role_category: RoleCategory,
    pub title: String,
    /// Normalized content: parsed JSON or the original string
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
}

// ============================================
// Squads
// ============================================

/// One of the three fixed competing lanes.
///
/// Declaration order is the display order and the positional index into a
/// round's generated image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquadTag {
    Harmonic,
    Conflict,
    Random,
}

impl SquadTag {
    /// Fixed iteration order
    pub const ALL: [SquadTag; 3] = [SquadTag::Harmonic, SquadTag::Conflict, SquadTag::Random];

    pub fn as_str(&self) -> &'static str {
        match self {
            SquadTag::Harmonic => "harmonic",
            SquadTag::Conflict => "conflict",
            SquadTag::Random => "random",
        }
    }

    /// Positional rank: harmonic=0, conflict=1, random=2
    pub fn index(&self) -> usize {
        match self {
            SquadTag::Harmonic => 0,
            SquadTag::Conflict => 1,
            SquadTag::Random => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SquadTag::Harmonic => "Harmonic Squad",
            SquadTag::Conflict => "Conflict Squad",
            SquadTag::Random => "Random Squad",
        }
    }

    /// Lowercase role marker that hands buffered dialogue to this squad
    pub fn prompt_marker(&self) -> &'static str {
        match self {
            SquadTag::Harmonic => "harmonic squad prompt",
            SquadTag::Conflict => "conflict squad prompt",
            SquadTag::Random => "random squad prompt",
        }
    }

    /// File name of this squad's final render inside a run directory
    pub fn result_file_name(&self) -> &'static str {
        match self {
            SquadTag::Harmonic => "squad_harmonic.png",
            SquadTag::Conflict => "squad_conflict.png",
            SquadTag::Random => "squad_random.png",
        }
    }
}

impl std::fmt::Display for SquadTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One squad's activity within one round.
///
/// Only constructed when the squad has at least one discussion or critique
/// event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadSession {
    pub id: String,
    pub display_name: String,
    pub squad_tag: SquadTag,
    pub discussion_events: Vec<TimelineEvent>,
    pub critique_events: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_image: Option<String>,
}

impl SquadSession {
    /// Scores of the first critique that carries any, used for round summaries.
    pub fn headline_scores(&self) -> Option<&Scores> {
        self.critique_events
            .iter()
            .find_map(|event| event.scores.as_ref())
    }
}

// ============================================
// Phases
// ============================================

/// Discriminant of a [`TimelinePhase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Setup,
    Round,
    Final,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Setup => "setup",
            PhaseKind::Round => "round",
            PhaseKind::Final => "final",
        }
    }
}

/// A top-level section of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelinePhase {
    /// Director output before the first squad activity
    Setup {
        id: String,
        title: String,
        events: Vec<TimelineEvent>,
    },
    /// One round; squads in harmonic, conflict, random order
    #[serde(rename_all = "camelCase")]
    Round {
        id: String,
        title: String,
        /// 1-based
        round_index: u32,
        squads: Vec<SquadSession>,
    },
    /// Final renders
    Final {
        id: String,
        title: String,
        events: Vec<TimelineEvent>,
    },
}

impl TimelinePhase {
    pub fn id(&self) -> &str {
        match self {
            TimelinePhase::Setup { id, .. }
            | TimelinePhase::Round { id, .. }
            | TimelinePhase::Final { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TimelinePhase::Setup { title, .. }
            | TimelinePhase::Round { title, .. }
            | TimelinePhase::Final { title, .. } => title,
        }
    }

    pub fn kind(&self) -> PhaseKind {
        match self {
            TimelinePhase::Setup { .. } => PhaseKind::Setup,
            TimelinePhase::Round { .. } => PhaseKind::Round,
            TimelinePhase::Final { .. } => PhaseKind::Final,
        }
    }
}

// ============================================
// Manifest
// ============================================

/// One discovered run report, as listed in the experiments manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentIndexItem {
    /// Experiment directory name
    pub id: String,
    pub source: Source,
    pub title: String,
    /// Web-root relative report path (`/output_qwen/<dir>/mas_report.json`)
    pub path: String,
    /// Report path on disk
    pub full_path: String,
}
