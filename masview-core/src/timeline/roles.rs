//! Role classification
//!
//! Log entries carry no discriminant; a free-text role is all there is.
//! Every role is classified once into [`RoleSignals`] and all downstream
//! decisions (display category, setup boundary, squad assignment, critique
//! block termination) read those signals instead of re-matching substrings.

use crate::types::{RoleCategory, SquadTag};

/// Roles that belong to the fixed pipeline rather than to a squad.
const DIRECTOR_ROLES: [&str; 5] = [
    "music interpreter",
    "visual director",
    "concept architect",
    "orchestrator",
    "squad selector",
];

/// Role of the image generation step, matched exactly.
const GENERATION_ROLE: &str = "sdxl";

/// Role suffix that closes a squad's discussion.
const SQUAD_PROMPT: &str = "squad prompt";

/// Classify a role into its display category.
///
/// Case-insensitive substring match, first match wins.
pub fn classify(role: &str) -> RoleCategory {
    classify_lower(&role.to_lowercase())
}

fn classify_lower(role: &str) -> RoleCategory {
    if role.contains("interpreter") {
        RoleCategory::Interpreter
    } else if role.contains("visual") {
        RoleCategory::Visual
    } else if role.contains("concept") {
        RoleCategory::Concept
    } else if role.contains("orchestrator") {
        RoleCategory::Orchestrator
    } else if role.contains("critic") {
        RoleCategory::Critic
    } else if role.contains("sdxl") || role.contains("system") {
        RoleCategory::System
    } else {
        RoleCategory::SquadMember
    }
}

/// A `... squad prompt` role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquadPromptMarker {
    /// Names one of the three squads, e.g. "Harmonic Squad Prompt"
    Tagged(SquadTag),
    /// Mentions a squad prompt without naming the squad
    Untagged,
}

/// Everything segmentation needs to know about one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSignals {
    pub category: RoleCategory,
    /// Member of the fixed director set
    pub is_director: bool,
    /// Mentions "orchestrator"; terminates a critique block
    pub is_orchestrator: bool,
    /// Exactly "sdxl": the round's image generation step
    pub is_generation: bool,
    pub squad_prompt: Option<SquadPromptMarker>,
    /// Mentions "prompt" anywhere
    pub mentions_prompt: bool,
}

impl RoleSignals {
    pub fn parse(role: &str) -> Self {
        let lower = role.to_lowercase();

        let squad_prompt = SquadTag::ALL
            .into_iter()
            .find(|tag| lower.contains(tag.prompt_marker()))
            .map(SquadPromptMarker::Tagged)
            .or_else(|| lower.contains(SQUAD_PROMPT).then_some(SquadPromptMarker::Untagged));

        Self {
            category: classify_lower(&lower),
            is_director: DIRECTOR_ROLES.iter().any(|d| lower.contains(d)),
            is_orchestrator: lower.contains("orchestrator"),
            is_generation: lower == GENERATION_ROLE,
            squad_prompt,
            mentions_prompt: lower.contains("prompt"),
        }
    }

    /// Entries that mark the start of round activity
    pub fn starts_round(&self) -> bool {
        self.is_generation || self.squad_prompt.is_some()
    }

    /// Entries allowed inside a critique block
    pub fn is_critic(&self) -> bool {
        self.is_director || self.is_orchestrator
    }
}
