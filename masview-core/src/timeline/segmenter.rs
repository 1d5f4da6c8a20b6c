//! Timeline segmentation
//!
//! Walks the linear run history once and cuts it into a setup phase, zero
//! or more rounds and an optional final phase.
//!
//! ## State machine
//!
//! ```text
//! Setup ──(squad prompt | sdxl | non-director)──► Discussion
//! Discussion ──(sdxl)──► CritiqueBlock(harmonic) ─► CritiqueBlock(conflict) ─► CritiqueBlock(random)
//! CritiqueBlock(tag) ──(orchestrator consumed)──► CritiqueBlock(next active tag)
//! CritiqueBlock(tag) ──(non-director seen)──► Assembly   (remaining tags get nothing)
//! Assembly ──(no sessions)──► Done
//! Assembly ──(entries left, squads active)──► Discussion
//! ```
//!
//! Each state has a pure step function ([`setup_step`], [`discussion_step`],
//! [`critique_step`]) deciding what one entry does; [`Segmenter`] only moves
//! the cursor and collects events.
//!
//! Critique blocks are assigned to squads purely by order (harmonic,
//! conflict, random, skipping retired squads). Interleaved critique blocks
//! in the upstream log would be misattributed.

use super::normalize::normalize;
use super::paths::{final_render_paths, resolve_path};
use super::roles::{RoleSignals, SquadPromptMarker};
use crate::report::MasReport;
use crate::types::{
    EventKind, LogEntry, RoleCategory, Scores, Source, SquadSession, SquadTag, TimelineEvent,
    TimelinePhase,
};
use serde_json::Value;

/// An orchestrator verdict at or above this CI score retires the squad.
///
/// Slightly below 4.0 to absorb float noise in upstream scores.
pub const CI_SCORE_TERMINATION: f64 = 3.99;

// ============================================
// Transitions
// ============================================

/// What a setup-phase entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    /// Director output, part of the setup phase
    Consume,
    /// Round activity begins here; the entry is left for the round
    Stop,
}

pub fn setup_step(signals: &RoleSignals) -> SetupStep {
    if signals.starts_round() || !signals.is_director {
        SetupStep::Stop
    } else {
        SetupStep::Consume
    }
}

/// What a discussion-phase entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscussionStep {
    /// Image generation: record the round's images and end the discussion
    Generate,
    /// Buffer the entry, then hand the whole buffer to this squad
    Flush(SquadTag),
    /// Buffer the entry
    Hold,
}

pub fn discussion_step(signals: &RoleSignals) -> DiscussionStep {
    if signals.is_generation {
        return DiscussionStep::Generate;
    }
    match signals.squad_prompt {
        Some(SquadPromptMarker::Tagged(tag)) => DiscussionStep::Flush(tag),
        // An untagged squad prompt cannot be attributed; it stays buffered
        Some(SquadPromptMarker::Untagged) | None => DiscussionStep::Hold,
    }
}

/// What a critique-phase entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CritiqueStep {
    /// Director feedback within the current block
    Collect,
    /// Orchestrator verdict: consume it and close the block
    Close,
    /// Next round has begun: stop without consuming, for every remaining squad
    Halt,
}

pub fn critique_step(signals: &RoleSignals) -> CritiqueStep {
    if !signals.is_critic() {
        CritiqueStep::Halt
    } else if signals.is_orchestrator {
        CritiqueStep::Close
    } else {
        CritiqueStep::Collect
    }
}

// ============================================
// Segmenter
// ============================================

/// Squads still taking part in rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSquads([bool; 3]);

impl ActiveSquads {
    fn all() -> Self {
        Self([true; 3])
    }

    fn contains(&self, tag: SquadTag) -> bool {
        self.0[tag.index()]
    }

    fn retire(&mut self, tag: SquadTag) {
        self.0[tag.index()] = false;
    }

    fn is_empty(&self) -> bool {
        !self.0.iter().any(|active| *active)
    }
}

/// Per-squad event lists indexed by [`SquadTag::index`]
type Lanes = [Vec<TimelineEvent>; 3];

struct Discussion {
    lanes: Lanes,
    images: Vec<String>,
}

struct Segmenter<'a> {
    history: &'a [LogEntry],
    source: Source,
    cursor: usize,
    active: ActiveSquads,
}

impl<'a> Segmenter<'a> {
    fn new(history: &'a [LogEntry], source: Source) -> Self {
        Self {
            history,
            source,
            cursor: 0,
            active: ActiveSquads::all(),
        }
    }

    /// Current entry with its position and signals
    fn peek(&self) -> Option<(usize, &'a LogEntry, RoleSignals)> {
        let entry = self.history.get(self.cursor)?;
        Some((self.cursor, entry, RoleSignals::parse(&entry.role)))
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.history.len()
    }

    fn run(mut self) -> Vec<TimelinePhase> {
        let mut phases = vec![self.setup_phase()];

        let mut round_index = 1;
        while !self.is_exhausted() && !self.active.is_empty() {
            match self.round(round_index) {
                Some(phase) => phases.push(phase),
                None => {
                    tracing::debug!(
                        round = round_index,
                        remaining = self.history.len() - self.cursor,
                        "Round produced no squad activity, stopping"
                    );
                    break;
                }
            }
            round_index += 1;
        }

        phases
    }

    fn setup_phase(&mut self) -> TimelinePhase {
        let mut events = Vec::new();

        while let Some((position, entry, signals)) = self.peek() {
            if setup_step(&signals) == SetupStep::Stop {
                break;
            }
            events.push(TimelineEvent {
                id: format!("setup-{}", position),
                kind: EventKind::Info,
                agent_label: entry.role.clone(),
                role_category: signals.category,
                title: entry.role.clone(),
                content: normalize(&entry.content),
                images: None,
                scores: None,
            });
            self.cursor += 1;
        }

        TimelinePhase::Setup {
            id: "phase-0".to_string(),
            title: "Phase 0: Director's Vision".to_string(),
            events,
        }
    }

    fn round(&mut self, round_index: u32) -> Option<TimelinePhase> {
        // Squads retired during this round still show up in it
        let participating = self.active;

        let Discussion {
            lanes: mut discussion,
            images,
        } = self.discussion(round_index);
        let mut critiques = self.critiques(round_index);

        let squads: Vec<SquadSession> = SquadTag::ALL
            .into_iter()
            .filter(|tag| participating.contains(*tag))
            .filter_map(|tag| {
                let discussion_events = std::mem::take(&mut discussion[tag.index()]);
                let critique_events = std::mem::take(&mut critiques[tag.index()]);
                if discussion_events.is_empty() && critique_events.is_empty() {
                    return None;
                }
                Some(SquadSession {
                    id: format!("sq-{}-{}", tag, round_index),
                    display_name: tag.display_name().to_string(),
                    squad_tag: tag,
                    discussion_events,
                    critique_events,
                    result_image: images.get(tag.index()).cloned(),
                })
            })
            .collect();

        if squads.is_empty() {
            return None;
        }

        Some(TimelinePhase::Round {
            id: format!("round-{}", round_index),
            title: format!("Round {}", round_index),
            round_index,
            squads,
        })
    }

    /// Buffer squad dialogue until the generation step.
    fn discussion(&mut self, round_index: u32) -> Discussion {
        let mut lanes = Lanes::default();
        let mut images = Vec::new();
        let mut pending: Vec<TimelineEvent> = Vec::new();

        while let Some((position, entry, signals)) = self.peek() {
            self.cursor += 1;

            let step = discussion_step(&signals);
            if step == DiscussionStep::Generate {
                images = self.generated_images(&entry.content, round_index);
                break;
            }

            let kind = if signals.mentions_prompt {
                EventKind::Prompt
            } else {
                EventKind::Dialogue
            };
            pending.push(TimelineEvent {
                id: format!("round-{}-{}", round_index, position),
                kind,
                agent_label: entry.role.clone(),
                role_category: signals.category,
                title: entry.role.clone(),
                content: normalize(&entry.content),
                images: None,
                scores: None,
            });

            if let DiscussionStep::Flush(tag) = step {
                lanes[tag.index()].append(&mut pending);
            }
        }

        if !pending.is_empty() {
            tracing::debug!(
                round = round_index,
                entries = pending.len(),
                "Discussion entries never assigned to a squad"
            );
        }

        Discussion { lanes, images }
    }

    /// Parse the generation step's content as a list of image paths.
    ///
    /// Anything other than a JSON array of strings yields no images.
    fn generated_images(&self, content: &Value, round_index: u32) -> Vec<String> {
        let parsed = match content {
            Value::String(s) => serde_json::from_str::<Value>(s).ok(),
            Value::Array(_) => Some(content.clone()),
            _ => None,
        };

        let paths: Option<Vec<String>> = parsed.as_ref().and_then(Value::as_array).and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(|p| resolve_path(p, self.source)))
                .collect()
        });

        paths.unwrap_or_else(|| {
            tracing::debug!(round = round_index, "Unreadable generation output, no round images");
            Vec::new()
        })
    }

    /// Consume one critique block per active squad, in fixed order.
    fn critiques(&mut self, round_index: u32) -> Lanes {
        let mut lanes = Lanes::default();

        for tag in SquadTag::ALL {
            if !self.active.contains(tag) {
                continue;
            }

            let mut halted = false;
            while let Some((position, entry, signals)) = self.peek() {
                let step = critique_step(&signals);
                if step == CritiqueStep::Halt {
                    halted = true;
                    break;
                }
                self.cursor += 1;

                let content = normalize(&entry.content);
                let scores = extract_scores(&content);
                let ci_score = content.get("ci_score").and_then(Value::as_f64);

                lanes[tag.index()].push(TimelineEvent {
                    id: format!("round-{}-crit-{}", round_index, position),
                    kind: EventKind::Critique,
                    agent_label: entry.role.clone(),
                    role_category: RoleCategory::Critic,
                    title: format!("{} (Critic)", entry.role),
                    content,
                    images: None,
                    scores,
                });

                if step == CritiqueStep::Close {
                    if let Some(score) = ci_score.filter(|s| *s >= CI_SCORE_TERMINATION) {
                        tracing::debug!(
                            round = round_index,
                            squad = %tag,
                            ci_score = score,
                            "Squad reached termination score"
                        );
                        self.active.retire(tag);
                    }
                    break;
                }
            }

            if halted {
                break;
            }
        }

        lanes
    }
}

/// Pull critic metrics out of normalized content.
///
/// An object-valued `scores` field is used verbatim; otherwise a numeric
/// `ci_score` becomes a single "CI Score" entry.
fn extract_scores(content: &Value) -> Option<Scores> {
    let object = content.as_object()?;

    if let Some(Value::Object(scores)) = object.get("scores") {
        return Some(scores.clone());
    }

    let ci_score = object.get("ci_score").filter(|v| v.is_number())?;
    let mut scores = Scores::new();
    scores.insert("CI Score".to_string(), ci_score.clone());
    Some(scores)
}

// ============================================
// Public entry points
// ============================================

/// Segment a run history into the setup phase and its rounds.
///
/// Pure and deterministic: the same history and source always produce the
/// same phases. Malformed input only ever shrinks the result.
pub fn segment(history: &[LogEntry], source: Source) -> Vec<TimelinePhase> {
    let phases = Segmenter::new(history, source).run();
    tracing::debug!(
        entries = history.len(),
        phases = phases.len(),
        source = %source,
        "Segmented run history"
    );
    phases
}

/// The final phase, present only when the report declares final images.
pub fn final_phase(report: &MasReport, source: Source) -> Option<TimelinePhase> {
    if report.final_images().is_empty() {
        return None;
    }

    let images = final_render_paths(report.final_images(), report.run_dir(), source);

    Some(TimelinePhase::Final {
        id: "phase-final".to_string(),
        title: "Final Result".to_string(),
        events: vec![TimelineEvent {
            id: "final-images".to_string(),
            kind: EventKind::Image,
            agent_label: "System".to_string(),
            role_category: RoleCategory::System,
            title: "Final High-Res Output".to_string(),
            content: Value::String("Consensus reached. Generating final output.".to_string()),
            images: Some(images),
            scores: None,
        }],
    })
}

/// Build the complete phase tree for a report.
pub fn build_timeline(report: &MasReport, source: Source) -> Vec<TimelinePhase> {
    let mut phases = segment(report.history(), source);
    phases.extend(final_phase(report, source));
    phases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhaseKind;
    use serde_json::json;

    fn entry(role: &str, content: &str) -> LogEntry {
        LogEntry::new(role, content)
    }

    fn verdict(score: f64) -> LogEntry {
        LogEntry::new(
            "Orchestrator",
            json!({"ci_score": score, "refinement_instruction": "push the contrast"}).to_string(),
        )
    }

    fn rounds(phases: &[TimelinePhase]) -> Vec<&Vec<SquadSession>> {
        phases
            .iter()
            .filter_map(|phase| match phase {
                TimelinePhase::Round { squads, .. } => Some(squads),
                _ => None,
            })
            .collect()
    }

    fn setup_events(phases: &[TimelinePhase]) -> &Vec<TimelineEvent> {
        match &phases[0] {
            TimelinePhase::Setup { events, .. } => events,
            other => panic!("expected setup phase first, got {:?}", other.kind()),
        }
    }

    fn tags(squads: &[SquadSession]) -> Vec<SquadTag> {
        squads.iter().map(|s| s.squad_tag).collect()
    }

    /// One full round: discussion and prompt for each squad, generation,
    /// then a critique block per squad closed by an orchestrator verdict.
    fn full_round(squads: &[SquadTag], scores: &[f64]) -> Vec<LogEntry> {
        let mut log = Vec::new();
        for tag in squads {
            log.push(entry("The Minimalist", "fewer shapes"));
            log.push(entry(
                &format!("{} Squad Prompt", tag.display_name().replace(" Squad", "")),
                "a quiet shoreline at dusk",
            ));
        }
        log.push(entry("SDXL", r#"["h.png", "c.png", "r.png"]"#));
        for score in scores {
            log.push(entry("Music Interpreter", "tempo matches"));
            log.push(verdict(*score));
        }
        log
    }

    // ----------------------------------------
    // Transitions
    // ----------------------------------------

    #[test]
    fn test_setup_step_transitions() {
        assert_eq!(
            setup_step(&RoleSignals::parse("Music Interpreter")),
            SetupStep::Consume
        );
        assert_eq!(
            setup_step(&RoleSignals::parse("The Dadaist")),
            SetupStep::Stop
        );
        assert_eq!(setup_step(&RoleSignals::parse("SDXL")), SetupStep::Stop);
        // Director-looking role that is a squad prompt still starts the round
        assert_eq!(
            setup_step(&RoleSignals::parse("Orchestrator Squad Prompt")),
            SetupStep::Stop
        );
    }

    #[test]
    fn test_discussion_step_transitions() {
        assert_eq!(
            discussion_step(&RoleSignals::parse("SDXL")),
            DiscussionStep::Generate
        );
        assert_eq!(
            discussion_step(&RoleSignals::parse("Conflict Squad Prompt")),
            DiscussionStep::Flush(SquadTag::Conflict)
        );
        assert_eq!(
            discussion_step(&RoleSignals::parse("The Dadaist")),
            DiscussionStep::Hold
        );
    }

    #[test]
    fn test_critique_step_transitions() {
        assert_eq!(
            critique_step(&RoleSignals::parse("Visual Director")),
            CritiqueStep::Collect
        );
        assert_eq!(
            critique_step(&RoleSignals::parse("Orchestrator")),
            CritiqueStep::Close
        );
        assert_eq!(
            critique_step(&RoleSignals::parse("The Dadaist")),
            CritiqueStep::Halt
        );
    }

    // ----------------------------------------
    // Setup
    // ----------------------------------------

    #[test]
    fn test_empty_history_yields_empty_setup() {
        let phases = segment(&[], Source::Qwen);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].kind(), PhaseKind::Setup);
        assert!(setup_events(&phases).is_empty());
    }

    #[test]
    fn test_setup_takes_exactly_the_director_prefix() {
        let log = vec![
            entry("Music Interpreter", r#"{"mood": "wistful"}"#),
            entry("Visual Director", "muted palette"),
            entry("Squad Selector", "three squads"),
            entry("The Post-Humanist", "what if the sea were glass"),
            entry("Orchestrator", "noted"),
        ];
        let phases = segment(&log, Source::Qwen);
        let events = setup_events(&phases);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, "setup-0");
        assert_eq!(events[0].kind, EventKind::Info);
        assert_eq!(events[0].role_category, RoleCategory::Interpreter);
        assert_eq!(events[0].content, json!({"mood": "wistful"}));
        assert_eq!(events[2].agent_label, "Squad Selector");
    }

    #[test]
    fn test_setup_stops_at_squad_prompt() {
        let log = vec![
            entry("Orchestrator", "begin"),
            entry("Harmonic Squad Prompt", "calm water"),
        ];
        let phases = segment(&log, Source::Qwen);
        assert_eq!(setup_events(&phases).len(), 1);
    }

    // ----------------------------------------
    // Rounds
    // ----------------------------------------

    #[test]
    fn test_single_harmonic_round_scenario() {
        let log = vec![
            entry("Music Interpreter", "slow minor key"),
            entry("Visual Director", "deep blues"),
            entry("The Minimalist", "one boat"),
            entry("Harmonic Squad Prompt", "a lone boat on still water"),
            entry("SDXL", r#"["h.png","c.png","r.png"]"#),
            entry("Music Interpreter", "fits the tempo"),
            entry("Visual Director", r#"{"scores": {"palette": 3, "composition": 4}}"#),
            entry("Orchestrator", r#"{"ci_score": 2.1}"#),
        ];
        let phases = segment(&log, Source::Qwen);

        assert_eq!(phases.len(), 2);
        assert_eq!(setup_events(&phases).len(), 2);

        let TimelinePhase::Round {
            id,
            round_index,
            squads,
            ..
        } = &phases[1]
        else {
            panic!("expected a round phase");
        };
        assert_eq!(id, "round-1");
        assert_eq!(*round_index, 1);
        assert_eq!(tags(squads), vec![SquadTag::Harmonic]);

        let harmonic = &squads[0];
        assert_eq!(harmonic.id, "sq-harmonic-1");
        assert_eq!(harmonic.display_name, "Harmonic Squad");
        assert_eq!(harmonic.discussion_events.len(), 2);
        assert_eq!(harmonic.discussion_events[0].kind, EventKind::Dialogue);
        assert_eq!(harmonic.discussion_events[0].id, "round-1-2");
        assert_eq!(harmonic.discussion_events[1].kind, EventKind::Prompt);
        assert_eq!(harmonic.critique_events.len(), 3);
        assert!(harmonic
            .critique_events
            .iter()
            .all(|e| e.kind == EventKind::Critique && e.role_category == RoleCategory::Critic));
        assert_eq!(harmonic.critique_events[2].title, "Orchestrator (Critic)");
        assert_eq!(harmonic.critique_events[2].id, "round-1-crit-7");
        assert_eq!(
            harmonic.result_image.as_deref(),
            Some("output_qwen/h.png")
        );
    }

    #[test]
    fn test_images_map_by_position_not_discussion_order() {
        let mut log = vec![entry("Orchestrator", "setup")];
        for tag in [SquadTag::Random, SquadTag::Harmonic, SquadTag::Conflict] {
            log.push(entry("The Surrealist", "melting clocks"));
            log.push(entry(tag.prompt_marker(), "prompt text"));
        }
        log.push(entry("SDXL", r#"["a.png","b.png","c.png"]"#));
        for _ in 0..3 {
            log.push(verdict(1.0));
        }

        let phases = segment(&log, Source::ChatGpt);
        let squads = rounds(&phases)[0];

        assert_eq!(
            tags(squads),
            vec![SquadTag::Harmonic, SquadTag::Conflict, SquadTag::Random]
        );
        let images: Vec<_> = squads
            .iter()
            .map(|s| s.result_image.as_deref().unwrap())
            .collect();
        assert_eq!(images, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_rounds_continue_until_log_exhausted() {
        let mut log = vec![entry("Music Interpreter", "setup")];
        for _ in 0..3 {
            log.extend(full_round(&SquadTag::ALL, &[2.0, 3.0, 3.98]));
        }

        let phases = segment(&log, Source::Qwen);
        let rounds = rounds(&phases);

        assert_eq!(rounds.len(), 3);
        for squads in rounds {
            assert_eq!(tags(squads), SquadTag::ALL.to_vec());
            assert!(squads.iter().all(|s| s.critique_events.len() == 2));
        }
        assert_eq!(phases.last().unwrap().id(), "round-3");
    }

    #[test]
    fn test_terminated_squad_leaves_later_rounds() {
        let mut log = vec![entry("Music Interpreter", "setup")];
        // Harmonic reaches 4.0 in round 1
        log.extend(full_round(&SquadTag::ALL, &[4.0, 2.0, 2.5]));
        // Round 2: a stray harmonic marker, then conflict and random
        log.extend(full_round(&SquadTag::ALL, &[3.0, 3.5]));

        let phases = segment(&log, Source::Qwen);
        let rounds = rounds(&phases);
        assert_eq!(rounds.len(), 2);

        // Still shown in the round where it terminated
        assert_eq!(tags(rounds[0]), SquadTag::ALL.to_vec());

        let second = rounds[1];
        assert_eq!(tags(second), vec![SquadTag::Conflict, SquadTag::Random]);
        // First block of round 2 goes to conflict, the next active squad
        let conflict_score = second[0].headline_scores().unwrap();
        assert_eq!(conflict_score["CI Score"], json!(3.0));
        let random_score = second[1].headline_scores().unwrap();
        assert_eq!(random_score["CI Score"], json!(3.5));
    }

    #[test]
    fn test_all_squads_terminated_stops_rounds() {
        let mut log = vec![entry("Music Interpreter", "setup")];
        log.extend(full_round(&SquadTag::ALL, &[4.0, 3.995, 5.0]));
        log.extend(full_round(&SquadTag::ALL, &[1.0, 1.0, 1.0]));

        let phases = segment(&log, Source::Qwen);
        assert_eq!(rounds(&phases).len(), 1);
    }

    #[test]
    fn test_non_director_halts_remaining_critique_blocks() {
        let log = vec![
            entry("Orchestrator", "setup"),
            entry("The Dadaist", "chaos"),
            entry("Harmonic Squad Prompt", "p1"),
            entry("The Cubist", "angles"),
            entry("Conflict Squad Prompt", "p2"),
            entry("The Romantic", "storms"),
            entry("Random Squad Prompt", "p3"),
            entry("SDXL", r#"["h.png","c.png","r.png"]"#),
            // harmonic block
            entry("Visual Director", "good"),
            verdict(2.0),
            // conflict block cut short by the next round
            entry("Concept Architect", "unclear"),
            entry("The Dadaist", "again"),
            entry("Conflict Squad Prompt", "p2'"),
            entry("SDXL", r#"["h2.png","c2.png","r2.png"]"#),
        ];

        let phases = segment(&log, Source::ChatGpt);
        let rounds = rounds(&phases);
        assert_eq!(rounds.len(), 2);

        let first = rounds[0];
        assert_eq!(tags(first), SquadTag::ALL.to_vec());
        assert_eq!(first[0].critique_events.len(), 2);
        assert_eq!(first[1].critique_events.len(), 1);
        assert!(first[2].critique_events.is_empty());
        assert_eq!(first[2].discussion_events.len(), 2);

        let second = rounds[1];
        assert_eq!(tags(second), vec![SquadTag::Conflict]);
        assert_eq!(second[0].discussion_events[0].id, "round-2-11");
        assert!(second[0].critique_events.is_empty());
        assert_eq!(second[0].result_image.as_deref(), Some("c2.png"));
    }

    #[test]
    fn test_empty_round_halts_processing() {
        let log = vec![
            entry("Music Interpreter", "setup"),
            entry("The Dadaist", "unmarked chatter"),
            entry("SDXL", "[]"),
            entry("The Dadaist", "more chatter"),
            entry("Harmonic Squad Prompt", "p"),
            entry("SDXL", r#"["h.png"]"#),
            verdict(1.0),
        ];

        let phases = segment(&log, Source::Qwen);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].kind(), PhaseKind::Setup);
    }

    #[test]
    fn test_unreadable_generation_output_leaves_no_images() {
        let log = vec![
            entry("The Minimalist", "dot"),
            entry("Harmonic Squad Prompt", "a single dot"),
            entry("SDXL", "generation failed: CUDA OOM"),
            verdict(2.0),
        ];

        let phases = segment(&log, Source::Qwen);
        let squads = rounds(&phases)[0];
        assert_eq!(squads[0].result_image, None);
        assert_eq!(squads[0].critique_events.len(), 1);
    }

    #[test]
    fn test_generation_output_with_non_string_paths_is_discarded() {
        let log = vec![
            entry("Random Squad Prompt", "p"),
            entry("SDXL", r#"["h.png", 2, "r.png"]"#),
        ];
        let phases = segment(&log, Source::ChatGpt);
        let squads = rounds(&phases)[0];
        assert_eq!(squads[0].squad_tag, SquadTag::Random);
        assert_eq!(squads[0].result_image, None);
    }

    #[test]
    fn test_short_image_list_leaves_later_squads_without_image() {
        let mut log = full_round(&SquadTag::ALL, &[1.0, 1.0, 1.0]);
        let sdxl = log.iter().position(|e| e.role == "SDXL").unwrap();
        log[sdxl] = entry("SDXL", r#"["only.png"]"#);

        let phases = segment(&log, Source::ChatGpt);
        let squads = rounds(&phases)[0];
        assert_eq!(squads[0].result_image.as_deref(), Some("only.png"));
        assert_eq!(squads[1].result_image, None);
        assert_eq!(squads[2].result_image, None);
    }

    #[test]
    fn test_log_ending_mid_critique_keeps_partial_block() {
        let log = vec![
            entry("The Minimalist", "dot"),
            entry("Conflict Squad Prompt", "p"),
            entry("SDXL", r#"["h.png","c.png","r.png"]"#),
            // Harmonic gets the first block even though only conflict spoke
            entry("Visual Director", "half a thought"),
        ];

        let phases = segment(&log, Source::ChatGpt);
        let squads = rounds(&phases)[0];
        assert_eq!(tags(squads), vec![SquadTag::Harmonic, SquadTag::Conflict]);
        assert!(squads[0].discussion_events.is_empty());
        assert_eq!(squads[0].critique_events.len(), 1);
        assert_eq!(squads[1].critique_events.len(), 0);
    }

    // ----------------------------------------
    // Scores
    // ----------------------------------------

    #[test]
    fn test_extract_scores_keeps_log_order() {
        let content = normalize(&json!(r#"{"scores": {"palette": 3, "composition": 4, "balance": 1}}"#));
        let scores = extract_scores(&content).unwrap();
        let names: Vec<_> = scores.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["palette", "composition", "balance"]);
    }

    #[test]
    fn test_non_object_scores_fall_back_to_ci_score() {
        let scores = extract_scores(&json!({"scores": "high", "ci_score": 2.0})).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["CI Score"], json!(2.0));
    }

    #[test]
    fn test_extract_scores() {
        let scores = extract_scores(&json!({"scores": {"harmony": 4, "novelty": 2}})).unwrap();
        assert_eq!(scores["harmony"], json!(4));
        assert_eq!(scores.len(), 2);

        let scores = extract_scores(&json!({"ci_score": 3.25})).unwrap();
        assert_eq!(scores["CI Score"], json!(3.25));

        // Explicit scores win over ci_score
        let scores = extract_scores(&json!({"scores": {"a": 1}, "ci_score": 4.0})).unwrap();
        assert!(!scores.contains_key("CI Score"));

        assert!(extract_scores(&json!({"ci_score": "high"})).is_none());
        assert!(extract_scores(&json!({"scores": [4, 3]})).is_none());
        assert!(extract_scores(&json!("plain text")).is_none());
        assert!(extract_scores(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_fenced_verdict_terminates_squad() {
        let mut log = vec![
            entry("The Minimalist", "dot"),
            entry("Harmonic Squad Prompt", "p"),
            entry("SDXL", r#"["h.png"]"#),
            entry("Orchestrator", "```json\n{\"ci_score\": 4.0}\n```"),
        ];
        log.extend(full_round(&[SquadTag::Harmonic], &[]));

        let phases = segment(&log, Source::Qwen);
        // Round 2 only carries harmonic discussion, which is dropped for a
        // retired squad, so it has nothing to show.
        let rounds = rounds(&phases);
        assert_eq!(rounds.len(), 1);
        assert_eq!(
            rounds[0][0].critique_events[0].scores.as_ref().unwrap()["CI Score"],
            json!(4.0)
        );
    }

    // ----------------------------------------
    // Final phase and determinism
    // ----------------------------------------

    #[test]
    fn test_final_phase_requires_final_images() {
        let report = MasReport::default();
        assert!(final_phase(&report, Source::Qwen).is_none());

        let report = MasReport::from_value(json!({
            "run_dir": "run_9",
            "final_images": ["run_9/final.png"]
        }))
        .unwrap();
        let Some(TimelinePhase::Final { id, events, .. }) = final_phase(&report, Source::Qwen)
        else {
            panic!("expected final phase");
        };
        assert_eq!(id, "phase-final");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Image);
        assert_eq!(events[0].role_category, RoleCategory::System);
        assert_eq!(events[0].images.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_build_timeline_appends_final_phase() {
        let mut history = vec![json!({"role": "Music Interpreter", "content": "setup"})];
        for e in full_round(&SquadTag::ALL, &[4.0, 4.0, 4.0]) {
            history.push(json!({"role": e.role, "content": e.content}));
        }
        let report = MasReport::from_value(json!({
            "final_images": ["output_chatgpt/r/squad_harmonic.png"],
            "final_state": {"history": history}
        }))
        .unwrap();

        let phases = build_timeline(&report, Source::ChatGpt);
        let kinds: Vec<_> = phases.iter().map(TimelinePhase::kind).collect();
        assert_eq!(
            kinds,
            vec![PhaseKind::Setup, PhaseKind::Round, PhaseKind::Final]
        );
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let mut log = vec![entry("Music Interpreter", r#"{"bpm": 72}"#)];
        log.extend(full_round(&SquadTag::ALL, &[4.0, 2.0, 3.0]));
        log.extend(full_round(&SquadTag::ALL, &[2.0, 2.0]));

        let first = segment(&log, Source::Qwen);
        let second = segment(&log, Source::Qwen);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
