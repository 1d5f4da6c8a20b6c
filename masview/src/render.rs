//! Plain-text outline of a phase tree

use masview_core::{SquadSession, TimelineEvent, TimelinePhase};
use serde_json::Value;
use std::fmt::Write;

/// Score entries shown per squad in a round summary
const SUMMARY_SCORES: usize = 2;

/// Render phases as an indented outline, one block per phase.
pub fn outline(phases: &[TimelinePhase]) -> String {
    let mut out = String::new();

    for phase in phases {
        let _ = writeln!(out, "== {} [{}]", phase.title(), phase.kind().as_str());
        match phase {
            TimelinePhase::Setup { events, .. } => {
                if events.is_empty() {
                    let _ = writeln!(out, "   (no director output)");
                }
                for event in events {
                    let _ = writeln!(out, "   {}", event_line(event));
                }
            }
            TimelinePhase::Round { squads, .. } => {
                for squad in squads {
                    write_squad(&mut out, squad);
                }
            }
            TimelinePhase::Final { events, .. } => {
                for event in events {
                    let _ = writeln!(out, "   {}", event.title);
                    for image in event.images.iter().flatten() {
                        let _ = writeln!(out, "     - {}", image);
                    }
                }
            }
        }
        out.push('\n');
    }

    out
}

fn event_line(event: &TimelineEvent) -> String {
    format!("{} ({})", event.agent_label, event.role_category)
}

fn write_squad(out: &mut String, squad: &SquadSession) {
    let _ = writeln!(
        out,
        "   {}: {} discussion, {} critique",
        squad.display_name,
        squad.discussion_events.len(),
        squad.critique_events.len()
    );
    let _ = writeln!(
        out,
        "     image:  {}",
        squad.result_image.as_deref().unwrap_or("pending")
    );
    if let Some(scores) = squad.headline_scores() {
        let summary = scores
            .iter()
            .take(SUMMARY_SCORES)
            .map(|(name, value)| format!("{}={}", name.replace('_', " "), format_score_value(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "     scores: {}", summary);
    }
}

/// Format a score value for display
fn format_score_value(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 => format!("{}", f as i64),
            Some(f) => format!("{:.2}", f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
