//! Log-to-timeline reconstruction
//!
//! Turns a run's linear, heterogeneous `{role, content}` history into a
//! phase tree: one setup phase, the rounds with up to three squad sessions
//! each, and an optional final phase.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌────────────────────┐
//! │  MasReport   │ ──► │   segmenter   │ ──► │ Vec<TimelinePhase> │
//! │  (history)   │     │               │     │                    │
//! └──────────────┘     └───────────────┘     └────────────────────┘
//!                         │    │     │
//!                         ▼    ▼     ▼
//!                    roles  normalize  paths
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use masview_core::timeline::build_timeline;
//! use masview_core::{MasReport, Source};
//! use std::path::Path;
//!
//! let report = MasReport::load(Path::new("public/output_qwen/run/mas_report.json"))?;
//! let phases = build_timeline(&report, Source::Qwen);
//! println!("{} phases", phases.len());
//! # Ok::<(), masview_core::Error>(())
//! ```

mod normalize;
mod paths;
mod roles;
mod segmenter;

pub use normalize::{normalize, normalize_str};
pub use paths::{final_render_paths, resolve_path};
pub use roles::{classify, RoleSignals, SquadPromptMarker};
pub use segmenter::{
    build_timeline, critique_step, discussion_step, final_phase, segment, setup_step,
    CritiqueStep, DiscussionStep, SetupStep, CI_SCORE_TERMINATION,
};
