//! # masview-core
//!
//! Core library for masview - a timeline viewer for multi-agent creative runs
//! (audio interpretation, competing squads, critique, image synthesis).
//!
//! This library provides:
//! - Domain types for the reconstructed phase tree
//! - Log-to-timeline reconstruction (normalization, role classification, segmentation)
//! - Run report loading and report discovery
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Data flow
//!
//! - **Raw:** `mas_report.json` written by the multi-agent run (immutable)
//! - **Segmented:** an ordered [`TimelinePhase`] list built in one pure pass
//! - **Rendered:** downstream consumers only read the phase list
//!
//! ## Example
//!
//! ```rust,no_run
//! use masview_core::{timeline, Config, MasReport, Source};
//!
//! let config = Config::load().expect("failed to load config");
//! let report_path = config.discovery.root.join("output_qwen/run/mas_report.json");
//! let report = MasReport::load(&report_path).expect("failed to load report");
//! let phases = timeline::build_timeline(&report, Source::Qwen);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use report::MasReport;
pub use types::*;

// Public modules
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod report;
pub mod timeline;
pub mod types;
