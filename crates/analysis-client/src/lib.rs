//! Client for a KataGo-style Jungle engine: process session, streamed
//! analysis, rule controls and move evaluation.

pub mod analysis;
pub mod command_log;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
mod reader;
pub mod rules;
pub mod situation;
pub mod state;

pub use analysis::{AnalysisCandidate, AnalysisStore};
pub use command_log::{CommandLog, Direction, LogEntry};
pub use config::EngineConfig;
pub use engine::EngineSession;
pub use error::SessionError;
pub use evaluator::{MoveEvaluation, MoveQuality};
pub use rules::{Aggressiveness, DrawRule, RuleBits, RuleConfig};
pub use situation::{Advantage, Assessment};
pub use state::{ClickOutcome, Lifecycle, SessionState};
