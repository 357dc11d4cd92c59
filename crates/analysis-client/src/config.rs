//! Engine configuration from environment variables

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::DEFAULT_REFRESH_INTERVAL;
use crate::error::SessionError;

const DEFAULT_ENGINE_PATH: &str = "./resource/engine/katago";
const DEFAULT_ENGINE_ARGS: &str = "gtp -config ./resource/engine/engine2024.cfg \
     -model ./resource/engine/b10c192nbt.bin.gz -override-config drawJudgeRule=WEIGHT";
const DEFAULT_TUNING_DIR: &str = "./resource/engine/KataGoData/opencltuning";
const DEFAULT_ANALYZE_INTERVAL_MS: u32 = 20;
const DEFAULT_MOVE_LIMIT: u32 = 300;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the engine binary
    pub engine_path: String,

    /// Arguments passed to the engine
    pub engine_args: Vec<String>,

    /// GPU tuning cache; empty on the very first launch
    pub tuning_dir: PathBuf,

    /// Interval in `kata-analyze interval <ms>`
    pub analyze_interval_ms: u32,

    /// Window after which streamed analysis starts a new frame
    pub analysis_refresh: Duration,

    /// Move limit applied at startup and on new game
    pub move_limit: u32,

    /// Whether analysis runs as soon as the session starts
    pub analyze_on_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_path: DEFAULT_ENGINE_PATH.to_string(),
            engine_args: split_args(DEFAULT_ENGINE_ARGS),
            tuning_dir: PathBuf::from(DEFAULT_TUNING_DIR),
            analyze_interval_ms: DEFAULT_ANALYZE_INTERVAL_MS,
            analysis_refresh: DEFAULT_REFRESH_INTERVAL,
            move_limit: DEFAULT_MOVE_LIMIT,
            analyze_on_start: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Result<Self, SessionError> {
        let defaults = Self::default();

        let engine_path = env::var("ENGINE_PATH").unwrap_or(defaults.engine_path);
        if engine_path.trim().is_empty() {
            return Err(SessionError::Config("ENGINE_PATH is empty".into()));
        }

        let engine_args = env::var("ENGINE_ARGS")
            .map(|v| split_args(&v))
            .unwrap_or(defaults.engine_args);

        let tuning_dir = env::var("ENGINE_TUNING_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.tuning_dir);

        let analyze_interval_ms = env::var("ANALYZE_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.analyze_interval_ms);

        let analysis_refresh = env::var("ANALYSIS_REFRESH_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.analysis_refresh);

        let move_limit = env::var("MOVE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.move_limit);

        let analyze_on_start = env::var("ANALYZE_ON_START")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.analyze_on_start);

        Ok(Self {
            engine_path,
            engine_args,
            tuning_dir,
            analyze_interval_ms,
            analysis_refresh,
            move_limit,
            analyze_on_start,
        })
    }

    pub fn analyze_command(&self) -> String {
        format!("kata-analyze interval {}", self.analyze_interval_ms)
    }

    /// True when the tuning cache holds no non-empty `.txt` file. The engine
    /// tunes itself on first launch, which takes several minutes.
    pub fn is_first_launch(&self) -> bool {
        !has_tuning_data(&self.tuning_dir)
    }
}

fn has_tuning_data(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        path.extension().is_some_and(|ext| ext == "txt")
            && entry.metadata().is_ok_and(|m| m.is_file() && m.len() > 0)
    })
}

fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(String::from).collect()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
