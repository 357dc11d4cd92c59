//! Move quality classification: pure functions over an analysis snapshot
//! taken before the move was played. Advisory only.

use jungle_core::Square;
use serde::Serialize;

use crate::analysis::AnalysisCandidate;

/// Win-rate gap (percentage points) between the top two moves above which
/// finding the top move is game-deciding.
const THRESHOLD_NICE: f64 = 15.0;
const THRESHOLD_BRILLIANT: f64 = 10.0;

/// Win-rate drop thresholds versus the engine's top choice
const THRESHOLD_BEST: f64 = 3.0;
const THRESHOLD_OK: f64 = 8.0;
const THRESHOLD_MISTAKE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Nice,
    Brilliant,
    Best,
    Ok,
    Mistake,
    Blunder,
}

impl MoveQuality {
    pub fn phrase(self) -> &'static str {
        match self {
            MoveQuality::Nice => "Nice! The only move that holds the game",
            MoveQuality::Brilliant => "Brilliant, the engine's clear first choice",
            MoveQuality::Best => "Best move",
            MoveQuality::Ok => "Playable",
            MoveQuality::Mistake => "Mistake",
            MoveQuality::Blunder => "Blunder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEvaluation {
    pub quality: MoveQuality,
    pub played: String,
    pub best: String,
    /// Best win rate minus the played move's win rate
    pub winrate_drop: f64,
    /// Best win rate minus the runner-up's; 0 with a single candidate
    pub criticality: f64,
}

impl MoveEvaluation {
    pub fn phrase(&self) -> &'static str {
        self.quality.phrase()
    }
}

pub fn classify_criticality(criticality: f64) -> Option<MoveQuality> {
    if criticality > THRESHOLD_NICE {
        Some(MoveQuality::Nice)
    } else if criticality > THRESHOLD_BRILLIANT {
        Some(MoveQuality::Brilliant)
    } else {
        None
    }
}

pub fn classify_drop(drop: f64) -> MoveQuality {
    if drop <= THRESHOLD_BEST {
        MoveQuality::Best
    } else if drop < THRESHOLD_OK {
        MoveQuality::Ok
    } else if drop < THRESHOLD_MISTAKE {
        MoveQuality::Mistake
    } else {
        MoveQuality::Blunder
    }
}

/// Classify the move that landed on `played` against the candidates the
/// engine reported before it. `candidates` is in ranked order.
pub fn evaluate_move(
    candidates: &[AnalysisCandidate],
    analyzing: bool,
    played: Square,
) -> Option<MoveEvaluation> {
    if !analyzing || candidates.is_empty() {
        return None;
    }

    let best = candidates
        .iter()
        .find(|c| c.order == 0)
        .or_else(|| candidates.iter().max_by_key(|c| c.visits))?;
    let chosen = candidates.iter().find(|c| c.coordinate == played)?;

    let runner_up = candidates
        .iter()
        .filter(|c| c.move_text != best.move_text)
        .min_by_key(|c| c.order);
    let criticality = runner_up.map_or(0.0, |r| best.winrate - r.winrate);
    let drop = best.winrate - chosen.winrate;

    let quality = if chosen.move_text == best.move_text {
        classify_criticality(criticality).unwrap_or_else(|| classify_drop(drop))
    } else {
        classify_drop(drop)
    };

    Some(MoveEvaluation {
        quality,
        played: chosen.move_text.clone(),
        best: best.move_text.clone(),
        winrate_drop: drop,
        criticality,
    })
}
