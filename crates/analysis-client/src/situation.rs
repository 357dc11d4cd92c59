//! Overall position assessment from the engine's top candidate.

use jungle_core::Color;
use serde::Serialize;

use crate::analysis::AnalysisCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advantage {
    Even,
    Slight,
    Large,
    Winning,
    Decisive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// `None` when the position is even
    pub leader: Option<Color>,
    pub advantage: Advantage,
    pub blue_winrate: f64,
    /// Blue-positive score, or `+M`/`-M` for a forced result
    pub score: String,
}

impl Assessment {
    pub fn describe(&self) -> String {
        let side = match self.leader {
            Some(Color::Blue) => "Blue",
            Some(Color::Red) => "Red",
            None => return "Even position".to_string(),
        };
        match self.advantage {
            Advantage::Even => "Even position".to_string(),
            Advantage::Slight => format!("{side} is slightly better"),
            Advantage::Large => format!("{side} is much better"),
            Advantage::Winning => format!("{side} is winning"),
            Advantage::Decisive => format!("{side} has a forced win"),
        }
    }
}

/// Assess the position. The candidate's win rate is from the view of
/// `side_to_move`.
pub fn assess(best: &AnalysisCandidate, side_to_move: Color) -> Assessment {
    let blue_winrate = match side_to_move {
        Color::Blue => best.winrate,
        Color::Red => 100.0 - best.winrate,
    };
    let red_winrate = 100.0 - blue_winrate;

    let (leader, lead) = if blue_winrate > 57.0 {
        (Some(Color::Blue), blue_winrate)
    } else if red_winrate > 57.0 {
        (Some(Color::Red), red_winrate)
    } else {
        (None, 50.0)
    };

    let advantage = match lead {
        w if w <= 57.0 => Advantage::Even,
        w if w <= 70.0 => Advantage::Slight,
        w if w <= 90.0 => Advantage::Large,
        w if w < 99.0 => Advantage::Winning,
        _ => Advantage::Decisive,
    };

    Assessment {
        leader,
        advantage,
        blue_winrate,
        score: score_text(blue_winrate),
    }
}

/// `5 * log10(odds)` of Blue's win probability.
fn score_text(blue_winrate: f64) -> String {
    if blue_winrate >= 99.0 {
        return "+M".to_string();
    }
    if blue_winrate <= 1.0 {
        return "-M".to_string();
    }
    let b = (blue_winrate / 100.0).clamp(0.0001, 0.9999);
    let score = 5.0 * (b / (1.0 - b)).log10();
    if score > 0.0 {
        format!("+{score:.1}")
    } else if score < 0.0 {
        format!("{score:.1}")
    } else {
        "0.0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jungle_core::Square;

    fn top(winrate: f64) -> AnalysisCandidate {
        AnalysisCandidate {
            move_text: "D5".to_string(),
            coordinate: Square::new(4, 3),
            visits: 100,
            winrate,
            score_mean: 0.0,
            lcb: 0.0,
            order: 0,
            pv: vec![],
        }
    }

    #[test]
    fn test_even_position() {
        let a = assess(&top(50.0), Color::Blue);
        assert_eq!(a.advantage, Advantage::Even);
        assert_eq!(a.leader, None);
        assert_eq!(a.score, "0.0");
    }

    #[test]
    fn test_winrate_is_from_mover_view() {
        let a = assess(&top(80.0), Color::Red);
        assert_eq!(a.leader, Some(Color::Red));
        assert_eq!(a.advantage, Advantage::Large);
        assert!((a.blue_winrate - 20.0).abs() < 1e-9);
        assert!(a.score.starts_with('-'));
    }

    #[test]
    fn test_forced_results() {
        assert_eq!(assess(&top(99.5), Color::Blue).score, "+M");
        assert_eq!(assess(&top(99.5), Color::Blue).advantage, Advantage::Decisive);
        assert_eq!(assess(&top(99.5), Color::Red).score, "-M");
    }

    #[test]
    fn test_score_scale() {
        // odds of 10:1 is five points
        let a = assess(&top(100.0 * 10.0 / 11.0), Color::Blue);
        assert_eq!(a.score, "+5.0");
        assert_eq!(a.advantage, Advantage::Winning);
    }
}
