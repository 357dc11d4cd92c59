//! Rule and mode controller. Every setter resyncs the board first because
//! the engine forgets its ply counter when these parameters change.

use serde::Serialize;
use tracing::info;

use crate::error::SessionError;
use crate::state::SessionState;

const MAX_MOVE_LIMIT: i64 = 999;
/// Out-of-range limits fall back to this rather than to the upper bound.
const OVERFLOW_MOVE_LIMIT: i64 = 9;
pub const MOVE_LIMIT_STEP: u32 = 10;

/// Komi and playout doubling advantage used by the aggressive modes
const AGGRESSIVE_KOMI: f64 = 9.0;
const AGGRESSIVE_PDA: f64 = 1.5;

/// Scoring rule bit field sent as `kata-set-rule scoring <bits>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleBits(pub u8);

impl RuleBits {
    /// Rats may capture when crossing between water and land
    pub const RAT_CROSS_CAPTURE: u8 = 0b01;
    /// Lions and tigers may jump over their own rat
    pub const LION_JUMP_OWN_RAT: u8 = 0b10;

    pub fn rat_cross_capture(self) -> bool {
        self.0 & Self::RAT_CROSS_CAPTURE != 0
    }

    pub fn lion_jump_own_rat(self) -> bool {
        self.0 & Self::LION_JUMP_OWN_RAT != 0
    }

    pub fn toggled(self, bit: u8) -> Self {
        Self((self.0 ^ bit) & 0b11)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawRule {
    Generic,
    PieceCount,
    #[default]
    PieceWeight,
}

impl DrawRule {
    pub fn protocol_name(self) -> &'static str {
        match self {
            DrawRule::Generic => "DRAW",
            DrawRule::PieceCount => "COUNT",
            DrawRule::PieceWeight => "WEIGHT",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DrawRule::Generic => DrawRule::PieceCount,
            DrawRule::PieceCount => DrawRule::PieceWeight,
            DrawRule::PieceWeight => DrawRule::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    #[default]
    Balanced,
    BlueAggressive,
    RedAggressive,
}

impl Aggressiveness {
    /// (komi, playoutDoublingAdvantage)
    pub fn parameters(self) -> (f64, f64) {
        match self {
            Aggressiveness::Balanced => (0.0, 0.0),
            Aggressiveness::BlueAggressive => (AGGRESSIVE_KOMI, -AGGRESSIVE_PDA),
            Aggressiveness::RedAggressive => (-AGGRESSIVE_KOMI, AGGRESSIVE_PDA),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleConfig {
    pub rule_bits: RuleBits,
    pub draw_rule: DrawRule,
    pub aggressiveness: Aggressiveness,
    /// Remaining moves last sent with `mm`
    pub move_limit: u32,
    /// Moves played since the engine last received the full position
    pub moves_played: u32,
}

impl RuleConfig {
    pub fn new(move_limit: u32) -> Self {
        Self {
            rule_bits: RuleBits::default(),
            draw_rule: DrawRule::default(),
            aggressiveness: Aggressiveness::default(),
            move_limit,
            moves_played: 0,
        }
    }

    pub fn moves_left(&self) -> i64 {
        i64::from(self.move_limit) - i64::from(self.moves_played)
    }
}

/// Moves still allowed once `moves_played` are deducted from `target`.
pub fn remaining_moves(target: i64, moves_played: u32) -> u32 {
    let mut remaining = target.saturating_sub(i64::from(moves_played));
    if remaining > MAX_MOVE_LIMIT {
        remaining = OVERFLOW_MOVE_LIMIT;
    }
    // Clamped to 1..=999 above and here
    remaining.max(1) as u32
}

impl SessionState {
    pub async fn set_rule_bits(&mut self, bits: RuleBits) -> Result<(), SessionError> {
        self.resync(false).await?;
        self.rules.rule_bits = bits;
        self.send(&format!("kata-set-rule scoring {}", bits.0)).await?;
        self.restart_analysis().await
    }

    pub async fn toggle_rule_bit(&mut self, bit: u8) -> Result<(), SessionError> {
        let bits = self.rules.rule_bits.toggled(bit);
        self.set_rule_bits(bits).await
    }

    pub async fn set_draw_rule(&mut self, rule: DrawRule) -> Result<(), SessionError> {
        self.resync(false).await?;
        self.rules.draw_rule = rule;
        self.send(&format!("kata-set-rule drawjudge {}", rule.protocol_name()))
            .await?;
        self.restart_analysis().await
    }

    pub async fn set_aggressiveness(&mut self, mode: Aggressiveness) -> Result<(), SessionError> {
        self.resync(false).await?;
        self.rules.aggressiveness = mode;
        let (komi, pda) = mode.parameters();
        self.send(&format!("komi {komi:.1}")).await?;
        self.send(&format!("kata-set-param playoutDoublingAdvantage {pda:.1}"))
            .await?;
        self.restart_analysis().await
    }

    /// Limit the game to `target` moves counted from now. The moves already
    /// played are deducted before the resync resets the engine's counter.
    pub async fn set_move_limit(&mut self, target: i64) -> Result<(), SessionError> {
        let remaining = remaining_moves(target, self.rules.moves_played);
        info!(target, remaining, "Setting move limit");
        self.resync(false).await?;
        self.rules.move_limit = remaining;
        self.send(&format!("mm {remaining}")).await?;
        self.send("mc 0").await?;
        self.restart_analysis().await
    }

    /// Step the stored limit up or down by [`MOVE_LIMIT_STEP`]; never below
    /// one step.
    pub async fn adjust_move_limit(&mut self, increase: bool) -> Result<(), SessionError> {
        let current = i64::from(self.rules.move_limit);
        let step = i64::from(MOVE_LIMIT_STEP);
        let target = if increase {
            current + step
        } else {
            (current - step).max(step)
        };
        self.set_move_limit(target).await
    }
}
