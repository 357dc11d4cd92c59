//! Shared session state: the local game, analysis, rule settings and the
//! engine's stdin. Everything here is reached through one lock, so holding
//! `&mut SessionState` means the caller already owns it.

use std::time::Instant;

use jungle_core::coords::move_token;
use jungle_core::{Board, Color, Game, MoveRecord, Piece, Square};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisCandidate, AnalysisStore};
use crate::command_log::{CommandLog, Direction};
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::evaluator::{evaluate_move, MoveEvaluation};
use crate::rules::{Aggressiveness, RuleBits, RuleConfig};
use crate::situation::{assess, Assessment};

pub type EngineWriter = Box<dyn AsyncWrite + Send + Unpin>;

const FIRST_LAUNCH_WARNING: &str =
    "First engine launch: GPU tuning may take several minutes before analysis starts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Starting,
    Running,
    Failed,
    Terminated,
}

/// What a board click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    Selected,
    Deselected,
    Moved {
        captured: Option<Piece>,
        evaluation: Option<MoveEvaluation>,
    },
}

pub struct SessionState {
    pub(crate) game: Game,
    pub(crate) analysis: AnalysisStore,
    pub(crate) analyzing: bool,
    pub(crate) rules: RuleConfig,
    pub(crate) log: CommandLog,
    pub(crate) error_message: Option<String>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) last_evaluation: Option<MoveEvaluation>,
    analyze_command: String,
    default_move_limit: u32,
    /// `None` when the engine could not be started
    writer: Option<EngineWriter>,
}

impl SessionState {
    pub fn new(config: &EngineConfig, writer: EngineWriter) -> Self {
        Self::build(config, Some(writer))
    }

    /// State for a session whose engine failed to start. The board stays
    /// playable locally; commands are dropped.
    pub fn offline(config: &EngineConfig, error: &SessionError) -> Self {
        let mut state = Self::build(config, None);
        state.lifecycle = Lifecycle::Failed;
        state.error_message = Some(error.to_string());
        state
    }

    fn build(config: &EngineConfig, writer: Option<EngineWriter>) -> Self {
        Self {
            game: Game::new(),
            analysis: AnalysisStore::new(config.analysis_refresh),
            analyzing: config.analyze_on_start,
            rules: RuleConfig::new(config.move_limit),
            log: CommandLog::default(),
            error_message: None,
            lifecycle: Lifecycle::Starting,
            last_evaluation: None,
            analyze_command: config.analyze_command(),
            default_move_limit: config.move_limit,
            writer,
        }
    }

    /// Write each line of `commands` to the engine in order, flushing after
    /// every line. A failed write is recorded for the UI and stops the rest.
    pub async fn send(&mut self, commands: &str) -> Result<(), SessionError> {
        for line in commands.split('\n').map(str::trim) {
            if line.is_empty() {
                continue;
            }
            let Some(writer) = self.writer.as_mut() else {
                debug!(cmd = line, "No engine running, command dropped");
                continue;
            };
            debug!(cmd = line, "engine <");
            if let Err(e) = write_line(writer, line).await {
                warn!(cmd = line, error = %e, "Failed to send command to engine");
                self.error_message = Some(format!("Instruction sending failed: {e}"));
                return Err(SessionError::Send(e));
            }
            self.log.push(Direction::Sent, line);
        }
        Ok(())
    }

    pub(crate) async fn restart_analysis(&mut self) -> Result<(), SessionError> {
        if self.analyzing {
            let command = self.analyze_command.clone();
            self.send(&command).await?;
        }
        Ok(())
    }

    /// Replay the local position to the engine with `setfen`, which also
    /// resets its move counter. With `rejected_move`, the engine refused
    /// the last `play`: if a piece was being picked up the mover stays,
    /// otherwise the turn passes. This guess can be wrong.
    pub(crate) async fn resync(&mut self, rejected_move: bool) -> Result<(), SessionError> {
        let side = self.game.side_to_move();
        let next = if rejected_move && self.game.selected().is_none() {
            side.opponent()
        } else {
            side
        };

        self.rules.moves_played = 0;
        self.analysis.clear();
        self.game.deselect();
        self.game.set_side_to_move(next);

        let position = self.game.board().to_fen(false);
        self.send(&format!("setfen {position} {}", next.side_token()))
            .await
    }

    /// A non-analysis line from the engine.
    pub(crate) async fn handle_response(&mut self, line: &str) {
        if line.contains("illegal") {
            info!(line, "Engine rejected a move, resyncing board");
            let result = match self.resync(true).await {
                Ok(()) => self.restart_analysis().await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(error = %e, "Resync failed");
            }
        }
        self.log.push(Direction::Received, line);
    }

    pub(crate) fn ingest_analysis(&mut self, line: &str) -> usize {
        self.analysis.ingest(line, Instant::now())
    }

    /// Pick up the piece on `sq` and tell the engine which piece moves.
    pub async fn select(&mut self, sq: Square) -> Result<bool, SessionError> {
        if !self.game.select(sq) {
            return Ok(false);
        }
        let color = self.game.side_to_move().protocol_color();
        self.send(&format!("play {color} {}", move_token(sq))).await?;
        self.analysis.clear();
        self.restart_analysis().await?;
        Ok(true)
    }

    /// Drop the picked-up piece and take the pick-up back in the engine.
    pub async fn unselect(&mut self) -> Result<bool, SessionError> {
        if self.game.selected().is_none() {
            return Ok(false);
        }
        self.game.deselect();
        self.analysis.clear();
        self.send("undo").await?;
        self.restart_analysis().await?;
        Ok(true)
    }

    /// Put the picked-up piece on `to`. Clicking one of the mover's own
    /// pieces cancels the selection instead.
    pub async fn place(&mut self, to: Square) -> Result<ClickOutcome, SessionError> {
        let Some(from) = self.game.selected() else {
            return Ok(ClickOutcome::Ignored);
        };
        if !to.is_on_board() {
            return Ok(ClickOutcome::Ignored);
        }
        if self.game.owns(to) {
            self.unselect().await?;
            return Ok(ClickOutcome::Deselected);
        }

        let before: Vec<AnalysisCandidate> = self.analysis.snapshot();
        let color = self.game.side_to_move().protocol_color();
        let captured = self.game.apply_move(from, to);
        self.rules.moves_played += 1;
        self.analysis.clear();

        let evaluation = evaluate_move(&before, self.analyzing, to);
        if let Some(eval) = &evaluation {
            debug!(played = %eval.played, best = %eval.best, quality = ?eval.quality, "Move evaluated");
        }
        self.last_evaluation = evaluation.clone();

        self.send(&format!("play {color} {}", move_token(to))).await?;
        self.restart_analysis().await?;
        debug!(position = %self.game.board().to_fen(true), "Move applied");

        Ok(ClickOutcome::Moved {
            captured,
            evaluation,
        })
    }

    pub async fn click(&mut self, sq: Square) -> Result<ClickOutcome, SessionError> {
        if !sq.is_on_board() {
            return Ok(ClickOutcome::Ignored);
        }
        if self.game.selected().is_some() {
            return self.place(sq).await;
        }
        Ok(if self.select(sq).await? {
            ClickOutcome::Selected
        } else {
            ClickOutcome::Ignored
        })
    }

    /// Take back the last move locally and in the engine, which saw it as
    /// two `play` commands.
    pub async fn undo(&mut self) -> Result<Option<MoveRecord>, SessionError> {
        let Some(record) = self.game.undo_last() else {
            return Ok(None);
        };
        self.rules.moves_played = self.rules.moves_played.saturating_sub(1);
        self.last_evaluation = None;
        self.send("undo").await?;
        self.send("undo").await?;
        self.analysis.clear();
        self.restart_analysis().await?;
        Ok(Some(record))
    }

    pub async fn new_game(&mut self) -> Result<(), SessionError> {
        info!("Starting new game");
        self.game.reset();
        self.analysis.clear();
        self.last_evaluation = None;
        self.rules.moves_played = 0;
        self.send("clear_board").await?;
        self.set_move_limit(i64::from(self.default_move_limit)).await
    }

    /// Replace the position with `text`. A malformed position leaves the
    /// board untouched and is reported through `error_message` as well.
    pub async fn load_position(&mut self, text: &str) -> Result<(), SessionError> {
        let board = match Board::from_fen(text) {
            Ok(board) => board,
            Err(e) => {
                warn!(error = %e, "Rejected position");
                self.error_message = Some(format!("Invalid position: {e}"));
                return Err(e.into());
            }
        };
        self.game.replace_board(board);
        self.last_evaluation = None;
        self.resync(false).await?;
        self.restart_analysis().await
    }

    pub async fn swap_side(&mut self) -> Result<(), SessionError> {
        let side = self.game.side_to_move();
        self.game.set_side_to_move(side.opponent());
        self.resync(false).await?;
        self.restart_analysis().await
    }

    pub async fn set_analyzing(&mut self, on: bool) -> Result<(), SessionError> {
        self.analyzing = on;
        if on {
            self.restart_analysis().await
        } else {
            self.analysis.clear();
            self.send("stop").await
        }
    }

    /// Startup commands, sent once both readers are running.
    pub(crate) async fn initialize(&mut self, first_launch: bool) -> Result<(), SessionError> {
        if first_launch {
            warn!("{FIRST_LAUNCH_WARNING}");
            self.log.push(Direction::Warning, FIRST_LAUNCH_WARNING);
        }
        self.send("showboard").await?;
        self.restart_analysis().await?;
        self.set_move_limit(i64::from(self.default_move_limit)).await?;
        self.set_aggressiveness(Aggressiveness::Balanced).await?;
        self.set_rule_bits(RuleBits::default()).await?;
        self.set_draw_rule(Default::default()).await
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn board(&self) -> &Board {
        self.game.board()
    }

    pub fn side_to_move(&self) -> Color {
        self.game.side_to_move()
    }

    pub fn analysis(&self) -> &AnalysisStore {
        &self.analysis
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Hand the pending error to the UI, clearing it.
    pub fn take_error(&mut self) -> Option<String> {
        self.error_message.take()
    }

    pub fn last_evaluation(&self) -> Option<&MoveEvaluation> {
        self.last_evaluation.as_ref()
    }

    pub fn assessment(&self) -> Option<Assessment> {
        let best = self.analysis.iter().find(|c| c.order == 0)?;
        Some(assess(best, self.game.side_to_move()))
    }
}

async fn write_line(writer: &mut EngineWriter, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    fn session() -> (SessionState, DuplexStream) {
        let (writer, reader) = duplex(64 * 1024);
        let config = EngineConfig {
            analyze_on_start: false,
            ..EngineConfig::default()
        };
        (SessionState::new(&config, Box::new(writer)), reader)
    }

    async fn sent(state: SessionState, mut reader: DuplexStream) -> Vec<String> {
        drop(state);
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        out.lines().map(String::from).collect()
    }

    #[tokio::test]
    async fn test_send_splits_lines() {
        let (mut state, reader) = session();
        state.send("showboard\n\nstop").await.unwrap();
        assert_eq!(state.log().len(), 2);
        assert_eq!(sent(state, reader).await, vec!["showboard", "stop"]);
    }

    #[test]
    fn test_new_state_is_starting() {
        let (state, _reader) = session();
        assert_eq!(state.lifecycle(), Lifecycle::Starting);
    }

    #[tokio::test]
    async fn test_offline_state_plays_locally() {
        let error = SessionError::Spawn("./missing/katago: not found".into());
        let mut state = SessionState::offline(&EngineConfig::default(), &error);
        assert_eq!(state.lifecycle(), Lifecycle::Failed);

        assert_eq!(state.click(Square::new(6, 6)).await.unwrap(), ClickOutcome::Selected);
        let outcome = state.click(Square::new(5, 6)).await.unwrap();
        assert!(matches!(outcome, ClickOutcome::Moved { .. }));
        assert_eq!(state.side_to_move(), Color::Red);
        assert!(state.log().is_empty());
        assert_eq!(
            state.take_error().as_deref(),
            Some("Failed to load engine: ./missing/katago: not found")
        );
    }

    #[tokio::test]
    async fn test_send_failure_sets_error() {
        let (mut state, reader) = session();
        drop(reader);
        let result = state.send("showboard").await;
        assert!(matches!(result, Err(SessionError::Send(_))));
        assert!(state
            .error_message()
            .unwrap()
            .starts_with("Instruction sending failed"));
        assert!(state.log().is_empty());
    }

    #[tokio::test]
    async fn test_select_then_place() {
        let (mut state, reader) = session();
        // Blue elephant on A3 steps up to A4
        let from = Square::new(6, 0);
        let to = Square::new(5, 0);
        assert_eq!(state.click(from).await.unwrap(), ClickOutcome::Selected);
        let outcome = state.click(to).await.unwrap();
        assert!(matches!(outcome, ClickOutcome::Moved { captured: None, .. }));
        assert_eq!(state.side_to_move(), Color::Red);
        assert_eq!(state.rules().moves_played, 1);
        assert_eq!(state.game().last_move(), Some((from, to)));
        assert_eq!(sent(state, reader).await, vec!["play B A3", "play B A4"]);
    }

    #[tokio::test]
    async fn test_cannot_select_opponent_piece() {
        let (mut state, reader) = session();
        assert_eq!(state.click(Square::new(2, 0)).await.unwrap(), ClickOutcome::Ignored);
        assert!(state.game().selected().is_none());
        assert!(sent(state, reader).await.is_empty());
    }

    #[tokio::test]
    async fn test_clicking_own_piece_deselects() {
        let (mut state, reader) = session();
        state.click(Square::new(6, 0)).await.unwrap();
        let outcome = state.click(Square::new(6, 2)).await.unwrap();
        assert_eq!(outcome, ClickOutcome::Deselected);
        assert!(state.game().selected().is_none());
        assert_eq!(state.side_to_move(), Color::Blue);
        assert_eq!(sent(state, reader).await, vec!["play B A3", "undo"]);
    }

    #[tokio::test]
    async fn test_undo_sends_two_undos() {
        let (mut state, reader) = session();
        let initial = state.board().clone();
        state.click(Square::new(6, 0)).await.unwrap();
        state.click(Square::new(5, 0)).await.unwrap();
        let record = state.undo().await.unwrap();
        assert!(record.is_some());
        assert_eq!(state.board(), &initial);
        assert_eq!(state.rules().moves_played, 0);
        assert!(state.undo().await.unwrap().is_none());
        assert_eq!(
            sent(state, reader).await,
            vec!["play B A3", "play B A4", "undo", "undo"]
        );
    }

    #[tokio::test]
    async fn test_illegal_move_resyncs_to_opponent() {
        let (mut state, reader) = session();
        state.handle_response("? illegal move").await;
        assert_eq!(state.side_to_move(), Color::Red);
        assert_eq!(state.log().last().unwrap().direction, Direction::Received);
        let lines = sent(state, reader).await;
        assert_eq!(
            lines,
            vec!["setfen l5t/1d3c1/r1j1w1e/7/7/7/E1W1J1R/1C3D1/T5L b"]
        );
    }

    #[tokio::test]
    async fn test_illegal_pick_up_keeps_mover() {
        let (mut state, reader) = session();
        state.select(Square::new(6, 0)).await.unwrap();
        state.handle_response("? illegal move").await;
        assert_eq!(state.side_to_move(), Color::Blue);
        assert!(state.game().selected().is_none());
        let lines = sent(state, reader).await;
        assert!(lines[1].ends_with(" w"));
    }

    #[tokio::test]
    async fn test_load_position_rejects_garbage() {
        let (mut state, reader) = session();
        let before = state.board().clone();
        let result = state.load_position("l5t/1d3c1 w").await;
        assert!(matches!(result, Err(SessionError::Position(_))));
        assert_eq!(state.board(), &before);
        assert!(state.take_error().is_some());
        assert!(state.error_message().is_none());
        assert!(sent(state, reader).await.is_empty());
    }

    #[tokio::test]
    async fn test_set_move_limit_deducts_played_moves() {
        let (mut state, reader) = session();
        state.rules.moves_played = 10;
        state.set_move_limit(300).await.unwrap();
        assert_eq!(state.rules().move_limit, 290);
        assert_eq!(state.rules().moves_played, 0);
        let lines = sent(state, reader).await;
        assert!(lines[0].starts_with("setfen "));
        assert_eq!(&lines[1..], &["mm 290", "mc 0"]);
    }

    #[tokio::test]
    async fn test_set_analyzing_toggles_commands() {
        let (mut state, reader) = session();
        state.set_analyzing(true).await.unwrap();
        state.set_analyzing(false).await.unwrap();
        assert!(!state.is_analyzing());
        assert_eq!(
            sent(state, reader).await,
            vec!["kata-analyze interval 20", "stop"]
        );
    }
}
