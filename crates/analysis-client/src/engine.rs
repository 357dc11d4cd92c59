//! Engine process wrapper speaking the GTP-style protocol (async I/O)

use std::process::Stdio;
use std::sync::Arc;

use jungle_core::{MoveRecord, Square};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::reader::{drain_stderr, read_stdout};
use crate::rules::{Aggressiveness, DrawRule, RuleBits};
use crate::state::{ClickOutcome, Lifecycle, SessionState};

/// A running engine plus the session state its output feeds into.
pub struct EngineSession {
    state: Arc<Mutex<SessionState>>,
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
}

impl EngineSession {
    /// Spawn the engine and run the startup sequence. If the engine cannot
    /// be started the session comes up in [`Lifecycle::Failed`] with the
    /// error pending for the UI, and the board stays playable locally.
    pub async fn start(config: &EngineConfig) -> Self {
        info!(path = %config.engine_path, args = ?config.engine_args, "Starting engine");

        match spawn(config) {
            Ok((child, stdin, stdout, stderr)) => {
                let mut session = Self::attach(config, stdin, stdout, stderr).await;
                session.child = Some(child);
                session
            }
            Err(e) => {
                error!(error = %e, "Engine unavailable, continuing without analysis");
                Self {
                    state: Arc::new(Mutex::new(SessionState::offline(config, &e))),
                    child: None,
                    readers: Vec::new(),
                }
            }
        }
    }

    /// Drive a session over arbitrary streams. Both readers are running
    /// before the first command goes out so no early output is lost.
    pub async fn attach<W, R, E>(config: &EngineConfig, stdin: W, stdout: R, stderr: E) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
        E: AsyncRead + Send + Unpin + 'static,
    {
        let state = Arc::new(Mutex::new(SessionState::new(config, Box::new(stdin))));

        let readers = vec![
            tokio::spawn(read_stdout(state.clone(), stdout)),
            tokio::spawn(drain_stderr(stderr)),
        ];

        {
            let mut guard = state.lock().await;
            if let Err(e) = guard.initialize(config.is_first_launch()).await {
                warn!(error = %e, "Engine startup sequence incomplete");
            }
            // The stdout reader may already have seen the engine exit
            if guard.lifecycle == Lifecycle::Starting {
                guard.lifecycle = Lifecycle::Running;
            }
        }

        Self {
            state,
            child: None,
            readers,
        }
    }

    /// The one lock guarding all session state.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    pub async fn send(&self, commands: &str) -> Result<(), SessionError> {
        self.lock().await.send(commands).await
    }

    pub async fn click(&self, sq: Square) -> Result<ClickOutcome, SessionError> {
        self.lock().await.click(sq).await
    }

    pub async fn undo(&self) -> Result<Option<MoveRecord>, SessionError> {
        self.lock().await.undo().await
    }

    pub async fn new_game(&self) -> Result<(), SessionError> {
        self.lock().await.new_game().await
    }

    pub async fn load_position(&self, text: &str) -> Result<(), SessionError> {
        self.lock().await.load_position(text).await
    }

    pub async fn swap_side(&self) -> Result<(), SessionError> {
        self.lock().await.swap_side().await
    }

    pub async fn set_analyzing(&self, on: bool) -> Result<(), SessionError> {
        self.lock().await.set_analyzing(on).await
    }

    pub async fn set_rule_bits(&self, bits: RuleBits) -> Result<(), SessionError> {
        self.lock().await.set_rule_bits(bits).await
    }

    pub async fn toggle_rule_bit(&self, bit: u8) -> Result<(), SessionError> {
        self.lock().await.toggle_rule_bit(bit).await
    }

    pub async fn set_draw_rule(&self, rule: DrawRule) -> Result<(), SessionError> {
        self.lock().await.set_draw_rule(rule).await
    }

    pub async fn set_aggressiveness(&self, mode: Aggressiveness) -> Result<(), SessionError> {
        self.lock().await.set_aggressiveness(mode).await
    }

    pub async fn set_move_limit(&self, target: i64) -> Result<(), SessionError> {
        self.lock().await.set_move_limit(target).await
    }

    pub async fn adjust_move_limit(&self, increase: bool) -> Result<(), SessionError> {
        self.lock().await.adjust_move_limit(increase).await
    }

    /// Kill the engine. Shutdown is abrupt; nothing is sent first.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill engine");
            }
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        self.lock().await.lifecycle = Lifecycle::Terminated;
        info!("Engine stopped");
    }
}

fn spawn(
    config: &EngineConfig,
) -> Result<(Child, ChildStdin, ChildStdout, ChildStderr), SessionError> {
    let mut child = Command::new(&config.engine_path)
        .args(&config.engine_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SessionError::Spawn(format!("{}: {e}", config.engine_path)))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| SessionError::Spawn("engine stdin not captured".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SessionError::Spawn("engine stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| SessionError::Spawn("engine stderr not captured".into()))?;

    Ok((child, stdin, stdout, stderr))
}
