//! In-memory engine harness: the session talks to duplex pipes instead of
//! a child process, and the test plays the engine's side.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use analysis_client::{EngineConfig, EngineSession, SessionState};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(2);

pub const INITIAL_POSITION: &str = "l5t/1d3c1/r1j1w1e/7/7/7/E1W1J1R/1C3D1/T5L";

/// Number of lines the startup sequence sends with analysis on.
pub const STARTUP_LINES: usize = 16;

pub struct FakeEngine {
    pub session: EngineSession,
    /// What the client wrote to the engine's stdin
    pub received: Lines<BufReader<DuplexStream>>,
    /// The engine's stdout
    pub stdout: DuplexStream,
    pub stderr: DuplexStream,
}

pub fn config(analyze: bool) -> EngineConfig {
    EngineConfig {
        tuning_dir: PathBuf::from("./does-not-exist/opencltuning"),
        analyze_on_start: analyze,
        ..EngineConfig::default()
    }
}

pub async fn start(config: EngineConfig) -> FakeEngine {
    let (client_stdin, engine_stdin) = tokio::io::duplex(64 * 1024);
    let (stdout, client_stdout) = tokio::io::duplex(64 * 1024);
    let (stderr, client_stderr) = tokio::io::duplex(1024);

    let session = EngineSession::attach(&config, client_stdin, client_stdout, client_stderr).await;

    FakeEngine {
        session,
        received: BufReader::new(engine_stdin).lines(),
        stdout,
        stderr,
    }
}

/// Start a session with analysis on and swallow the startup commands.
pub async fn start_ready() -> FakeEngine {
    let mut engine = start(config(true)).await;
    engine.take(STARTUP_LINES).await;
    engine
}

impl FakeEngine {
    pub async fn next(&mut self) -> String {
        timeout(WAIT, self.received.next_line())
            .await
            .expect("timed out waiting for a command")
            .expect("engine stdin failed")
            .expect("engine stdin closed")
    }

    pub async fn take(&mut self, n: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(self.next().await);
        }
        lines
    }

    pub async fn reply(&mut self, line: &str) {
        self.stdout.write_all(line.as_bytes()).await.unwrap();
        self.stdout.write_all(b"\n").await.unwrap();
        self.stdout.flush().await.unwrap();
    }

    /// Poll the session until `check` holds.
    pub async fn wait_until<F>(&self, check: F)
    where
        F: Fn(&SessionState) -> bool,
    {
        timeout(WAIT, async {
            loop {
                if check(&*self.session.lock().await) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }
}
