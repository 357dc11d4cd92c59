//! The two loops that consume engine output. Stdout feeds the session;
//! stderr is only drained so the child never blocks on a full pipe.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};

use crate::state::{Lifecycle, SessionState};

const ANALYSIS_MARKER: &str = "info";

pub(crate) async fn read_stdout<R>(state: Arc<Mutex<SessionState>>, stdout: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                info!("Engine closed its output");
                let mut guard = state.lock().await;
                if guard.lifecycle != Lifecycle::Failed {
                    guard.lifecycle = Lifecycle::Terminated;
                }
                break;
            }
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim();
                if line.is_empty() {
                    continue;
                }
                debug!(line, "engine >");

                let mut guard = state.lock().await;
                if line.starts_with(ANALYSIS_MARKER) {
                    guard.ingest_analysis(line);
                } else {
                    guard.handle_response(line).await;
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to read engine output");
                let mut guard = state.lock().await;
                guard.lifecycle = Lifecycle::Failed;
                guard.error_message = Some(format!("Engine output failed: {e}"));
                break;
            }
        }
    }
}

pub(crate) async fn drain_stderr<R>(stderr: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();

    // Raw bytes: GPU drivers may print text that is not UTF-8.
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                trace!(line = text.trim_end(), "engine stderr");
            }
            Err(e) => {
                debug!(error = %e, "Engine stderr failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn test_routes_lines_and_terminates_on_eof() {
        let (engine_stdin, _keep) = duplex(4096);
        let config = EngineConfig {
            analyze_on_start: false,
            ..EngineConfig::default()
        };
        let state = Arc::new(Mutex::new(SessionState::new(&config, Box::new(engine_stdin))));

        let (mut engine_out, client_in) = duplex(4096);
        engine_out
            .write_all(
                b"= \n\ninfo move D5 visits 12 winrate 0.6 scoreMean 0.1 lcb 0.5 order 0 pv D5 D4\n",
            )
            .await
            .unwrap();
        drop(engine_out);

        read_stdout(state.clone(), client_in).await;

        let guard = state.lock().await;
        assert_eq!(guard.lifecycle(), Lifecycle::Terminated);
        assert_eq!(guard.log().len(), 1);
        assert_eq!(guard.log().last().unwrap().line, "=");
        assert_eq!(guard.analysis().len(), 1);
    }

    #[tokio::test]
    async fn test_stderr_is_drained() {
        let (mut engine_err, client_err) = duplex(16);
        let drain = tokio::spawn(drain_stderr(client_err));
        for _ in 0..50 {
            engine_err.write_all(b"tuning...\n").await.unwrap();
        }
        drop(engine_err);
        drain.await.unwrap();
    }

    #[tokio::test]
    async fn test_stderr_survives_invalid_utf8() {
        let (mut engine_err, client_err) = duplex(64);
        let drain = tokio::spawn(drain_stderr(client_err));
        engine_err.write_all(b"GPU: \xff\xfe device\n").await.unwrap();
        for i in 0..200 {
            engine_err
                .write_all(format!("tuning step {i}\n").as_bytes())
                .await
                .unwrap();
        }
        drop(engine_err);
        drain.await.unwrap();
    }
}
