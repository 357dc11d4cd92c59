//! Console front end for the Jungle analysis client.
//!
//! Reads one command per line from stdin and prints the board, analysis
//! and evaluations. Type `help` for the command list.

use analysis_client::rules::RuleBits;
use analysis_client::{
    Aggressiveness, ClickOutcome, EngineConfig, EngineSession, Lifecycle, SessionError,
};
use jungle_core::coords::parse_move_token;
use jungle_core::Board;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  click <SQ>        select a piece or move the selected piece (e.g. click A3)
  move <FROM> <TO>  select and place in one step
  undo              take back the last move
  new               start a new game
  fen               print the current position
  load <POSITION>   load a position, e.g. load l5t/1d3c1/r1j1w1e/7/7/7/E1W1J1R/1C3D1/T5L w
  swap              pass the turn to the other side
  analyze on|off    start or stop analysis
  limit <N>         set the move limit
  more | less       raise or lower the move limit by 10
  rat | lion        toggle the rat capture or lion jump rule
  draw              cycle the draw rule
  aggr balanced|blue|red
  show              print analysis as JSON
  eval              print the last move evaluation and the situation
  log               print the protocol log
  quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::from_env()?;
    let mut session = EngineSession::start(&config).await;
    {
        let mut state = session.lock().await;
        if let Some(message) = state.take_error() {
            println!("error: {message}");
        }
        if state.lifecycle() == Lifecycle::Failed {
            println!("no engine: the board is playable but there is no analysis");
        } else {
            info!("Engine session ready");
        }
    }
    print_board(&session).await;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                match run_command(&session, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => warn!(error = %e, "Command failed"),
                }
                if let Some(message) = session.lock().await.take_error() {
                    println!("error: {message}");
                }
            }
        }
    }

    session.stop().await;
    Ok(())
}

/// Run one console command. Returns `false` to quit.
async fn run_command(session: &EngineSession, line: &str) -> Result<bool, SessionError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };

    match command {
        "click" => {
            let Some(sq) = words.next().and_then(parse_move_token) else {
                println!("usage: click <SQ>");
                return Ok(true);
            };
            let outcome = session.click(sq).await?;
            report_click(&outcome);
            print_board(session).await;
        }
        "move" => {
            let squares: Option<Vec<_>> = words.by_ref().take(2).map(parse_move_token).collect();
            let Some([from, to]) = squares.and_then(|s| <[_; 2]>::try_from(s).ok()) else {
                println!("usage: move <FROM> <TO>");
                return Ok(true);
            };
            if session.click(from).await? != ClickOutcome::Selected {
                println!("cannot pick up that piece");
                return Ok(true);
            }
            let outcome = session.click(to).await?;
            report_click(&outcome);
            print_board(session).await;
        }
        "undo" => {
            if session.undo().await?.is_none() {
                println!("nothing to undo");
            }
            print_board(session).await;
        }
        "new" => {
            session.new_game().await?;
            print_board(session).await;
        }
        "fen" => println!("{}", session.lock().await.board().to_fen(true)),
        "load" => {
            let text = words.collect::<Vec<_>>().join(" ");
            session.load_position(&text).await?;
            print_board(session).await;
        }
        "swap" => {
            session.swap_side().await?;
            print_board(session).await;
        }
        "analyze" => match words.next() {
            Some("on") => session.set_analyzing(true).await?,
            Some("off") => session.set_analyzing(false).await?,
            _ => println!("usage: analyze on|off"),
        },
        "limit" => match words.next().and_then(|w| w.parse().ok()) {
            Some(target) => session.set_move_limit(target).await?,
            None => println!("usage: limit <N>"),
        },
        "more" => session.adjust_move_limit(true).await?,
        "less" => session.adjust_move_limit(false).await?,
        "rat" => session.toggle_rule_bit(RuleBits::RAT_CROSS_CAPTURE).await?,
        "lion" => session.toggle_rule_bit(RuleBits::LION_JUMP_OWN_RAT).await?,
        "draw" => {
            let next = session.lock().await.rules().draw_rule.next();
            session.set_draw_rule(next).await?;
            println!("draw rule: {}", next.protocol_name());
        }
        "aggr" => {
            let mode = match words.next() {
                Some("balanced") => Aggressiveness::Balanced,
                Some("blue") => Aggressiveness::BlueAggressive,
                Some("red") => Aggressiveness::RedAggressive,
                _ => {
                    println!("usage: aggr balanced|blue|red");
                    return Ok(true);
                }
            };
            session.set_aggressiveness(mode).await?;
        }
        "show" => {
            let snapshot = session.lock().await.analysis().snapshot();
            match serde_json::to_string_pretty(&snapshot) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!(error = %e, "Failed to serialize analysis"),
            }
        }
        "eval" => {
            let guard = session.lock().await;
            match guard.last_evaluation() {
                Some(eval) => println!(
                    "{}: played {} (best {}), drop {:.1}",
                    eval.phrase(),
                    eval.played,
                    eval.best,
                    eval.winrate_drop
                ),
                None => println!("no evaluation for the last move"),
            }
            if let Some(assessment) = guard.assessment() {
                println!("{} ({})", assessment.describe(), assessment.score);
            }
            let rules = guard.rules();
            println!(
                "moves left: {}, draw rule: {}, rules: {}",
                rules.moves_left(),
                rules.draw_rule.protocol_name(),
                rules.rule_bits.0
            );
        }
        "log" => {
            for entry in session.lock().await.log().iter() {
                println!("{:?}: {}", entry.direction, entry.line);
            }
        }
        "help" => println!("{HELP}"),
        "quit" | "exit" => return Ok(false),
        other => println!("unknown command: {other} (try help)"),
    }
    Ok(true)
}

fn report_click(outcome: &ClickOutcome) {
    match outcome {
        ClickOutcome::Ignored => println!("ignored"),
        ClickOutcome::Selected => println!("selected"),
        ClickOutcome::Deselected => println!("deselected"),
        ClickOutcome::Moved {
            captured,
            evaluation,
        } => {
            if let Some(piece) = captured {
                println!("captured {}", piece.to_char());
            }
            if let Some(eval) = evaluation {
                println!("{}", eval.phrase());
            }
        }
    }
}

async fn print_board(session: &EngineSession) {
    let guard = session.lock().await;
    println!("{}", render(guard.board()));
    println!("{:?} to move", guard.side_to_move());
}

fn render(board: &Board) -> String {
    let mut out = String::new();
    for (i, row) in board.rows().enumerate() {
        out.push_str(&format!("{} ", jungle_core::ROWS - i));
        for cell in row {
            out.push(cell.map_or('.', |p| p.to_char()));
            out.push(' ');
        }
        out.push('\n');
    }
    out.push_str("  A B C D E F G");
    out
}
