//! Analysis store: candidate moves parsed from streamed `kata-analyze`
//! output, coalesced into time-boxed frames.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jungle_core::coords::parse_move_token;
use jungle_core::Square;
use serde::Serialize;

/// Default window after which the next info line starts a fresh frame.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Keys the engine may append after a principal variation.
const PV_TERMINATORS: &[&str] = &[
    "pvVisits",
    "pvEdgeVisits",
    "ownership",
    "ownershipStdev",
    "movesOwnership",
    "movesOwnershipStdev",
];

/// One engine-proposed move and its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisCandidate {
    #[serde(rename = "move")]
    pub move_text: String,
    pub coordinate: Square,
    pub visits: u64,
    /// Win rate for the side to move, in percent
    pub winrate: f64,
    /// `scoreMean`, used as a draw proxy
    pub score_mean: f64,
    pub lcb: f64,
    /// 0 is the engine's top choice
    pub order: u32,
    pub pv: Vec<String>,
}

/// Parse every candidate record in one line. A single tick of
/// `kata-analyze` reports many moves, each starting with `info`.
pub fn parse_info_line(line: &str) -> Vec<AnalysisCandidate> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .split(|t| *t == "info")
        .filter_map(parse_record)
        .collect()
}

/// Parse `move <m> ... visits <n> ... winrate <f> ... scoreMean <f> ...
/// lcb <f> ... order <n> ... pv <moves>`. Keys must appear in that order.
fn parse_record(tokens: &[&str]) -> Option<AnalysisCandidate> {
    let mut cursor = Cursor { tokens, pos: 0 };

    let move_text = cursor.value_after("move")?;
    let visits = cursor.value_after("visits")?.parse().ok()?;
    let winrate: f64 = cursor.value_after("winrate")?.parse().ok()?;
    let score_mean = cursor.value_after("scoreMean")?.parse().ok()?;
    let lcb = cursor.value_after("lcb")?.parse().ok()?;
    let order = cursor.value_after("order")?.parse().ok()?;
    let pv: Vec<String> = cursor
        .rest_after("pv")?
        .iter()
        .take_while(|t| !PV_TERMINATORS.contains(*t))
        .map(|t| t.to_string())
        .collect();
    if pv.is_empty() {
        return None;
    }

    let coordinate = parse_move_token(move_text)?;

    Some(AnalysisCandidate {
        move_text: move_text.to_string(),
        coordinate,
        visits,
        winrate: winrate * 100.0,
        score_mean,
        lcb,
        order,
        pv,
    })
}

struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Token following the next occurrence of `key`.
    fn value_after(&mut self, key: &str) -> Option<&'a str> {
        let idx = self.pos + self.tokens[self.pos..].iter().position(|t| *t == key)?;
        let value = *self.tokens.get(idx + 1)?;
        self.pos = idx + 2;
        Some(value)
    }

    fn rest_after(&mut self, key: &str) -> Option<&'a [&'a str]> {
        let idx = self.pos + self.tokens[self.pos..].iter().position(|t| *t == key)?;
        self.pos = self.tokens.len();
        Some(&self.tokens[idx + 1..])
    }
}

/// Candidates keyed by move token, plus a ranked view rebuilt after each
/// ingested line: visits descending, then win rate descending.
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    entries: HashMap<String, AnalysisCandidate>,
    ranked: Vec<String>,
    refresh_interval: Duration,
    last_clear: Option<Instant>,
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl AnalysisStore {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ranked: Vec::new(),
            refresh_interval,
            last_clear: None,
        }
    }

    /// Ingest one info line received at `now`. If the refresh window has
    /// elapsed since the last frame started, the store is cleared first.
    /// Returns the number of candidates parsed from the line.
    pub fn ingest(&mut self, line: &str, now: Instant) -> usize {
        if !(line.contains("visits") && line.contains("winrate")) {
            return 0;
        }

        let frame_expired = self
            .last_clear
            .map_or(true, |t| now.saturating_duration_since(t) >= self.refresh_interval);
        if frame_expired {
            self.entries.clear();
            self.ranked.clear();
            self.last_clear = Some(now);
        }

        let candidates = parse_info_line(line);
        let count = candidates.len();
        for candidate in candidates {
            match self.entries.get_mut(&candidate.move_text) {
                Some(existing) => *existing = candidate,
                None => {
                    self.entries.insert(candidate.move_text.clone(), candidate);
                }
            }
        }
        self.rerank();
        count
    }

    fn rerank(&mut self) {
        let mut keys: Vec<&AnalysisCandidate> = self.entries.values().collect();
        keys.sort_by(|a, b| {
            b.visits
                .cmp(&a.visits)
                .then_with(|| b.winrate.total_cmp(&a.winrate))
                .then_with(|| a.move_text.cmp(&b.move_text))
        });
        self.ranked = keys.into_iter().map(|c| c.move_text.clone()).collect();
    }

    /// Drop all candidates, e.g. after the position changed. The frame
    /// timer is left alone.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.ranked.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, move_text: &str) -> Option<&AnalysisCandidate> {
        self.entries.get(move_text)
    }

    /// Candidates in ranked order.
    pub fn iter(&self) -> impl Iterator<Item = &AnalysisCandidate> {
        self.ranked.iter().filter_map(|m| self.entries.get(m))
    }

    pub fn snapshot(&self) -> Vec<AnalysisCandidate> {
        self.iter().cloned().collect()
    }

    /// The engine's top choice, falling back to the most visited move.
    pub fn best(&self) -> Option<&AnalysisCandidate> {
        self.iter()
            .find(|c| c.order == 0)
            .or_else(|| self.iter().next())
    }
}
