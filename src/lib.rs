use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod debounce;
pub mod persistence;
pub mod submission;

/// Default values shared by the editor and the request builder
pub mod defaults {
    pub const COOLDOWN_SECS: f64 = 120.0;
    pub const SOLVE_URL: &str = "/solve";
    /// The solver rejects request bodies above this size.
    pub const MAX_PAYLOAD_BYTES: usize = 16_384;
}

/// Seconds value of a cooldown row.
///
/// Freshly added rows hold a number; once the user edits the number input the
/// raw text is kept so the field echoes exactly what was typed. Both shapes
/// round-trip through storage unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CooldownSeconds {
    Number(f64),
    Text(String),
}

impl CooldownSeconds {
    /// Numeric value with `parseFloat` semantics; NaN when nothing parses.
    pub fn as_f64(&self) -> f64 {
        match self {
            CooldownSeconds::Number(n) => *n,
            CooldownSeconds::Text(s) => parse_float_prefix(s),
        }
    }
}

impl Default for CooldownSeconds {
    fn default() -> Self {
        CooldownSeconds::Number(defaults::COOLDOWN_SECS)
    }
}

impl fmt::Display for CooldownSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CooldownSeconds::Number(n) => write!(f, "{}", n),
            CooldownSeconds::Text(s) => f.write_str(s),
        }
    }
}

/// One row of the cooldown table, in the shape it is stored in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CooldownEntry {
    pub display_name: String,
    pub cooldown: CooldownSeconds,
    /// Comma separated, free text.
    pub group_name: String,
}

impl CooldownEntry {
    /// Trimmed, comma separated group names. Empty tokens are kept.
    pub fn group_names(&self) -> Vec<String> {
        self.group_name
            .split(',')
            .map(|name| name.trim().to_string())
            .collect()
    }
}

/// The row appended by "Add": empty name and groups, 120 seconds.
pub fn empty_cooldown() -> CooldownEntry {
    CooldownEntry::default()
}

/// Return a new list with a default row appended.
pub fn add_cooldown(cooldowns: &[CooldownEntry]) -> Vec<CooldownEntry> {
    let mut out = Vec::with_capacity(cooldowns.len() + 1);
    out.extend_from_slice(cooldowns);
    out.push(empty_cooldown());
    out
}

/// Return a copy of `items` with position `index` replaced by `value`.
///
/// An index past the end leaves the copy unchanged.
pub fn update_at<T: Clone>(items: &[T], index: usize, value: T) -> Vec<T> {
    let mut out = items.to_vec();
    match out.get_mut(index) {
        Some(slot) => *slot = value,
        None => warn!("update_at: index {} out of range (len {})", index, items.len()),
    }
    out
}

/// Return a copy of `items` without position `index`.
pub fn remove_at<T: Clone>(items: &[T], index: usize) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter(|&(other, _)| other != index)
        .map(|(_, item)| item.clone())
        .collect()
}

// Longest numeric prefix accepted by JavaScript's parseFloat.
static FLOAT_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap()
});

/// Parse the leading number of `input` the way `parseFloat` does.
///
/// Leading whitespace is skipped and trailing garbage ignored:
/// `"180s"` is 180, `" 1e2"` is 100, `"abc"` and `""` are NaN.
pub fn parse_float_prefix(input: &str) -> f64 {
    let trimmed = input.trim_start();
    let Some(m) = FLOAT_PREFIX_REGEX.find(trimmed) else {
        return f64::NAN;
    };
    let text = m.as_str();
    match text.trim_start_matches(['+', '-']) {
        "Infinity" if text.starts_with('-') => f64::NEG_INFINITY,
        "Infinity" => f64::INFINITY,
        _ => text.parse().unwrap_or(f64::NAN),
    }
}

/// Cooldown as sent to the solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveCooldown {
    pub display_name: String,
    /// Non-finite values serialize as `null`.
    pub cooldown: f64,
    pub group_names: Vec<String>,
}

/// Request body for `POST /solve`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvePayload {
    pub template: String,
    pub cooldowns: Vec<SolveCooldown>,
}

impl SolvePayload {
    /// Assemble the request body from the committed form state.
    pub fn new(template: &str, cooldowns: &[CooldownEntry]) -> Self {
        let cooldowns = cooldowns
            .iter()
            .map(|entry| {
                let seconds = entry.cooldown.as_f64();
                if !seconds.is_finite() {
                    warn!(
                        "cooldown {:?} has non-numeric duration {:?}, sending null",
                        entry.display_name,
                        entry.cooldown.to_string()
                    );
                }
                SolveCooldown {
                    display_name: entry.display_name.clone(),
                    cooldown: seconds,
                    group_names: entry.group_names(),
                }
            })
            .collect();

        SolvePayload {
            template: template.to_string(),
            cooldowns,
        }
    }
}

/// Body returned by the solver.
///
/// Empty fields are omitted by the server, so both may be missing.
#[derive(Debug, Deserialize)]
struct NoteBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: Option<String>,
}

/// Decoded solver reply.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveResponse {
    Output(String),
    Error(String),
}

impl<'de> Deserialize<'de> for SolveResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let body = NoteBody::deserialize(deserializer)?;
        Ok(match body.error {
            Some(error) if !error.is_empty() => SolveResponse::Error(error),
            _ => SolveResponse::Output(body.output.unwrap_or_default()),
        })
    }
}
