//! Validation of client-supplied prompts, action tokens and job ids.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum prompt length in characters (after trimming).
pub const MAX_PROMPT_LENGTH: usize = 1_000;

/// Pattern a persisted generation id must match before we touch the disk.
pub const JOB_ID_PATTERN: &str =
    r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$";

static JOB_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(JOB_ID_PATTERN).expect("valid regex"));

/// Number of images in one provider result grid.
pub const GRID_SIZE: u8 = 4;

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Trim a prompt and check it is non-empty and within [`MAX_PROMPT_LENGTH`].
///
/// Returns the trimmed prompt.
pub fn validate_prompt(raw: &str) -> Result<String, CoreError> {
    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(CoreError::Validation("No prompt provided".to_string()));
    }
    let len = prompt.chars().count();
    if len > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt too long (max {MAX_PROMPT_LENGTH} characters, got {len})"
        )));
    }
    Ok(prompt.to_string())
}

// ---------------------------------------------------------------------------
// Job ids
// ---------------------------------------------------------------------------

/// Check a provider job id supplied by a client.
///
/// The id ends up as a single path segment of a provider URL, so path
/// separators, query/fragment markers and dot segments are rejected.
pub fn validate_job_id(raw: &str) -> Result<String, CoreError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(CoreError::Validation("Missing job id".to_string()));
    }
    if id == "." || id == ".." || id.contains(['/', '\\', '?', '#']) {
        return Err(CoreError::Validation(format!("Invalid job id: '{id}'")));
    }
    Ok(id.to_string())
}

/// Strict UUID-shaped check used before deleting a persisted generation.
pub fn validate_generation_id(raw: &str) -> Result<(), CoreError> {
    if JOB_ID_RE.is_match(raw) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid job id format: '{raw}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Action tokens
// ---------------------------------------------------------------------------

/// Kind of follow-up transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// `U`: upscale a single image.
    Upscale,
    /// `V`: four variations of a single image.
    Variation,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Upscale => "Upscale",
            Self::Variation => "Variation",
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Upscale => 'U',
            Self::Variation => 'V',
        }
    }
}

/// A parsed `<U|V><1-4>` action token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionToken {
    pub kind: ActionKind,
    /// 1-based image index within the result grid.
    pub index: u8,
}

impl ActionToken {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let token = raw.trim();
        let invalid = || {
            CoreError::Validation(format!(
                "Invalid action token '{token}'. Expected U1-U{GRID_SIZE} or V1-V{GRID_SIZE}"
            ))
        };

        let mut chars = token.chars();
        let kind = match chars.next() {
            Some('U') => ActionKind::Upscale,
            Some('V') => ActionKind::Variation,
            _ => return Err(invalid()),
        };
        let index = match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_digit(10).ok_or_else(invalid)? as u8,
            _ => return Err(invalid()),
        };
        if !(1..=GRID_SIZE).contains(&index) {
            return Err(invalid());
        }

        Ok(Self { kind, index })
    }

    /// Human readable prompt for the derived job, e.g.
    /// `Upscale (U2) of: a red fox`.
    pub fn describe(&self, original_prompt: &str) -> String {
        format!("{} ({self}) of: {original_prompt}", self.kind.label())
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.index)
    }
}
