//! Conventional-commit classification of diff text.
//!
//! Pure and deterministic: a fixed keyword precedence table, evaluated in
//! order, first match wins. The same table serves both the server tool
//! handler (100-character summary) and the client fallback path
//! (50-character summary); the two truncation lengths are contractual and
//! observable in output.

/// Maximum summary characters on the server path.
pub const SERVER_SUMMARY_CHARS: usize = 100;

/// Maximum summary characters on the client fallback path.
pub const FALLBACK_SUMMARY_CHARS: usize = 50;

/// Conventional commit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Refactor,
    Docs,
    Chore,
}

impl CommitType {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Docs => "docs",
            Self::Chore => "chore",
        }
    }
}

/// Keyword groups in precedence order. Evaluation stops at the first group
/// with any case-insensitive substring match.
const PRECEDENCE: &[(&[&str], CommitType)] = &[
    (&["add", "new", "implement"], CommitType::Feat),
    (&["fix", "bug", "issue"], CommitType::Fix),
    (&["refactor"], CommitType::Refactor),
    (&["doc"], CommitType::Docs),
];

/// Classify diff text into a commit type.
///
/// Total over any input; an empty or keyword-free diff falls through to
/// [`CommitType::Chore`].
pub fn classify(diff: &str) -> CommitType {
    let lowered = diff.to_lowercase();
    for (keywords, commit_type) in PRECEDENCE {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return *commit_type;
        }
    }
    CommitType::Chore
}

/// Render `<type>: <summary>` where the summary is the diff truncated to
/// its first `limit` characters.
///
/// Truncation counts characters, not bytes; splitting a multi-byte UTF-8
/// sequence would produce an invalid summary.
pub fn commit_message(diff: &str, limit: usize) -> String {
    format!("{}: {}", classify(diff).prefix(), truncate_chars(diff, limit))
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
