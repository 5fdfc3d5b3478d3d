//! Policies that shape a synchronization pass
//!
//! Each policy is a plain enum that can be read from YAML (snake_case)
//! or parsed from a command-line flag via [`FromStr`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// CompareMode
// ============================================================================

/// How two regular files present on both sides are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Always compare full content byte-for-byte
    #[default]
    Content,
    /// Treat equal size and equal mtime as identical; otherwise compare content
    ///
    /// Misses drift that keeps both size and modification time unchanged.
    Quick,
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareMode::Content => "content",
            CompareMode::Quick => "quick",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CompareMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" => Ok(CompareMode::Content),
            "quick" => Ok(CompareMode::Quick),
            other => Err(DomainError::UnknownVariant {
                kind: "compare mode",
                value: other.to_string(),
                valid: "content, quick",
            }),
        }
    }
}

// ============================================================================
// KindMismatchPolicy
// ============================================================================

/// What to do when a name is a directory on one side and not on the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindMismatchPolicy {
    /// Remove the replica entry, then recreate it with the source's kind
    #[default]
    Replace,
    /// Leave both entries untouched
    Ignore,
}

impl fmt::Display for KindMismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KindMismatchPolicy::Replace => "replace",
            KindMismatchPolicy::Ignore => "ignore",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for KindMismatchPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(KindMismatchPolicy::Replace),
            "ignore" => Ok(KindMismatchPolicy::Ignore),
            other => Err(DomainError::UnknownVariant {
                kind: "kind mismatch policy",
                value: other.to_string(),
                valid: "replace, ignore",
            }),
        }
    }
}

// ============================================================================
// FailurePolicy
// ============================================================================

/// How the engine and the scheduler react to a failed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the pass at the first failure; the service then exits non-zero
    #[default]
    Abort,
    /// Skip the failing item, finish the pass and keep scheduling passes
    Continue,
}

impl FailurePolicy {
    /// Returns true when a failure ends the pass
    pub fn stops_on_failure(self) -> bool {
        matches!(self, FailurePolicy::Abort)
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FailurePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(DomainError::UnknownVariant {
                kind: "failure policy",
                value: other.to_string(),
                valid: "abort, continue",
            }),
        }
    }
}
