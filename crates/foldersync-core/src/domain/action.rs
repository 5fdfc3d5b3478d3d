//! Actions applied to the replica tree
//!
//! An [`Action`] is computed by the engine and executed immediately; it is
//! never queued or persisted. [`ActionKind`] is the payload-free tag used
//! for log records and pass counters.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ============================================================================
// ActionKind
// ============================================================================

/// The five mutations the engine can apply to a replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A file copied to a path that did not exist in the replica
    CreateFile,
    /// A whole subtree copied to a path that did not exist in the replica
    CreateDirectory,
    /// A replica file overwritten from its source counterpart
    UpdateFile,
    /// A replica-only file removed
    DeleteFile,
    /// A replica-only subtree removed
    DeleteDirectory,
}

impl ActionKind {
    /// All kinds, in reporting order
    pub const ALL: [ActionKind; 5] = [
        ActionKind::CreateFile,
        ActionKind::CreateDirectory,
        ActionKind::UpdateFile,
        ActionKind::DeleteFile,
        ActionKind::DeleteDirectory,
    ];

    /// Returns true if the action targets a directory subtree
    pub fn is_directory(self) -> bool {
        matches!(
            self,
            ActionKind::CreateDirectory | ActionKind::DeleteDirectory
        )
    }

    /// Past-tense verb used in log records ("created", "updated", "removed")
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::CreateFile | ActionKind::CreateDirectory => "created",
            ActionKind::UpdateFile => "updated",
            ActionKind::DeleteFile | ActionKind::DeleteDirectory => "removed",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::CreateFile => "create_file",
            ActionKind::CreateDirectory => "create_directory",
            ActionKind::UpdateFile => "update_file",
            ActionKind::DeleteFile => "delete_file",
            ActionKind::DeleteDirectory => "delete_directory",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Action
// ============================================================================

/// A single mutation of the replica tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Copy `source` (a file) to the absent `dest`
    CreateFile {
        /// File in the source tree
        source: PathBuf,
        /// Absent path in the replica tree
        dest: PathBuf,
    },
    /// Copy the subtree rooted at `source` to the absent `dest`
    CreateDirectory {
        /// Directory in the source tree
        source: PathBuf,
        /// Absent path in the replica tree
        dest: PathBuf,
    },
    /// Overwrite the existing file `dest` with `source`
    UpdateFile {
        /// File in the source tree
        source: PathBuf,
        /// Existing file in the replica tree
        dest: PathBuf,
    },
    /// Remove the replica file `dest`
    DeleteFile {
        /// Replica-only file
        dest: PathBuf,
    },
    /// Remove the replica subtree rooted at `dest`
    DeleteDirectory {
        /// Replica-only directory
        dest: PathBuf,
    },
}

impl Action {
    /// The payload-free kind of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateFile { .. } => ActionKind::CreateFile,
            Action::CreateDirectory { .. } => ActionKind::CreateDirectory,
            Action::UpdateFile { .. } => ActionKind::UpdateFile,
            Action::DeleteFile { .. } => ActionKind::DeleteFile,
            Action::DeleteDirectory { .. } => ActionKind::DeleteDirectory,
        }
    }

    /// The replica path this action mutates
    pub fn dest(&self) -> &Path {
        match self {
            Action::CreateFile { dest, .. }
            | Action::CreateDirectory { dest, .. }
            | Action::UpdateFile { dest, .. }
            | Action::DeleteFile { dest }
            | Action::DeleteDirectory { dest } => dest,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = if self.kind().is_directory() {
            "Directory"
        } else {
            "File"
        };
        write!(
            f,
            "{} {} is {}",
            subject,
            self.dest().display(),
            self.kind().verb()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_paths() {
        let action = Action::UpdateFile {
            source: PathBuf::from("/src/a.txt"),
            dest: PathBuf::from("/dst/a.txt"),
        };
        assert_eq!(action.kind(), ActionKind::UpdateFile);
        assert_eq!(action.dest(), Path::new("/dst/a.txt"));

        let action = Action::DeleteDirectory {
            dest: PathBuf::from("/dst/old"),
        };
        assert_eq!(action.kind(), ActionKind::DeleteDirectory);
        assert_eq!(action.dest(), Path::new("/dst/old"));
    }

    #[test]
    fn test_display_matches_log_wording() {
        let action = Action::CreateDirectory {
            source: PathBuf::from("/src/sub"),
            dest: PathBuf::from("/dst/sub"),
        };
        assert_eq!(action.to_string(), "Directory /dst/sub is created");

        let action = Action::DeleteFile {
            dest: PathBuf::from("/dst/old.txt"),
        };
        assert_eq!(action.to_string(), "File /dst/old.txt is removed");
    }

    #[test]
    fn test_kind_display_and_flags() {
        assert_eq!(ActionKind::CreateFile.to_string(), "create_file");
        assert_eq!(ActionKind::DeleteDirectory.to_string(), "delete_directory");
        assert!(ActionKind::CreateDirectory.is_directory());
        assert!(!ActionKind::UpdateFile.is_directory());
        assert_eq!(ActionKind::UpdateFile.verb(), "updated");
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let yaml = serde_yaml::to_string(&ActionKind::CreateDirectory).unwrap();
        assert_eq!(yaml.trim(), "create_directory");
    }
}
