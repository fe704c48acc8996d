//! RSY-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Top-level error type for replisync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("[RSY-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[RSY-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[RSY-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[RSY-1101] {role} folder {path} does not exist")]
    MissingRoot { role: &'static str, path: PathBuf },

    #[error("[RSY-1102] {inner} is nested inside {outer}; mirroring would recurse into itself")]
    OverlappingRoots { outer: PathBuf, inner: PathBuf },

    #[error("[RSY-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[RSY-3001] permission denied while trying to {op} {path}")]
    PermissionDenied { op: &'static str, path: PathBuf },

    #[error("[RSY-3002] {path} vanished while trying to {op}")]
    NotFound { op: &'static str, path: PathBuf },

    #[error("[RSY-3003] failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[RSY-3004] {path} not walked: beyond max_depth {max_depth} while following symlinks")]
    DepthLimit { path: PathBuf, max_depth: usize },

    #[error("[RSY-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SyncError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "RSY-1001",
            Self::MissingConfig { .. } => "RSY-1002",
            Self::ConfigParse { .. } => "RSY-1003",
            Self::MissingRoot { .. } => "RSY-1101",
            Self::OverlappingRoots { .. } => "RSY-1102",
            Self::Serialization { .. } => "RSY-2101",
            Self::PermissionDenied { .. } => "RSY-3001",
            Self::NotFound { .. } => "RSY-3002",
            Self::Io { .. } => "RSY-3003",
            Self::DepthLimit { .. } => "RSY-3004",
            Self::Runtime { .. } => "RSY-3900",
        }
    }

    /// Whether the next pass might succeed without operator intervention.
    ///
    /// Entries that vanish mid-walk and generic I/O hiccups are transient;
    /// permission and configuration problems stay broken until someone fixes them.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Io { .. } | Self::Runtime { .. }
        )
    }

    /// Whether this error aborts startup rather than a single entry.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::MissingRoot { .. }
                | Self::OverlappingRoots { .. }
        )
    }

    /// Path the failure is about, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingConfig { path }
            | Self::MissingRoot { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::NotFound { path, .. }
            | Self::Io { path, .. }
            | Self::DepthLimit { path, .. } => Some(path),
            Self::OverlappingRoots { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Classify an IO error raised while performing `op` on `path`.
    #[must_use]
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied { op, path },
            ErrorKind::NotFound => Self::NotFound { op, path },
            _ => Self::Io { op, path, source },
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err(kind: ErrorKind) -> std::io::Error {
        std::io::Error::new(kind, "test")
    }

    #[test]
    fn error_codes_are_unique() {
        let errors: Vec<SyncError> = vec![
            SyncError::InvalidConfig {
                details: String::new(),
            },
            SyncError::MissingConfig {
                path: PathBuf::new(),
            },
            SyncError::ConfigParse {
                context: "",
                details: String::new(),
            },
            SyncError::MissingRoot {
                role: "Source",
                path: PathBuf::new(),
            },
            SyncError::OverlappingRoots {
                outer: PathBuf::new(),
                inner: PathBuf::new(),
            },
            SyncError::Serialization {
                context: "",
                details: String::new(),
            },
            SyncError::PermissionDenied {
                op: "copy",
                path: PathBuf::new(),
            },
            SyncError::NotFound {
                op: "copy",
                path: PathBuf::new(),
            },
            SyncError::Io {
                op: "copy",
                path: PathBuf::new(),
                source: io_err(ErrorKind::Other),
            },
            SyncError::DepthLimit {
                path: PathBuf::new(),
                max_depth: 1,
            },
            SyncError::Runtime {
                details: String::new(),
            },
        ];

        let codes: Vec<&str> = errors.iter().map(SyncError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
        assert!(codes.iter().all(|c| c.starts_with("RSY-")));
    }

    #[test]
    fn io_classifies_by_kind() {
        let denied = SyncError::io("copy", "/r/a.txt", io_err(ErrorKind::PermissionDenied));
        assert_eq!(denied.code(), "RSY-3001");
        assert!(!denied.is_retryable());

        let gone = SyncError::io("delete", "/r/a.txt", io_err(ErrorKind::NotFound));
        assert_eq!(gone.code(), "RSY-3002");
        assert!(gone.is_retryable());

        let other = SyncError::io("copy", "/r/a.txt", io_err(ErrorKind::Interrupted));
        assert_eq!(other.code(), "RSY-3003");
        assert!(other.is_retryable());
    }

    #[test]
    fn display_names_operation_and_path() {
        let err = SyncError::io("copy", "/tmp/replica/a.txt", io_err(ErrorKind::Other));
        let msg = err.to_string();
        assert!(msg.contains("RSY-3003"), "{msg}");
        assert!(msg.contains("copy"), "{msg}");
        assert!(msg.contains("/tmp/replica/a.txt"), "{msg}");
        assert_eq!(err.path(), Some(Path::new("/tmp/replica/a.txt")));
    }

    #[test]
    fn missing_root_message_names_role() {
        let err = SyncError::MissingRoot {
            role: "Replica",
            path: PathBuf::from("/nope"),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Replica folder /nope does not exist"));
    }

    #[test]
    fn depth_limit_is_a_permanent_per_entry_error() {
        let err = SyncError::DepthLimit {
            path: PathBuf::from("/src/loop/loop"),
            max_depth: 2,
        };
        assert_eq!(err.code(), "RSY-3004");
        assert!(!err.is_fatal());
        assert!(!err.is_retryable());
        assert_eq!(err.path(), Some(Path::new("/src/loop/loop")));
    }

    #[test]
    fn per_entry_errors_are_not_fatal() {
        assert!(!SyncError::io("delete", "/x", io_err(ErrorKind::Other)).is_fatal());
        assert!(
            SyncError::InvalidConfig {
                details: String::new()
            }
            .is_fatal()
        );
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: SyncError = json_err.into();
        assert_eq!(err.code(), "RSY-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: SyncError = toml_err.into();
        assert_eq!(err.code(), "RSY-1003");
    }
}
