//! Error taxonomy.
//!
//! Load errors are isolated per type by the closure collector; everything else
//! is a contract violation and aborts the run.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failures while decoding a wire-level descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("unknown primitive `{0}` in descriptor `{1}`")]
    UnknownPrimitive(char, String),
    #[error("truncated descriptor `{0}`")]
    Truncated(String),
    #[error("malformed descriptor `{descriptor}` at offset {offset}")]
    Malformed { descriptor: String, offset: usize },
    #[error("`void` is only valid as a return type (`{0}`)")]
    MisplacedVoid(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("failed to parse {path}: {message}")]
    Document { path: PathBuf, message: String },
    #[error("JSON pointer `{pointer}` selects nothing in {path}")]
    Pointer { path: PathBuf, pointer: String },
    #[error("class entry `{name}` is not loadable: {message}")]
    Unloadable { name: String, message: String },
    #[error("class `{0}` is not present in any archive")]
    Missing(String),
    #[error("class `{name}`: {source}")]
    Signature {
        name: String,
        #[source]
        source: SignatureError,
    },
}

impl MetadataError {
    /// Whether the error must abort generation instead of skipping one type.
    pub fn is_fatal(&self) -> bool {
        match self {
            MetadataError::Unloadable { .. } | MetadataError::Missing(_) => false,
            MetadataError::Signature { source, .. } => {
                matches!(source, SignatureError::UnknownPrimitive(..))
            }
            MetadataError::Io { .. }
            | MetadataError::Document { .. }
            | MetadataError::Pointer { .. } => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to read template overlay {path}: {source}")]
    Overlay {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("{0}: is not a directory")]
    NotADirectory(PathBuf),
    #[error("{0}: directory is not writable")]
    ReadOnly(PathBuf),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to inspect {path}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_primitive_is_fatal_but_missing_types_are_not() {
        let fatal = MetadataError::Signature {
            name: "pkg.A".into(),
            source: SignatureError::UnknownPrimitive('Q', "(Q)V".into()),
        };
        assert!(fatal.is_fatal());

        let skipped = MetadataError::Missing("pkg.B".into());
        assert!(!skipped.is_fatal());

        let malformed = MetadataError::Signature {
            name: "pkg.A".into(),
            source: SignatureError::Truncated("(I".into()),
        };
        assert!(!malformed.is_fatal(), "a broken entry is just an unloadable type");
    }
}
