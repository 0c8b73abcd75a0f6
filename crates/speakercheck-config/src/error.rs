//! Error types for history and settings operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting history or settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A settings or history file could not be read.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A settings or history file could not be written.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config or history directory could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// History could not be encoded.
    #[error("history JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The settings file is not valid TOML for [`MeasurementSettings`](crate::MeasurementSettings).
    #[error("invalid settings file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings could not be written as TOML.
    #[error("failed to encode settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A record holds a NaN or infinite value, which JSON cannot represent.
    #[error("test {id} has a non-finite {field} at index {index}")]
    NonFinite {
        /// Id of the rejected record.
        id: String,
        /// `"frequency"` or `"magnitude"`.
        field: &'static str,
        /// Position of the first bad value.
        index: usize,
    },

    /// A store refused a value larger than its size limit.
    #[error("storage quota exceeded for '{key}': {size} bytes > {limit} bytes")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Size of the rejected value in bytes.
        size: usize,
        /// Store limit in bytes.
        limit: usize,
    },
}

impl ConfigError {
    /// [`ConfigError::ReadFile`] for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::WriteFile`] for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::CreateDir`] for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

/// Result of history and settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn write_file_display_and_source() {
        let err = ConfigError::write_file("/a/history.json", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to write file"), "got: {msg}");
        assert!(msg.contains("/a/history.json"), "got: {msg}");
        assert!(err.source().is_some(), "WriteFile must expose I/O source");
    }

    #[test]
    fn create_dir_display() {
        let err = ConfigError::create_dir("/a/b", mock_io_err());
        assert!(err.to_string().contains("failed to create directory"));
    }

    #[test]
    fn quota_display() {
        let err = ConfigError::QuotaExceeded {
            key: "speaker_check_history".to_string(),
            size: 2048,
            limit: 1024,
        };
        assert_eq!(
            err.to_string(),
            "storage quota exceeded for 'speaker_check_history': 2048 bytes > 1024 bytes"
        );
    }

    #[test]
    fn non_finite_display() {
        let err = ConfigError::NonFinite {
            id: "00112233445566ff".to_string(),
            field: "magnitude",
            index: 3,
        };
        assert_eq!(
            err.to_string(),
            "test 00112233445566ff has a non-finite magnitude at index 3"
        );
    }

    #[test]
    fn toml_parse_from() {
        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(err.to_string().starts_with("invalid settings file"));
    }
}
