//! Test history and measurement settings for speakercheck.
//!
//! # Features
//!
//! - **Records**: [`TestRecord`] with typed [`TestType`] and [`Channel`]
//! - **Codec**: lossless JSON encoding of the history ([`codec`])
//! - **Stores**: [`KeyValueStore`] with in-memory and directory backends
//! - **History**: [`HistoryLog`], bounded to the ten most recent tests
//! - **Settings**: [`MeasurementSettings`] loaded from TOML
//! - **Paths**: platform config and data directories
//!
//! # Example
//!
//! ```rust,no_run
//! use speakercheck_config::{Channel, FileStore, HistoryLog, TestRecord, TestType, paths};
//! use speakercheck_analysis::AnalysisResult;
//!
//! let mut history = HistoryLog::open(FileStore::new(paths::history_dir()));
//! let record = TestRecord::new(TestType::Sweep, Channel::Left, AnalysisResult::default());
//! if let Err(e) = history.save(record) {
//!     eprintln!("history not saved: {e}");
//! }
//! ```

pub mod codec;
mod error;
mod history;
mod record;
mod settings;
mod store;

/// Platform-specific paths for settings and history.
pub mod paths;

pub use codec::{HISTORY_CAPACITY, decode, encode, encode_all, validate};
pub use error::{ConfigError, Result};
pub use history::{HISTORY_KEY, HistoryLog};
pub use paths::{default_config_path, history_dir, user_config_dir};
pub use record::{Channel, TestRecord, TestType};
pub use settings::MeasurementSettings;
pub use store::{FileStore, KeyValueStore, MemoryStore};
