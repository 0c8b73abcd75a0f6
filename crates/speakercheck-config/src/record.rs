//! Persisted test records.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use speakercheck_analysis::{AnalysisResult, SweepSpec};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of excitation a test played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Fixed-frequency sine.
    Tone,
    /// Exponential sine sweep.
    Sweep,
}

impl TestType {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Tone => "tone",
            TestType::Sweep => "sweep",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tone" => Ok(TestType::Tone),
            "sweep" => Ok(TestType::Sweep),
            other => Err(format!("unknown test type '{other}' (expected tone or sweep)")),
        }
    }
}

/// Which loudspeaker(s) the excitation was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Left speaker only.
    Left,
    /// Right speaker only.
    Right,
    /// Both speakers.
    #[default]
    Both,
}

impl Channel {
    /// Stereo pan position: -1 left, 0 centre, +1 right.
    pub fn pan(&self) -> f32 {
        match self {
            Channel::Left => -1.0,
            Channel::Both => 0.0,
            Channel::Right => 1.0,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Left => "left",
            Channel::Right => "right",
            Channel::Both => "both",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Channel::Left),
            "right" | "r" => Ok(Channel::Right),
            "both" | "stereo" => Ok(Channel::Both),
            other => Err(format!("unknown channel '{other}' (expected left, right or both)")),
        }
    }
}

/// One completed measurement.
///
/// Records are immutable once created. Timestamps are kept at millisecond
/// precision, which is what the JSON form stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    test_type: TestType,
    channel: Channel,
    analysis: AnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sweep: Option<SweepSpec>,
}

impl TestRecord {
    /// Create a record stamped with the current time and a fresh id.
    pub fn new(test_type: TestType, channel: Channel, analysis: AnalysisResult) -> Self {
        let timestamp = Utc::now().trunc_subsecs(3);
        Self {
            id: generate_id(timestamp),
            timestamp,
            test_type,
            channel,
            analysis,
            sweep: None,
        }
    }

    /// Override the timestamp (truncated to milliseconds).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(3);
        self
    }

    /// Attach the sweep that was played.
    pub fn with_sweep(mut self, sweep: SweepSpec) -> Self {
        self.sweep = Some(sweep);
        self
    }

    /// Opaque 16-hex-digit identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the test was run.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Tone or sweep.
    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    /// Speaker routing.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Measured response.
    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    /// Sweep parameters, for sweep tests that recorded them.
    pub fn sweep(&self) -> Option<&SweepSpec> {
        self.sweep.as_ref()
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 16 hex digits from a hash of time, process and a per-process counter.
fn generate_id(timestamp: DateTime<Utc>) -> String {
    let nanos = timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| timestamp.timestamp_millis().saturating_mul(1_000_000));
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = blake3::Hasher::new();
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    hasher.update(&count.to_le_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            frequencies: vec![20.0, 40.0],
            magnitudes: vec![0.3, 0.25],
        }
    }

    #[test]
    fn ids_are_unique_hex() {
        let a = TestRecord::new(TestType::Sweep, Channel::Both, analysis());
        let b = TestRecord::new(TestType::Sweep, Channel::Both, analysis());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), 16);
        assert!(a.id().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn timestamp_is_millisecond_precision() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let record = TestRecord::new(TestType::Tone, Channel::Left, analysis()).with_timestamp(ts);
        assert_eq!(record.timestamp().timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn json_field_names() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let record = TestRecord::new(TestType::Sweep, Channel::Right, analysis())
            .with_timestamp(ts)
            .with_sweep(SweepSpec::default());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "sweep");
        assert_eq!(value["channel"], "right");
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert_eq!(value["sweep"]["end_freq"], 20000.0);
        assert!(value["analysis"]["frequencies"].is_array());
    }

    #[test]
    fn sweep_is_optional_on_the_wire() {
        let record = TestRecord::new(TestType::Tone, Channel::Both, analysis());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("sweep").is_none());
    }

    #[test]
    fn parse_enums() {
        assert_eq!("Sweep".parse::<TestType>(), Ok(TestType::Sweep));
        assert!("noise".parse::<TestType>().is_err());
        assert_eq!("l".parse::<Channel>(), Ok(Channel::Left));
        assert_eq!("both".parse::<Channel>(), Ok(Channel::Both));
        assert!("centre".parse::<Channel>().is_err());
    }

    #[test]
    fn pan_positions() {
        assert_eq!(Channel::Left.pan(), -1.0);
        assert_eq!(Channel::Both.pan(), 0.0);
        assert_eq!(Channel::Right.pan(), 1.0);
    }
}
