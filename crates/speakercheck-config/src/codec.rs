//! Textual (JSON) form of the test history.
//!
//! Numbers are written with the shortest representation that parses back to
//! the same `f32`, so magnitudes and frequencies survive a round trip
//! exactly. Non-finite values have no JSON form, so records holding them are
//! refused on encode. Decoding never fails: unreadable text is an empty
//! history.

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::record::TestRecord;

/// Maximum number of records kept in a history.
pub const HISTORY_CAPACITY: usize = 10;

/// Check that every frequency and magnitude of `record` is finite.
pub fn validate(record: &TestRecord) -> Result<()> {
    let analysis = record.analysis();
    let fields = [
        ("frequency", &analysis.frequencies),
        ("magnitude", &analysis.magnitudes),
    ];
    for (field, values) in fields {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                id: record.id().to_string(),
                field,
                index,
            });
        }
    }
    Ok(())
}

/// Encode one record.
pub fn encode(record: &TestRecord) -> Result<String> {
    validate(record)?;
    Ok(serde_json::to_string(record)?)
}

/// Encode a list of records in the order given.
pub fn encode_all(records: &[TestRecord]) -> Result<String> {
    records.iter().try_for_each(validate)?;
    Ok(serde_json::to_string(records)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Many(Vec<TestRecord>),
    One(Box<TestRecord>),
}

/// Decode a history, most recent first, at most [`HISTORY_CAPACITY`] long.
///
/// Accepts the output of either [`encode_all`] or [`encode`]. Records with
/// equal timestamps keep their stored order.
pub fn decode(text: &str) -> Vec<TestRecord> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut records = match serde_json::from_str::<Stored>(text) {
        Ok(Stored::Many(records)) => records,
        Ok(Stored::One(record)) => vec![*record],
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable test history");
            return Vec::new();
        }
    };

    records.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    records.truncate(HISTORY_CAPACITY);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Channel, TestType};
    use chrono::{TimeZone, Utc};
    use speakercheck_analysis::AnalysisResult;

    fn record_at(millis: i64, magnitudes: Vec<f32>) -> TestRecord {
        let frequencies = (0..magnitudes.len()).map(|i| 20.0 * 1.5f32.powi(i as i32)).collect();
        TestRecord::new(
            TestType::Sweep,
            Channel::Both,
            AnalysisResult {
                frequencies,
                magnitudes,
            },
        )
        .with_timestamp(Utc.timestamp_millis_opt(millis).unwrap())
    }

    #[test]
    fn round_trip_is_exact() {
        let awkward = vec![0.1, 1.0 / 3.0, f32::MIN_POSITIVE, 0.123_456_79, 0.0, 7.5e-4];
        let record = record_at(1_000, awkward);
        let decoded = decode(&encode_all(std::slice::from_ref(&record)).unwrap());
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn single_record_decodes() {
        let record = record_at(5, vec![0.5]);
        let decoded = decode(&encode(&record).unwrap());
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn non_finite_is_refused() {
        let nan = record_at(1, vec![0.5, f32::NAN]);
        assert!(matches!(
            encode(&nan),
            Err(ConfigError::NonFinite { field: "magnitude", index: 1, .. })
        ));

        let mut analysis = record_at(2, vec![0.5]).analysis().clone();
        analysis.frequencies[0] = f32::INFINITY;
        let inf = TestRecord::new(TestType::Tone, Channel::Left, analysis);
        let good = record_at(3, vec![0.5]);
        assert!(matches!(
            encode_all(&[good, inf]),
            Err(ConfigError::NonFinite { field: "frequency", index: 0, .. })
        ));
    }

    #[test]
    fn malformed_is_empty() {
        assert!(decode("").is_empty());
        assert!(decode("   \n").is_empty());
        assert!(decode("{not json").is_empty());
        assert!(decode("[{\"id\": 3}]").is_empty());
        assert!(decode("42").is_empty());
    }

    #[test]
    fn sorts_most_recent_first_and_truncates() {
        let records: Vec<_> = (0..12).map(|i| record_at(i * 1000, vec![0.2])).collect();
        let decoded = decode(&encode_all(&records).unwrap());
        assert_eq!(decoded.len(), HISTORY_CAPACITY);
        assert_eq!(decoded[0].timestamp().timestamp_millis(), 11_000);
        assert_eq!(decoded[9].timestamp().timestamp_millis(), 2_000);
    }

    #[test]
    fn equal_timestamps_keep_order() {
        let a = record_at(7, vec![0.1]);
        let b = record_at(7, vec![0.2]);
        let decoded = decode(&encode_all(&[a.clone(), b.clone()]).unwrap());
        assert_eq!(decoded, vec![a, b]);
    }

    #[test]
    fn reads_history_without_sweep_field() {
        let text = r#"[{"id":"00112233445566ff","timestamp":1700000000000,"type":"tone","channel":"left","analysis":{"frequencies":[1000.0],"magnitudes":[0.25]}}]"#;
        let decoded = decode(text);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].test_type(), TestType::Tone);
        assert_eq!(decoded[0].channel(), Channel::Left);
        assert!(decoded[0].sweep().is_none());
        assert_eq!(decoded[0].analysis().magnitudes, vec![0.25]);
    }
}
