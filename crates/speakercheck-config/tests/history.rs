//! History persistence through the directory-backed store.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use speakercheck_analysis::{AnalysisResult, SweepSpec};
use speakercheck_config::{
    Channel, FileStore, HISTORY_CAPACITY, HISTORY_KEY, HistoryLog, KeyValueStore, TestRecord,
    TestType, decode, encode_all,
};

fn sweep_record(seq: i64, magnitudes: Vec<f32>) -> TestRecord {
    let frequencies = (0..magnitudes.len())
        .map(|i| 20.0 * 1.035f32.powi(i as i32))
        .collect();
    TestRecord::new(
        TestType::Sweep,
        Channel::Right,
        AnalysisResult {
            frequencies,
            magnitudes,
        },
    )
    .with_timestamp(Utc.timestamp_millis_opt(1_700_000_000_000 + seq * 1000).unwrap())
    .with_sweep(SweepSpec::default())
}

#[test]
fn history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let saved: Vec<_> = (0..11)
        .map(|seq| sweep_record(seq, vec![0.1 + seq as f32 / 100.0; 200]))
        .collect();
    {
        let mut log = HistoryLog::open(FileStore::new(dir.path()));
        for record in &saved {
            log.save(record.clone()).unwrap();
        }
    }

    let log = HistoryLog::open(FileStore::new(dir.path()));
    assert_eq!(log.len(), HISTORY_CAPACITY);
    for (loaded, original) in log.records().iter().zip(saved.iter().rev()) {
        assert_eq!(loaded, original);
        assert_eq!(loaded.sweep(), Some(&SweepSpec::default()));
    }
}

#[test]
fn corrupt_history_file_is_replaced_on_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    std::fs::write(store.path_for(HISTORY_KEY), "{\"truncated\": [").unwrap();

    let mut log = HistoryLog::open(store);
    assert!(log.is_empty());

    log.save(sweep_record(1, vec![0.5; 4])).unwrap();
    let text = log.store().get(HISTORY_KEY).unwrap().unwrap();
    assert_eq!(decode(&text).len(), 1);
}

#[test]
fn out_of_order_file_is_sorted_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path());
    let records = vec![
        sweep_record(2, vec![0.2]),
        sweep_record(9, vec![0.9]),
        sweep_record(5, vec![0.5]),
    ];
    store.set(HISTORY_KEY, &encode_all(&records).unwrap()).unwrap();

    let log = HistoryLog::open(store);
    let order: Vec<f32> = log.records().iter().map(|r| r.analysis().magnitudes[0]).collect();
    assert_eq!(order, vec![0.9, 0.5, 0.2]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any normal or zero f32 sequence survives encode/decode bit for bit.
    #[test]
    fn codec_preserves_f32_exactly(
        magnitudes in prop::collection::vec(prop::num::f32::NORMAL | prop::num::f32::ZERO, 0..64),
        channel in prop::sample::select(vec![Channel::Left, Channel::Right, Channel::Both]),
    ) {
        let frequencies: Vec<f32> = (0..magnitudes.len()).map(|i| 20.0 + i as f32 * 0.1).collect();
        let record = TestRecord::new(
            TestType::Sweep,
            channel,
            AnalysisResult { frequencies, magnitudes },
        );

        let decoded = decode(&encode_all(std::slice::from_ref(&record)).unwrap());
        prop_assert_eq!(decoded.len(), 1);
        let got = &decoded[0];
        prop_assert_eq!(got.channel(), channel);
        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&got.analysis().magnitudes), bits(&record.analysis().magnitudes));
        prop_assert_eq!(bits(&got.analysis().frequencies), bits(&record.analysis().frequencies));
    }
}

#[test]
fn nan_record_leaves_history_file_intact() {
    let dir = tempfile::tempdir().unwrap();
    let saved: Vec<_> = (0..3).map(|seq| sweep_record(seq, vec![0.4; 8])).collect();
    {
        let mut log = HistoryLog::open(FileStore::new(dir.path()));
        for record in &saved {
            log.save(record.clone()).unwrap();
        }
        assert!(log.save(sweep_record(3, vec![0.4, f32::NAN])).is_err());
    }

    let log = HistoryLog::open(FileStore::new(dir.path()));
    let expected: Vec<_> = saved.iter().rev().cloned().collect();
    assert_eq!(log.records(), expected.as_slice());
}
