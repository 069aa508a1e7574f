mod common;

use proptest::prelude::*;
use serde_json::Value;

use common::{daily_series, two_bar_ema_series};
use snapshot_streamer::assembly::{aligned_index, SnapshotAssembler};
use snapshot_streamer::domain_types::AuxiliarySeries;
use snapshot_streamer::encoder::encode_snapshot;

#[test]
fn test_two_bars_with_short_ema() {
    let snapshot = SnapshotAssembler::new().assemble(&two_bar_ema_series()).unwrap();
    let document = encode_snapshot(&snapshot);

    let expected = concat!(
        "{\n",
        r#"  "2024-01-02": {"Week": "1/2024","Date": "2024-01-02","Open": 1,"High": 2,"Low": 0.5,"Close": 1.5,"Volume": 100,"Instrument": "ES 03-24","BarIndex": 0,"Panels": {"Panel 1": {"Price": 1.5,"Open": 1,"High": 2,"Low": 0.5,"Close": 1.5,"Volume": 100},"Panel 2": {"EMA": null}}},"#,
        "\n",
        r#"  "2024-01-03": {"Week": "1/2024","Date": "2024-01-03","Open": 1.5,"High": 2.5,"Low": 1,"Close": 2,"Volume": 150,"Instrument": "ES 03-24","BarIndex": 1,"Panels": {"Panel 1": {"Price": 2,"Open": 1.5,"High": 2.5,"Low": 1,"Close": 2,"Volume": 150},"Panel 2": {"EMA": 2.1}}}"#,
        "\n}"
    );
    assert_eq!(document, expected);
}

#[test]
fn test_document_parses_as_strict_json() {
    let series = daily_series(5)
        .with_auxiliary(AuxiliarySeries::new(Some(2), "SMA", vec![101.0, f64::NAN, 103.25]))
        .with_auxiliary(AuxiliarySeries::new(None, "Pivot \"P\"", vec![f64::INFINITY]));
    let snapshot = SnapshotAssembler::new().assemble(&series).unwrap();
    let document = encode_snapshot(&snapshot);

    let parsed: Value = serde_json::from_str(&document).unwrap();
    let entries = parsed.as_object().unwrap();
    assert_eq!(entries.len(), 5);

    let first = &parsed["2024-01-01"];
    assert_eq!(first["Instrument"], "NYMEX:CL 04-24");
    assert_eq!(first["Volume"], 1000);
    assert_eq!(first["Panels"]["Panel 2"]["SMA"], Value::Null);
    assert_eq!(first["Panels"]["Panel ?"]["Pivot \"P\""], Value::Null);

    let fifth = &parsed["2024-01-05"];
    assert_eq!(fifth["BarIndex"], 4);
    assert_eq!(fifth["Close"], 104.5);
    assert_eq!(fifth["Panels"]["Panel 2"]["SMA"], 103.25);
    assert_eq!(parsed["2024-01-04"]["Panels"]["Panel 2"]["SMA"], Value::Null);
    assert_eq!(parsed["2024-01-03"]["Panels"]["Panel 2"]["SMA"], 101.0);
    assert_eq!(fifth["Panels"]["Panel ?"]["Pivot \"P\""], Value::Null);
}

#[test]
fn test_encoding_is_idempotent() {
    let series = daily_series(30)
        .with_auxiliary(AuxiliarySeries::new(Some(3), "RSI", (0..20).map(|i| i as f64 * 1.5).collect()));
    let assembler = SnapshotAssembler::new();

    let first = encode_snapshot(&assembler.assemble(&series).unwrap());
    let second = encode_snapshot(&assembler.assemble(&series).unwrap());

    assert_eq!(first, second);
}

#[test]
fn test_entries_follow_bar_order() {
    let snapshot = SnapshotAssembler::new().assemble(&daily_series(10)).unwrap();
    let indexes: Vec<usize> = snapshot.iter().map(|(_, record)| record.bar_index).collect();
    assert_eq!(indexes, (0..10).collect::<Vec<_>>());
}

proptest! {
    #[test]
    fn prop_one_entry_per_bar(len in 0usize..60) {
        let snapshot = SnapshotAssembler::new().assemble(&daily_series(len)).unwrap();
        prop_assert_eq!(snapshot.len(), len);
    }

    #[test]
    fn prop_right_alignment(len in 1usize..40, aux_len in 0usize..50) {
        let values: Vec<f64> = (0..aux_len).map(|i| i as f64).collect();
        let series = daily_series(len)
            .with_auxiliary(AuxiliarySeries::new(Some(2), "Line", values.clone()));
        let snapshot = SnapshotAssembler::new().assemble(&series).unwrap();

        for (i, (_, record)) in snapshot.iter().enumerate() {
            let value = record
                .panels
                .get("Panel 2")
                .and_then(|panel| panel.as_object())
                .and_then(|panel| panel.get("Line"))
                .cloned()
                .unwrap();
            match aligned_index(i, len, aux_len) {
                Some(idx) => {
                    prop_assert_eq!(idx as i64, i as i64 - (len as i64 - aux_len as i64));
                    prop_assert_eq!(value.as_f64(), Some(values[idx]));
                }
                None => prop_assert!(value.is_null()),
            }
        }
    }
}
