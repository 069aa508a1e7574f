#![allow(dead_code)]

use chrono::NaiveDate;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use snapshot_streamer::config::ReceiverConfig;
use snapshot_streamer::domain_types::{AuxiliarySeries, Bar, InstrumentIdentity};
use snapshot_streamer::receiver::SnapshotReceiver;
use snapshot_streamer::series::InMemorySeries;

pub fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, d).unwrap()
}

/// 兩根K棒與一條長度為 1 的 EMA（面板 2）
pub fn two_bar_ema_series() -> InMemorySeries {
    InMemorySeries::new(
        InstrumentIdentity::new("ES 03-24", "ES"),
        vec![
            Bar::new(0, day(1, 2), 1.0, 2.0, 0.5, 1.5, 100),
            Bar::new(1, day(1, 3), 1.5, 2.5, 1.0, 2.0, 150),
        ],
    )
    .with_auxiliary(AuxiliarySeries::new(Some(2), "EMA", vec![2.1]))
}

/// 連續交易日的主序列
pub fn daily_series(len: usize) -> InMemorySeries {
    let start = day(1, 1);
    let bars = (0..len)
        .map(|i| {
            let price = 100.0 + i as f64;
            Bar::new(
                i,
                start + chrono::Duration::days(i as i64),
                price,
                price + 1.0,
                price - 1.0,
                price + 0.5,
                1000 + i as i64,
            )
        })
        .collect();
    InMemorySeries::new(InstrumentIdentity::new("NYMEX:CL 04-24", "NYMEX:CL"), bars)
}

/// 在隨機埠啟動接收端
pub async fn spawn_receiver(dir: &Path) -> (Arc<SnapshotReceiver>, SocketAddr) {
    let receiver = Arc::new(SnapshotReceiver::new(ReceiverConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_file: dir.join("live_market_data.json").display().to_string(),
        ..ReceiverConfig::default()
    }));
    let listener = receiver.bind().await.expect("無法綁定接收端");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(Arc::clone(&receiver).serve(listener));
    (receiver, addr)
}

/// 等待接收端處理完訊息
pub async fn wait_for_latest(receiver: &SnapshotReceiver) -> Option<serde_json::Value> {
    for _ in 0..100 {
        if receiver.last_update().is_some() {
            return receiver.latest().await.unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    None
}
