// storage.rs - 快照持久化模組
//
// 將編碼後的快照文件寫入持久化儲存，以商品識別為鍵，重複寫入直接覆寫。

pub mod snapshot_sink;

pub use snapshot_sink::{
    snapshot_key, FileSnapshotSink, SinkError, SinkReceipt, SinkResult, SnapshotSink,
};

#[cfg(test)]
pub use snapshot_sink::MockSnapshotSink;
