//! 串流傳輸模組
//!
//! 以單一 WebSocket 連線將快照文件推送至接收端。連線狀態機：
//! `Disconnected -> Connecting -> Connected`，任何傳送失敗都回到 `Disconnected`，
//! 不做自動重連。

pub mod error;
pub mod websocket;

use async_trait::async_trait;
use serde::Serialize;

pub use error::{TransportError, TransportResult};
pub use websocket::WebSocketTransport;

/// 連線狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 未連線
    Disconnected,
    /// 連線中
    Connecting,
    /// 已連線，可以傳送
    Connected,
}

/// 單次傳送的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// 內容為空白，未建立連線也未傳送
    Skipped,
    /// 已以單一文字訊息送出
    Sent { bytes: usize },
}

/// 傳輸統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransportStats {
    pub connect_attempts: u64,
    pub successful_connects: u64,
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub failures: u64,
}

/// 快照傳輸介面
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotTransport: Send {
    /// 建立連線
    async fn connect(&mut self) -> TransportResult<()>;

    /// 傳送完整文件，未連線時先嘗試連線一次
    async fn send(&mut self, payload: &str) -> TransportResult<SendOutcome>;

    /// 關閉連線
    async fn close(&mut self) -> TransportResult<()>;

    /// 目前連線狀態
    fn state(&self) -> ConnectionState;

    /// 傳輸統計
    fn stats(&self) -> TransportStats;
}
