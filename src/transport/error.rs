use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// 傳輸錯誤
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("無效的端點位址: {0}")]
    InvalidEndpoint(String),

    #[error("WebSocket 連線失敗: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("WebSocket 傳送失敗: {0}")]
    Send(#[source] tungstenite::Error),

    #[error("WebSocket 關閉失敗: {0}")]
    Close(#[source] tungstenite::Error),

    #[error("尚未建立連線")]
    NotConnected,
}

/// 傳輸結果類型
pub type TransportResult<T> = Result<T, TransportError>;
