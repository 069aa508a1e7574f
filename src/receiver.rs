//! 快照接收端
//!
//! 監聽 WebSocket 連線，每則文字訊息視為一份完整快照：解析成功即成為最新快照並寫入資料檔，
//! 並回覆確認訊息；解析失敗則回覆錯誤訊息。

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::accept_async_with_config;
use tracing::{debug, error, info, warn};

use crate::config::ReceiverConfig;

/// 接收端錯誤
#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket 錯誤: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("JSON 錯誤: {0}")]
    Json(#[from] serde_json::Error),
}

/// 接收端結果類型
pub type ReceiverResult<T> = Result<T, ReceiverError>;

/// 最新收到的快照
#[derive(Debug, Clone)]
pub struct LatestSnapshot {
    pub data: Value,
    pub received_at: DateTime<Utc>,
}

/// WebSocket 快照接收端
#[derive(Debug)]
pub struct SnapshotReceiver {
    config: ReceiverConfig,
    latest: RwLock<Option<LatestSnapshot>>,
}

impl SnapshotReceiver {
    pub fn new(config: ReceiverConfig) -> Self {
        Self {
            config,
            latest: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// 綁定監聽位址
    pub async fn bind(&self) -> ReceiverResult<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        info!("快照接收端監聽於 ws://{}", listener.local_addr()?);
        Ok(listener)
    }

    /// 綁定並持續接受連線
    pub async fn run(self: Arc<Self>) -> ReceiverResult<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// 在已綁定的監聽器上接受連線，每條連線由獨立任務處理
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> ReceiverResult<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let receiver = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = receiver.handle_connection(stream, peer).await {
                    warn!("連線 {} 異常結束: {}", peer, e);
                }
            });
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> ReceiverResult<()> {
        let ws = accept_async_with_config(stream, Some(self.websocket_config())).await?;
        info!("客戶端已連線: {}", peer);

        let (mut write, mut read) = ws.split();
        while let Some(message) = read.next().await {
            match message? {
                Message::Text(text) => {
                    let reply = self.handle_message(&text).await;
                    write.send(Message::Text(reply)).await?;
                }
                Message::Close(_) => break,
                other => debug!("忽略非文字訊息: {:?}", other),
            }
        }

        info!("客戶端已斷線: {}", peer);
        Ok(())
    }

    fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig {
            max_message_size: Some(self.config.max_message_bytes),
            max_frame_size: Some(self.config.max_message_bytes),
            ..WebSocketConfig::default()
        }
    }

    /// 處理一則文字訊息並返回回覆內容
    pub async fn handle_message(&self, text: &str) -> String {
        let reply = match serde_json::from_str::<Value>(text) {
            Ok(data) => match self.store(data).await {
                Ok(ack) => ack,
                Err(e) => {
                    error!("儲存快照失敗: {}", e);
                    json!({ "status": "error", "message": e.to_string() })
                }
            },
            Err(e) => {
                warn!("收到無效的 JSON: {}", e);
                json!({ "status": "error", "message": "Invalid JSON" })
            }
        };
        reply.to_string()
    }

    async fn store(&self, data: Value) -> ReceiverResult<Value> {
        let bars = data.as_object().map_or(0, |entries| entries.len());
        let received_at = Utc::now();
        let content = serde_json::to_vec_pretty(&data)?;

        *self.latest.write() = Some(LatestSnapshot { data, received_at });
        tokio::fs::write(&self.config.data_file, content).await?;
        info!("收到 {} 根K棒的快照，已寫入 {}", bars, self.config.data_file);

        Ok(json!({
            "status": "success",
            "bars_received": bars,
            "timestamp": received_at.to_rfc3339(),
        }))
    }

    /// 最新快照；記憶體中沒有時從資料檔載入
    pub async fn latest(&self) -> ReceiverResult<Option<Value>> {
        if let Some(latest) = self.latest.read().as_ref() {
            return Ok(Some(latest.data.clone()));
        }

        match tokio::fs::read_to_string(&self.config.data_file).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 最新快照的接收時間
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.latest.read().as_ref().map(|latest| latest.received_at)
    }
}
