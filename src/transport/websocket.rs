use async_trait::async_trait;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::TransportConfig;
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::{ConnectionState, SendOutcome, SnapshotTransport, TransportStats};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket 快照傳輸
///
/// 連線控制權完全屬於本結構，呼叫端只透過 [`SnapshotTransport`] 操作。
pub struct WebSocketTransport {
    endpoint: Url,
    stream: Option<WsStream>,
    state: ConnectionState,
    stats: TransportStats,
}

impl WebSocketTransport {
    /// 創建傳輸實例，只接受 ws:// 與 wss:// 位址
    pub fn new(endpoint: &str) -> TransportResult<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidEndpoint(format!(
                "{}: 不支援的協定 {}",
                endpoint,
                url.scheme()
            )));
        }

        Ok(Self {
            endpoint: url,
            stream: None,
            state: ConnectionState::Disconnected,
            stats: TransportStats::default(),
        })
    }

    pub fn from_config(config: &TransportConfig) -> TransportResult<Self> {
        Self::new(&config.endpoint)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn mark_disconnected(&mut self) {
        self.stream = None;
        self.state = ConnectionState::Disconnected;
        self.stats.failures += 1;
    }
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

#[async_trait]
impl SnapshotTransport for WebSocketTransport {
    async fn connect(&mut self) -> TransportResult<()> {
        if self.state == ConnectionState::Connected && self.stream.is_some() {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        self.stats.connect_attempts += 1;
        debug!("連線至 {}", self.endpoint);

        match connect_async(self.endpoint.as_str()).await {
            Ok((stream, _response)) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                self.stats.successful_connects += 1;
                info!("WebSocket 已連線: {}", self.endpoint);
                Ok(())
            }
            Err(e) => {
                self.mark_disconnected();
                warn!("WebSocket 連線失敗 {}: {}", self.endpoint, e);
                Err(TransportError::Connect(e))
            }
        }
    }

    async fn send(&mut self, payload: &str) -> TransportResult<SendOutcome> {
        if payload.trim().is_empty() {
            debug!("內容為空白，略過傳送");
            return Ok(SendOutcome::Skipped);
        }

        if self.state != ConnectionState::Connected || self.stream.is_none() {
            self.connect().await?;
        }

        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        match stream.send(Message::Text(payload.to_owned())).await {
            Ok(()) => {
                let bytes = payload.len();
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += bytes as u64;
                info!("JSON 已送出 ({} bytes)", bytes);
                Ok(SendOutcome::Sent { bytes })
            }
            Err(e) => {
                self.mark_disconnected();
                warn!("WebSocket 傳送失敗: {}", e);
                Err(TransportError::Send(e))
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        let Some(mut stream) = self.stream.take() else {
            self.state = ConnectionState::Disconnected;
            return Ok(());
        };
        self.state = ConnectionState::Disconnected;

        match stream.close(None).await {
            Ok(()) => {
                debug!("WebSocket 已關閉: {}", self.endpoint);
                Ok(())
            }
            // 對端已先關閉
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(TransportError::Close(e)),
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}
