//! 匯出協調器
//!
//! 每個觸發事件執行一次完整匯出：等待主機就緒、讀取序列並組裝快照、
//! 編碼、寫入儲存、最後經由傳輸送出。同一個協調器實例只會執行一次有效匯出，
//! 所有錯誤都收斂在 [`ExportReport`] 中，不會傳回觸發端。

use serde::Serialize;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::assembly::SnapshotAssembler;
use crate::config::{ApplicationConfig, ExportConfig, SinkConfig};
use crate::encoder::encode_snapshot;
use crate::series::SeriesReader;
use crate::storage::{snapshot_key, FileSnapshotSink, SinkReceipt, SnapshotSink};
use crate::transport::{
    SendOutcome, SnapshotTransport, TransportResult, TransportStats, WebSocketTransport,
};

/// 匯出生命週期狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportState {
    NotStarted,
    Running,
    Done,
}

/// 匯出週期的整體結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// 所有步驟皆成功
    Completed,
    /// 快照已產生，但寫入或傳送有失敗
    Degraded,
    /// 讀取K棒途中失敗，沒有寫入也沒有傳送
    Failed,
    /// 此協調器已執行過匯出
    AlreadyRun,
}

/// 單一步驟的結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    Done(T),
    Skipped,
    Failed(String),
}

impl<T> StepOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// 匯出報告
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub status: ExportStatus,
    pub instrument: String,
    /// 主機在等待期限內是否回報就緒
    pub host_ready: bool,
    pub bars: usize,
    pub document_bytes: usize,
    pub sink: StepOutcome<SinkReceipt>,
    pub transport: StepOutcome<SendOutcome>,
    pub error: Option<String>,
}

impl ExportReport {
    fn already_run() -> Self {
        Self {
            status: ExportStatus::AlreadyRun,
            instrument: String::new(),
            host_ready: false,
            bars: 0,
            document_bytes: 0,
            sink: StepOutcome::Skipped,
            transport: StepOutcome::Skipped,
            error: None,
        }
    }

    fn failed(instrument: String, host_ready: bool, error: String) -> Self {
        Self {
            status: ExportStatus::Failed,
            instrument,
            host_ready,
            bars: 0,
            document_bytes: 0,
            sink: StepOutcome::Skipped,
            transport: StepOutcome::Skipped,
            error: Some(error),
        }
    }
}

/// 匯出協調器
pub struct ExportOrchestrator {
    config: ExportConfig,
    file_suffix: String,
    assembler: SnapshotAssembler,
    sink: Arc<dyn SnapshotSink>,
    transport: tokio::sync::Mutex<Box<dyn SnapshotTransport>>,
    state: parking_lot::Mutex<ExportState>,
}

impl ExportOrchestrator {
    pub fn new(
        config: ExportConfig,
        sink: Arc<dyn SnapshotSink>,
        transport: Box<dyn SnapshotTransport>,
    ) -> Self {
        Self {
            config,
            file_suffix: SinkConfig::default().file_suffix,
            assembler: SnapshotAssembler::new(),
            sink,
            transport: tokio::sync::Mutex::new(transport),
            state: parking_lot::Mutex::new(ExportState::NotStarted),
        }
    }

    /// 設定儲存鍵後綴
    pub fn with_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// 依應用程序配置建立檔案儲存與 WebSocket 傳輸
    pub fn from_config(config: &ApplicationConfig) -> TransportResult<Self> {
        let transport = WebSocketTransport::from_config(&config.transport)?;
        let sink = FileSnapshotSink::from_config(&config.sink);

        Ok(Self::new(config.export.clone(), Arc::new(sink), Box::new(transport))
            .with_file_suffix(config.sink.file_suffix.clone()))
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock()
    }

    pub async fn transport_stats(&self) -> TransportStats {
        self.transport.lock().await.stats()
    }

    /// 執行一次匯出；已執行過則直接返回 [`ExportStatus::AlreadyRun`]
    pub async fn run_once(&self, reader: &dyn SeriesReader) -> ExportReport {
        if !self.try_begin() {
            debug!("匯出已執行過，略過本次觸發");
            return ExportReport::already_run();
        }

        let report = self.export(reader).await;
        *self.state.lock() = ExportState::Done;
        report
    }

    /// 關閉傳輸連線
    pub async fn shutdown(&self) {
        if let Err(e) = self.transport.lock().await.close().await {
            warn!("關閉傳輸連線失敗: {}", e);
        }
    }

    fn try_begin(&self) -> bool {
        let mut state = self.state.lock();
        if *state != ExportState::NotStarted {
            return false;
        }
        *state = ExportState::Running;
        true
    }

    async fn export(&self, reader: &dyn SeriesReader) -> ExportReport {
        let instrument = reader.instrument();
        let host_ready = self.wait_until_ready(reader).await;

        let snapshot = match self.assembler.assemble(reader) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("匯出失敗，商品 {}: {}", instrument, e);
                return ExportReport::failed(instrument.full_name, host_ready, e.to_string());
            }
        };

        let document = encode_snapshot(&snapshot);

        let sink = if snapshot.is_empty() {
            info!("主序列沒有資料，不寫入快照檔案");
            StepOutcome::Skipped
        } else {
            let key = snapshot_key(&instrument, &self.file_suffix);
            match self.sink.write(&key, &document).await {
                Ok(receipt) => {
                    info!("已匯出 {} 根K棒至 {}", snapshot.len(), receipt.location);
                    StepOutcome::Done(receipt)
                }
                Err(e) => {
                    error!("快照寫入失敗 {}: {}", key, e);
                    StepOutcome::Failed(e.to_string())
                }
            }
        };

        let transport = {
            let mut transport = self.transport.lock().await;
            match transport.send(&document).await {
                Ok(outcome) => StepOutcome::Done(outcome),
                Err(e) => {
                    error!("快照傳送失敗: {}", e);
                    StepOutcome::Failed(e.to_string())
                }
            }
        };

        let status = if sink.is_failed() || transport.is_failed() {
            ExportStatus::Degraded
        } else {
            info!("完整歷史匯出與 WebSocket 傳送完成");
            ExportStatus::Completed
        };

        ExportReport {
            status,
            instrument: instrument.full_name,
            host_ready,
            bars: snapshot.len(),
            document_bytes: document.len(),
            sink,
            transport,
            error: None,
        }
    }

    /// 固定等待後輪詢主機就緒狀態，逾時仍繼續匯出
    async fn wait_until_ready(&self, reader: &dyn SeriesReader) -> bool {
        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            debug!("等待圖表載入 {:?}", settle);
            sleep(settle).await;
        }

        let deadline = Instant::now() + self.config.readiness_timeout();
        loop {
            if reader.is_ready() {
                return true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "主機在 {:?} 內未回報就緒，仍繼續匯出，指標值可能不完整",
                    self.config.readiness_timeout()
                );
                return false;
            }
            sleep(self.config.readiness_poll()).await;
        }
    }
}

impl std::fmt::Debug for ExportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOrchestrator")
            .field("config", &self.config)
            .field("file_suffix", &self.file_suffix)
            .field("state", &self.state())
            .finish()
    }
}
