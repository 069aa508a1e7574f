use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::SinkConfig;
use crate::domain_types::InstrumentIdentity;

/// 快照儲存錯誤
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("無效的儲存鍵: {0}")]
    InvalidKey(String),
}

/// 快照儲存結果類型
pub type SinkResult<T> = Result<T, SinkError>;

/// 寫入完成的回執
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkReceipt {
    /// 實際寫入位置
    pub location: String,
    /// 寫入的位元組數
    pub bytes: usize,
}

/// 產生商品的儲存鍵：清理後的主商品名稱加上固定後綴
pub fn snapshot_key(instrument: &InstrumentIdentity, suffix: &str) -> String {
    format!("{}{}", instrument.sanitized_key(), suffix)
}

/// 快照儲存介面，寫入採覆寫語意，不保留版本
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// 以 UTF-8 文字寫入完整文件
    async fn write(&self, key: &str, document: &str) -> SinkResult<SinkReceipt>;
}

/// 檔案系統快照儲存
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    directory: PathBuf,
}

impl FileSnapshotSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(&config.directory)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 取得鍵對應的檔案路徑
    pub fn path_for(&self, key: &str) -> SinkResult<PathBuf> {
        let invalid = key.trim().is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key == "."
            || key == "..";
        if invalid {
            return Err(SinkError::InvalidKey(key.to_string()));
        }
        Ok(self.directory.join(key))
    }
}

#[async_trait]
impl SnapshotSink for FileSnapshotSink {
    async fn write(&self, key: &str, document: &str) -> SinkResult<SinkReceipt> {
        let path = self.path_for(key)?;

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(&path, document.as_bytes()).await?;

        let location = path.display().to_string();
        info!("快照已寫入 {} ({} bytes)", location, document.len());

        Ok(SinkReceipt {
            location,
            bytes: document.len(),
        })
    }
}
