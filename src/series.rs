//! 序列讀取介面
//!
//! 圖表主機透過 [`SeriesReader`] 提供唯讀的主序列K棒、指標輸出線與面板資訊。
//! 本模組同時提供記憶體實作 [`InMemorySeries`]，可從 JSON 檔案載入。

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::domain_types::{AuxiliarySeries, Bar, InstrumentIdentity};

/// 序列讀取錯誤
#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("主序列不可用: {0}")]
    PrimaryUnavailable(String),

    #[error("索引超出範圍: {index} (長度 {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("資料來源不可用: {0}")]
    SourceUnavailable(String),

    #[error("讀取序列檔案失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列檔案格式錯誤: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 序列讀取結果類型
pub type SeriesResult<T> = Result<T, SeriesError>;

/// 主機端指標的不透明識別碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorHandle(pub usize);

/// 指標的一條輸出線
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryLine {
    pub indicator: IndicatorHandle,
    pub plot: usize,
    pub label: String,
}

/// 圖表主機提供的唯讀序列介面
pub trait SeriesReader: Send + Sync {
    /// 商品識別資訊
    fn instrument(&self) -> InstrumentIdentity;

    /// 主序列長度
    fn primary_len(&self) -> SeriesResult<usize>;

    /// 讀取主序列指定位置的K棒
    fn bar_at(&self, index: usize) -> SeriesResult<Bar>;

    /// 所有指標輸出線，依指標順序與輸出線順序排列
    fn auxiliary_lines(&self) -> Vec<AuxiliaryLine>;

    /// 輸出線的長度
    fn auxiliary_len(&self, line: &AuxiliaryLine) -> SeriesResult<usize>;

    /// 讀取輸出線指定位置的值
    fn auxiliary_value(&self, line: &AuxiliaryLine, index: usize) -> SeriesResult<f64>;

    /// 指標所在的面板編號（從 1 開始），無法解析時返回 None
    fn panel_assignment(&self, indicator: IndicatorHandle) -> Option<u32>;

    /// 主機的指標計算是否已完成
    fn is_ready(&self) -> bool {
        true
    }
}

/// 記憶體中的序列資料
///
/// 每條 [`AuxiliarySeries`] 視為一個只有單一輸出線的指標。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemorySeries {
    #[serde(default)]
    pub instrument: InstrumentIdentity,
    pub bars: Vec<Bar>,
    #[serde(default)]
    pub auxiliary: Vec<AuxiliarySeries>,
}

impl InMemorySeries {
    /// 創建新的序列資料，K棒索引依位置重新編號
    pub fn new(instrument: InstrumentIdentity, bars: Vec<Bar>) -> Self {
        let mut series = Self {
            instrument,
            bars,
            auxiliary: Vec::new(),
        };
        series.reindex();
        series
    }

    /// 加入一條輸出線
    pub fn with_auxiliary(mut self, auxiliary: AuxiliarySeries) -> Self {
        self.auxiliary.push(auxiliary);
        self
    }

    /// 從 JSON 字串載入
    pub fn from_json_str(json: &str) -> SeriesResult<Self> {
        let mut series: Self = serde_json::from_str(json)?;
        series.reindex();
        Ok(series)
    }

    /// 從 JSON 檔案載入
    pub fn from_json_file(path: impl AsRef<Path>) -> SeriesResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let series = Self::from_json_str(&content)?;
        debug!(
            "從 {} 載入 {} 根K棒與 {} 條指標線",
            path.display(),
            series.bars.len(),
            series.auxiliary.len()
        );
        Ok(series)
    }

    fn reindex(&mut self) {
        for (i, bar) in self.bars.iter_mut().enumerate() {
            bar.index = i;
        }
    }

    fn auxiliary_series(&self, line: &AuxiliaryLine) -> SeriesResult<&AuxiliarySeries> {
        self.auxiliary
            .get(line.indicator.0)
            .filter(|_| line.plot == 0)
            .ok_or_else(|| SeriesError::SourceUnavailable(format!("未知的指標線: {}", line.label)))
    }
}

impl SeriesReader for InMemorySeries {
    fn instrument(&self) -> InstrumentIdentity {
        self.instrument.clone()
    }

    fn primary_len(&self) -> SeriesResult<usize> {
        Ok(self.bars.len())
    }

    fn bar_at(&self, index: usize) -> SeriesResult<Bar> {
        self.bars.get(index).cloned().ok_or(SeriesError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    fn auxiliary_lines(&self) -> Vec<AuxiliaryLine> {
        self.auxiliary
            .iter()
            .enumerate()
            .map(|(i, s)| AuxiliaryLine {
                indicator: IndicatorHandle(i),
                plot: 0,
                label: s.label.clone(),
            })
            .collect()
    }

    fn auxiliary_len(&self, line: &AuxiliaryLine) -> SeriesResult<usize> {
        Ok(self.auxiliary_series(line)?.values.len())
    }

    fn auxiliary_value(&self, line: &AuxiliaryLine, index: usize) -> SeriesResult<f64> {
        let series = self.auxiliary_series(line)?;
        series.values.get(index).copied().ok_or(SeriesError::IndexOutOfRange {
            index,
            len: series.values.len(),
        })
    }

    fn panel_assignment(&self, indicator: IndicatorHandle) -> Option<u32> {
        self.auxiliary.get(indicator.0).and_then(|s| s.panel_assignment)
    }
}
