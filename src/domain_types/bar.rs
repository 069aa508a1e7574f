use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::fields::FieldValue;
use crate::utils::date_key;

/// 未知商品名稱的預設值
pub const UNKNOWN_INSTRUMENT: &str = "Unknown";

/// 成交量
///
/// 期貨與股票的成交量為整數，加密貨幣等市場可能出現小數成交量。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Volume {
    Whole(i64),      // 整數成交量
    Fractional(f64), // 小數成交量
}

impl From<Volume> for FieldValue {
    fn from(volume: Volume) -> Self {
        match volume {
            Volume::Whole(v) => FieldValue::Integer(v),
            Volume::Fractional(v) => FieldValue::from_f64(v),
        }
    }
}

impl From<i64> for Volume {
    fn from(value: i64) -> Self {
        Volume::Whole(value)
    }
}

impl From<i32> for Volume {
    fn from(value: i32) -> Self {
        Volume::Whole(value as i64)
    }
}

impl From<f64> for Volume {
    fn from(value: f64) -> Self {
        Volume::Fractional(value)
    }
}

/// 主序列中的單根K棒（日級時間戳）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Volume,
    /// 在主序列中的位置（從 0 開始）
    #[serde(default)]
    pub index: usize,
}

impl Bar {
    /// 創建新的K棒
    pub fn new(
        index: usize,
        timestamp: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: impl Into<Volume>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: volume.into(),
            index,
        }
    }

    /// 快照鍵使用的日期字串 (YYYY-MM-DD)
    pub fn date_key(&self) -> String {
        date_key(self.timestamp)
    }
}

/// 一條指標輸出線
///
/// `values` 長度不超過主序列長度，且向右對齊：最後一個值對應主序列最後一根K棒。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliarySeries {
    /// 面板編號（從 1 開始），無法解析時為 None
    #[serde(default)]
    pub panel_assignment: Option<u32>,
    pub label: String,
    /// 尚未計算的位置以 NaN 表示（JSON 中為 null）
    #[serde(with = "crate::utils::serde_helpers::nullable_f64_vec")]
    pub values: Vec<f64>,
}

impl AuxiliarySeries {
    pub fn new(panel_assignment: Option<u32>, label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            panel_assignment,
            label: label.into(),
            values,
        }
    }
}

/// 商品識別資訊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentIdentity {
    /// 完整名稱，例如 "ES 03-25"
    pub full_name: String,
    /// 主商品名稱，例如 "ES"，用於產生儲存鍵
    pub master_name: String,
}

impl InstrumentIdentity {
    pub fn new(full_name: impl Into<String>, master_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            master_name: master_name.into(),
        }
    }

    /// 將命名空間分隔符 `:` 替換為底線後的儲存鍵
    pub fn sanitized_key(&self) -> String {
        self.master_name.replace(':', "_")
    }
}

impl Default for InstrumentIdentity {
    fn default() -> Self {
        Self::new(UNKNOWN_INSTRUMENT, UNKNOWN_INSTRUMENT)
    }
}

impl fmt::Display for InstrumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}
