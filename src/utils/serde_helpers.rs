// utils/serde_helpers.rs - 序列化與反序列化輔助函數
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 將含有 null 的數值陣列反序列化為 f64 陣列，null 轉為 NaN
///
/// 圖表主機匯出的指標值在尚未計算完成的位置以 null 表示，
/// 反序列化後統一以 NaN 表示「無值」，組裝時會再輸出為 null。
///
/// # 使用範例
///
/// ```
/// use serde::Deserialize;
/// use snapshot_streamer::utils::serde_helpers::nullable_f64_vec;
///
/// #[derive(Deserialize)]
/// struct Plot {
///     #[serde(with = "nullable_f64_vec")]
///     values: Vec<f64>,
/// }
///
/// let plot: Plot = serde_json::from_str(r#"{"values": [1.5, null]}"#).unwrap();
/// assert!(plot.values[1].is_nan());
/// ```
pub mod nullable_f64_vec {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        values
            .iter()
            .map(|v| if v.is_finite() { Some(*v) } else { None })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }
}
