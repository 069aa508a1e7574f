//! 巢狀欄位值與保持插入順序的欄位映射

use std::collections::HashMap;
use std::fmt;

/// 快照文件中的欄位值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 未定義、NaN 或無窮大
    Null,
    Float(f64),
    Integer(i64),
    Text(String),
    Object(FieldMap),
}

impl FieldValue {
    /// 從浮點數建立欄位值，NaN 與無窮大轉為 Null
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            FieldValue::Float(value)
        } else {
            FieldValue::Null
        }
    }

    /// 以類型預設的字串轉換建立文字值
    pub fn display<T: fmt::Display>(value: T) -> Self {
        FieldValue::Text(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&FieldMap> {
        match self {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::from_f64(value)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::from_f64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(value: FieldMap) -> Self {
        FieldValue::Object(value)
    }
}

/// 保持首次插入順序的欄位映射
///
/// 重複鍵會原地覆寫值，位置維持第一次插入時的位置。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
    positions: HashMap<String, usize>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆寫欄位，返回被覆寫的舊值
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        match self.positions.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// 取得巢狀物件，不存在（或不是物件）時建立空物件
    pub fn object_entry(&mut self, key: &str) -> &mut FieldMap {
        let pos = match self.positions.get(key) {
            Some(&pos) => {
                if !matches!(self.entries[pos].1, FieldValue::Object(_)) {
                    self.entries[pos].1 = FieldValue::Object(FieldMap::new());
                }
                pos
            }
            None => {
                self.insert(key, FieldMap::new());
                self.entries.len() - 1
            }
        };

        match &mut self.entries[pos].1 {
            FieldValue::Object(map) => map,
            _ => unreachable!("object entry was just ensured"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
