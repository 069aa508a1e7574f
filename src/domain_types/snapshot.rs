//! 快照記錄與快照文件

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use super::bar::{Bar, Volume};
use super::fields::{FieldMap, FieldValue};
use crate::utils::date_key;

/// 面板鍵
///
/// 已解析的面板編號顯示為 `Panel n`，未解析（或編號為 0）時顯示為 `Panel ?`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelKey(Option<u32>);

impl PanelKey {
    /// 價格面板，永遠包含基本 OHLCV 欄位
    pub const PRICE: PanelKey = PanelKey(Some(1));

    pub fn from_assignment(assignment: Option<u32>) -> Self {
        PanelKey(assignment.filter(|n| *n >= 1))
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "Panel {}", n),
            None => write!(f, "Panel ?"),
        }
    }
}

/// 單根K棒的快照記錄
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub week: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Volume,
    pub instrument: String,
    pub bar_index: usize,
    pub panels: FieldMap,
}

impl SnapshotRecord {
    /// 由K棒建立記錄，價格面板預先寫入基本欄位
    pub fn from_bar(bar: &Bar, week: String, instrument: &str) -> Self {
        let mut panels = FieldMap::new();
        let price_panel = panels.object_entry(&PanelKey::PRICE.to_string());
        price_panel.insert("Price", bar.close);
        price_panel.insert("Open", bar.open);
        price_panel.insert("High", bar.high);
        price_panel.insert("Low", bar.low);
        price_panel.insert("Close", bar.close);
        price_panel.insert("Volume", bar.volume);

        Self {
            week,
            date: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            instrument: instrument.to_string(),
            bar_index: bar.index,
            panels,
        }
    }

    /// 取得（必要時建立）面板記錄
    pub fn panel_mut(&mut self, key: PanelKey) -> &mut FieldMap {
        self.panels.object_entry(&key.to_string())
    }

    pub fn panel(&self, key: PanelKey) -> Option<&FieldMap> {
        self.panels.get(&key.to_string()).and_then(FieldValue::as_object)
    }

    pub fn date_key(&self) -> String {
        date_key(self.date)
    }

    /// 轉換為固定欄位順序的巢狀映射
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("Week", self.week.as_str());
        map.insert("Date", self.date_key());
        map.insert("Open", self.open);
        map.insert("High", self.high);
        map.insert("Low", self.low);
        map.insert("Close", self.close);
        map.insert("Volume", self.volume);
        map.insert("Instrument", self.instrument.as_str());
        map.insert("BarIndex", self.bar_index);
        map.insert("Panels", self.panels.clone());
        map
    }
}

/// 完整的快照文件：日期字串到記錄的映射，依K棒索引遞增的插入順序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<(String, SnapshotRecord)>,
    positions: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// 插入記錄；同一日期重複出現時覆寫先前的記錄
    pub fn insert(&mut self, record: SnapshotRecord) -> Option<SnapshotRecord> {
        let key = record.date_key();
        match self.positions.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos].1, record)),
            None => {
                self.positions.insert(key.clone(), self.records.len());
                self.records.push((key, record));
                None
            }
        }
    }

    pub fn get(&self, date_key: &str) -> Option<&SnapshotRecord> {
        self.positions.get(date_key).map(|&pos| &self.records[pos].1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotRecord)> {
        self.records.iter().map(|(k, r)| (k.as_str(), r))
    }
}
