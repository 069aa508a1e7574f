//! 對齊與組裝引擎
//!
//! 將主序列與任意數量、長度不一的指標輸出線合併為逐K棒的快照記錄。
//! 指標線一律向右對齊：長度為 `count` 的輸出線在主序列位置 `i`
//! 對應的索引為 `i - (M - count)`，超出範圍即為未定義值（輸出 null）。

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::domain_types::{FieldValue, PanelKey, Snapshot, SnapshotRecord};
use crate::series::{AuxiliaryLine, SeriesError, SeriesReader};
use crate::utils::week_label;

/// 組裝錯誤
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// 主序列讀取失敗會中止整個匯出週期
    #[error("讀取主序列失敗: {0}")]
    Primary(#[from] SeriesError),
}

/// 組裝結果類型
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// 本週期內已解析面板與長度的輸出線
#[derive(Debug)]
struct ResolvedLine {
    line: AuxiliaryLine,
    panel: PanelKey,
    /// 長度讀取失敗時為 None，整條線輸出 null
    len: Option<usize>,
}

/// 計算向右對齊後的輸出線索引
///
/// `offset = primary_len - aux_len`，對應索引為 `primary_index - offset`，
/// 不在 `[0, aux_len)` 範圍內時返回 None。
pub fn aligned_index(primary_index: usize, primary_len: usize, aux_len: usize) -> Option<usize> {
    let offset = primary_len as i64 - aux_len as i64;
    let idx = primary_index as i64 - offset;
    if idx >= 0 && idx < aux_len as i64 {
        Some(idx as usize)
    } else {
        None
    }
}

/// 快照組裝器
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotAssembler;

impl SnapshotAssembler {
    pub fn new() -> Self {
        Self
    }

    /// 組裝完整快照
    ///
    /// 單一指標值讀取失敗只會讓該欄位成為 null；主序列無法取得時視為空序列，
    /// 讀取K棒途中失敗則返回錯誤。
    pub fn assemble(&self, reader: &dyn SeriesReader) -> AssemblyResult<Snapshot> {
        let instrument = reader.instrument();
        let total = match reader.primary_len() {
            Ok(total) => total,
            Err(e) => {
                warn!("商品 {} 的主序列不可用，輸出空快照: {}", instrument, e);
                return Ok(Snapshot::new());
            }
        };
        let lines = self.resolve_lines(reader);

        debug!(
            "開始組裝快照: 商品 {}, {} 根K棒, {} 條指標線",
            instrument, total, lines.len()
        );

        let mut snapshot = Snapshot::with_capacity(total);
        for i in 0..total {
            let mut bar = reader.bar_at(i)?;
            bar.index = i;

            let mut record = SnapshotRecord::from_bar(&bar, week_label(bar.timestamp), &instrument.full_name);
            for resolved in &lines {
                let value = self.read_aligned(reader, resolved, i, total);
                record
                    .panel_mut(resolved.panel)
                    .insert(resolved.line.label.clone(), value);
            }

            if let Some(previous) = snapshot.insert(record) {
                debug!(
                    "日期 {} 重複，K棒 {} 覆寫K棒 {}",
                    bar.date_key(),
                    i,
                    previous.bar_index
                );
            }
        }

        Ok(snapshot)
    }

    /// 每條輸出線在週期開始時解析一次面板與長度
    fn resolve_lines(&self, reader: &dyn SeriesReader) -> Vec<ResolvedLine> {
        reader
            .auxiliary_lines()
            .into_iter()
            .map(|line| {
                let panel = PanelKey::from_assignment(reader.panel_assignment(line.indicator));
                let len = match reader.auxiliary_len(&line) {
                    Ok(len) => Some(len),
                    Err(e) => {
                        warn!("無法讀取指標線 {} 的長度，整條線輸出 null: {}", line.label, e);
                        None
                    }
                };
                ResolvedLine { line, panel, len }
            })
            .collect()
    }

    fn read_aligned(
        &self,
        reader: &dyn SeriesReader,
        resolved: &ResolvedLine,
        primary_index: usize,
        primary_len: usize,
    ) -> FieldValue {
        let Some(idx) = resolved
            .len
            .and_then(|len| aligned_index(primary_index, primary_len, len))
        else {
            return FieldValue::Null;
        };

        match reader.auxiliary_value(&resolved.line, idx) {
            Ok(v) => FieldValue::from_f64(v),
            Err(e) => {
                trace!("讀取 {}[{}] 失敗: {}", resolved.line.label, idx, e);
                FieldValue::Null
            }
        }
    }
}
