//! 快照領域類型
//!
//! 定義主序列K棒、輔助指標序列、面板記錄與快照文件的資料結構。

pub mod bar;
pub mod fields;
pub mod snapshot;

pub use bar::{AuxiliarySeries, Bar, InstrumentIdentity, Volume};
pub use fields::{FieldMap, FieldValue};
pub use snapshot::{PanelKey, Snapshot, SnapshotRecord};
