//! 快照文件編碼器
//!
//! 手寫的 JSON 寫入器，輸出格式與既有接收端相容：
//! - 頂層每個日期一行：`{\n  "2024-01-02": {...},\n  ...\n}`，空快照輸出 `{}`
//! - 巢狀物件：`{"key": value,"key": value}`，鍵維持插入順序
//! - NaN 與無窮大輸出 `null`，浮點數使用不受地區設定影響的最短十進位表示

use crate::domain_types::{FieldMap, FieldValue, Snapshot};

/// 編碼完整快照
pub fn encode_snapshot(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return "{}".to_string();
    }

    let mut out = String::with_capacity(snapshot.len() * 512);
    out.push_str("{\n");
    for (i, (date, record)) in snapshot.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str("  ");
        write_string(&mut out, date);
        out.push_str(": ");
        write_object(&mut out, &record.to_field_map());
    }
    out.push_str("\n}");
    out
}

/// 編碼單一巢狀物件
pub fn encode_object(map: &FieldMap) -> String {
    let mut out = String::new();
    write_object(&mut out, map);
    out
}

fn write_object(out: &mut String, map: &FieldMap) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

fn write_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Null => out.push_str("null"),
        FieldValue::Float(v) => write_f64(out, *v),
        FieldValue::Integer(v) => out.push_str(itoa::Buffer::new().format(*v)),
        FieldValue::Text(s) => write_string(out, s),
        FieldValue::Object(map) => write_object(out, map),
    }
}

fn write_f64(out: &mut String, value: f64) {
    if !value.is_finite() {
        out.push_str("null");
        return;
    }
    // f64 的 Display 為最短可還原表示，且不使用指數與千分位
    out.push_str(&value.to_string());
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// 寫入字串：引號與反斜線前加反斜線，控制字元以 \u00XX 表示
fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => {
                out.push_str("\\u00");
                out.push(HEX_DIGITS[(c as usize) >> 4] as char);
                out.push(HEX_DIGITS[(c as usize) & 0xf] as char);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
