// time_utils.rs
//
// 提供快照使用的日期工具函數：
// 1. 以「第一個四天週、週一為一週開始」規則計算年內週數
// 2. 產生快照 Week 欄位與日期鍵的字串格式

use chrono::{Datelike, Duration, NaiveDate};

/// 一週的起始日（週一），以週日為 0 的編號表示
const FIRST_DAY_OF_WEEK: i64 = 1;

/// 第一週至少需要包含的天數
const MIN_DAYS_IN_FIRST_WEEK: i64 = 4;

/// 計算日期在其所屬年份中的週數
///
/// 第一週是新年中第一個至少包含四天的週，週一為一週開始。
/// 在第一週之前的日期歸入前一年的最後一週（52 或 53）；
/// 年底的日期不會被歸入下一年的第一週，因此 12 月底可能得到 53。
pub fn week_of_year(date: NaiveDate) -> u32 {
    let day_of_year = date.ordinal0() as i64;
    let day_for_jan1 = date.weekday().num_days_from_sunday() as i64 - (day_of_year % 7);

    let mut offset = (FIRST_DAY_OF_WEEK - day_for_jan1 + 14) % 7;
    if offset != 0 && offset >= MIN_DAYS_IN_FIRST_WEEK {
        offset -= 7;
    }

    let day = day_of_year - offset;
    if day >= 0 {
        return (day / 7 + 1) as u32;
    }

    // 屬於前一年的最後一週，改以前一年的 12 月 31 日計算
    week_of_year(date - Duration::days(day_of_year + 1))
}

/// 快照 Week 欄位：`{週數}/{日曆年份}`
pub fn week_label(date: NaiveDate) -> String {
    format!("{}/{}", week_of_year(date), date.year())
}

/// 快照日期鍵 (YYYY-MM-DD)
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
