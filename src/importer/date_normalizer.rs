// ==========================================
// MCA 线索管理系统 - 日期标准化
// ==========================================
// 职责: 异构日期文本 → ISO 日期 (YYYY-MM-DD)
// 规则: 无法解析/有歧义时返回空串，调用方视为“字段缺失”
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

/// ISO 风格的直接解析格式（年份在前）
const DIRECT_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DIRECT_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

pub struct DateNormalizer;

impl DateNormalizer {
    /// 标准化日期文本
    ///
    /// # 返回
    /// - "YYYY-MM-DD": 解析成功
    /// - "": 空值或无法解析（不报错）
    pub fn normalize(&self, text: &str) -> String {
        self.parse(text)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// 解析为日期
    ///
    /// 1. 年份在前的日历格式直接解析
    /// 2. 否则按 `/` 或 `-` 拆成 3 段数字，依次为 日、月、年
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let value = text.trim();
        if value.is_empty() {
            return None;
        }

        if starts_with_year(value) {
            return parse_direct(value);
        }

        parse_day_month_year(value)
    }
}

/// 以 4 位年份开头（避免把 "01/02/03" 误读为公元 1 年）
fn starts_with_year(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && !bytes[4].is_ascii_digit()
}

fn parse_direct(value: &str) -> Option<NaiveDate> {
    DIRECT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            // RFC 3339 (带时区) 直接取日期部分
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            DIRECT_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_day_month_year(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split(['/', '-']).map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    // 年份必须为 4 位，两位年份存在世纪歧义
    if parts[2].len() != 4 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_passthrough() {
        assert_eq!(DateNormalizer.normalize("2024-05-15"), "2024-05-15");
        assert_eq!(DateNormalizer.normalize(" 2024/05/15 "), "2024-05-15");
    }

    #[test]
    fn test_day_month_year() {
        assert_eq!(DateNormalizer.normalize("15/05/2024"), "2024-05-15");
        assert_eq!(DateNormalizer.normalize("15-05-2024"), "2024-05-15");
        assert_eq!(DateNormalizer.normalize("5/6/2024"), "2024-06-05");
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert_eq!(DateNormalizer.normalize("2024/15/05"), "");
        assert_eq!(DateNormalizer.normalize("15/13/2024"), "");
        assert_eq!(DateNormalizer.normalize("32/01/2024"), "");
        assert_eq!(DateNormalizer.normalize("30/02/2024"), "");
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(DateNormalizer.normalize(""), "");
        assert_eq!(DateNormalizer.normalize("   "), "");
        assert_eq!(DateNormalizer.normalize("next monday"), "");
        assert_eq!(DateNormalizer.normalize("15/May/2024"), "");
        assert_eq!(DateNormalizer.normalize("15/05"), "");
    }

    #[test]
    fn test_two_digit_year_rejected() {
        assert_eq!(DateNormalizer.normalize("01/02/03"), "");
        assert_eq!(DateNormalizer.normalize("15/05/24"), "");
    }

    #[test]
    fn test_datetime_keeps_date_part() {
        assert_eq!(DateNormalizer.normalize("2025-09-25T10:30:00Z"), "2025-09-25");
        assert_eq!(DateNormalizer.normalize("2025-09-25 10:30:00"), "2025-09-25");
    }

    #[test]
    fn test_leap_day() {
        assert_eq!(DateNormalizer.normalize("29/02/2024"), "2024-02-29");
        assert_eq!(DateNormalizer.normalize("29/02/2023"), "");
    }
}
