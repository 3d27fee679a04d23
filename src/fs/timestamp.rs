//! 存储文件中的时间格式
//!
//! 写入: `YYYY-MM-DDTHH:MM:SS[.fff]`（秒的小数部分为 0 时省略）
//! 读取: ISO-8601、`YYYY-MM-DD HH:MM:SS`、`YYYY-MM-DD HH:MM`

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const READ_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

pub fn format(value: &NaiveDateTime) -> String {
    value.format(WRITE_FORMAT).to_string()
}

pub fn parse(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    READ_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

pub mod option {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&super::format(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid timestamp '{}'", raw))
            }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parse_accepts_all_read_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();

        assert_eq!(parse("2025-03-01T18:30:00"), Some(expected));
        assert_eq!(parse("2025-03-01 18:30:00"), Some(expected));
        assert_eq!(parse("2025-03-01 18:30"), Some(expected));
        assert_eq!(parse("not a time"), None);
    }

    #[test]
    fn test_parse_keeps_fractional_seconds() {
        // 旧版本用 isoformat() 写入，带微秒
        let parsed = parse("2025-03-01T18:30:00.123456").unwrap();
        assert_eq!(parsed.nanosecond(), 123_456_000);
        assert_eq!(parse(&format(&parsed)), Some(parsed));
    }

    #[test]
    fn test_format_omits_zero_fraction() {
        let value = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        assert_eq!(format(&value), "2025-03-01T09:05:07");
    }
}
