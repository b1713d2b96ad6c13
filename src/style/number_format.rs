//! Number and date format translation
//!
//! Report formats use named patterns ("Currency", "Short Date") or Java-style
//! pattern letters. Spreadsheets use their own format codes, so both are mapped
//! here. Date values without a format get one inferred from the value itself.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};

pub const DATE_FORMAT: &str = "yyyy-mm-dd";
pub const TIME_FORMAT: &str = "hh:mm:ss";
pub const DATE_TIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Which part of a date/time value is meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    Date,
    Time,
    DateTime,
}

impl DateKind {
    pub fn default_format(&self) -> &'static str {
        match self {
            DateKind::Date => DATE_FORMAT,
            DateKind::Time => TIME_FORMAT,
            DateKind::DateTime => DATE_TIME_FORMAT,
        }
    }
}

/// Midnight means a date; a value on the epoch day in its own offset means a time
pub fn infer_date_kind(value: &DateTime<FixedOffset>) -> DateKind {
    let local = value.naive_local();
    if local.time().num_seconds_from_midnight() == 0 && local.time().nanosecond() == 0 {
        DateKind::Date
    } else if local.date() == epoch_date() {
        DateKind::Time
    } else {
        DateKind::DateTime
    }
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn excel_base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Spreadsheet serial number for a local date/time (1900 date system)
pub fn excel_serial(value: &NaiveDateTime) -> f64 {
    let days = (value.date() - excel_base_date()).num_days() as f64;
    let seconds = value.time().num_seconds_from_midnight() as f64
        + value.time().nanosecond() as f64 / 1_000_000_000.0;
    days + seconds / 86_400.0
}

/// Serial number for a data value, dropping the date part of time-only values
pub fn serial_for(value: &DateTime<FixedOffset>, kind: DateKind) -> f64 {
    let local = value.naive_local();
    match kind {
        DateKind::Time => {
            let seconds = local.time().num_seconds_from_midnight() as f64
                + local.time().nanosecond() as f64 / 1_000_000_000.0;
            seconds / 86_400.0
        }
        _ => excel_serial(&local),
    }
}

/// Whether a year is representable in the 1900 date system
pub fn in_serial_range(value: &DateTime<FixedOffset>) -> bool {
    let year = value.naive_local().year();
    (1900..=9999).contains(&year)
}

/// Translate a report number pattern into a spreadsheet format code
pub fn translate_number_format(pattern: &str) -> Option<String> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unformatted") {
        return None;
    }
    let code = match trimmed.to_ascii_lowercase().as_str() {
        "general number" | "general" => "General".to_string(),
        "fixed" => "0.00".to_string(),
        "standard" | "currency" => "#,##0.00".to_string(),
        "percent" => "0.00%".to_string(),
        "scientific" => "0.00E+00".to_string(),
        _ => {
            // Java decimal patterns: `E0` exponent needs an explicit sign, quotes pass through
            let mut code = trimmed.replace("E0", "E+0");
            if let Some(idx) = code.find('{') {
                code.truncate(idx);
            }
            code.trim().to_string()
        }
    };
    Some(code)
}

/// Translate a report date/time pattern into a spreadsheet format code
pub fn translate_date_format(pattern: &str) -> Option<String> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unformatted") {
        return None;
    }
    let named = match trimmed.to_ascii_lowercase().as_str() {
        "general date" => Some(DATE_TIME_FORMAT),
        "short date" => Some("m/d/yy"),
        "medium date" => Some("dd-mmm-yy"),
        "long date" => Some("dddd, mmmm dd, yyyy"),
        "short time" => Some("hh:mm"),
        "medium time" => Some("h:mm AM/PM"),
        "long time" => Some("hh:mm:ss"),
        _ => None,
    };
    if let Some(code) = named {
        return Some(code.to_string());
    }
    Some(translate_java_date_pattern(trimmed))
}

fn translate_java_date_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        match c {
            '\'' => {
                if run >= 2 {
                    out.push_str("\\'");
                    i += 2;
                    continue;
                }
                // quoted literal
                let mut j = i + 1;
                let mut literal = String::new();
                while j < chars.len() && chars[j] != '\'' {
                    literal.push(chars[j]);
                    j += 1;
                }
                out.push('"');
                out.push_str(&literal);
                out.push('"');
                i = j + 1;
                continue;
            }
            'y' | 'd' | 's' => push_run(&mut out, c, run),
            'M' => push_run(&mut out, 'm', run),
            'm' => push_run(&mut out, 'm', run),
            'H' | 'h' | 'k' | 'K' => push_run(&mut out, 'h', run),
            'a' => out.push_str("AM/PM"),
            'E' => out.push_str(if run >= 4 { "dddd" } else { "ddd" }),
            'S' => push_run(&mut out, '0', run),
            'z' | 'Z' | 'X' => {}
            other => {
                for _ in 0..run {
                    out.push(other);
                }
            }
        }
        i += run;
    }
    if pattern.contains('S') && !out.contains(".0") {
        // milliseconds only display after a seconds field and a dot
        out = out.replace("ss0", "ss.0");
    }
    out.trim().to_string()
}

fn push_run(out: &mut String, c: char, run: usize) {
    for _ in 0..run {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(offset_hours: i32, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_infer_date_kind() {
        assert_eq!(infer_date_kind(&at(0, 2024, 3, 1, 0, 0, 0)), DateKind::Date);
        assert_eq!(infer_date_kind(&at(0, 1970, 1, 1, 13, 30, 0)), DateKind::Time);
        assert_eq!(infer_date_kind(&at(2, 1970, 1, 1, 1, 0, 0)), DateKind::Time);
        assert_eq!(
            infer_date_kind(&at(0, 2024, 3, 1, 9, 15, 0)),
            DateKind::DateTime
        );
    }

    #[test]
    fn test_excel_serial() {
        let value = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(excel_serial(&value), 45292.5);

        let time = at(0, 1970, 1, 1, 6, 0, 0);
        assert_eq!(serial_for(&time, DateKind::Time), 0.25);
        assert!(in_serial_range(&time));
    }

    #[test]
    fn test_translate_number_format() {
        assert_eq!(translate_number_format("Currency").as_deref(), Some("#,##0.00"));
        assert_eq!(translate_number_format("Percent").as_deref(), Some("0.00%"));
        assert_eq!(translate_number_format("0.###E0").as_deref(), Some("0.###E+0"));
        assert_eq!(translate_number_format("#,##0{RoundingMode=HALF_UP}").as_deref(), Some("#,##0"));
        assert_eq!(translate_number_format("Unformatted"), None);
    }

    #[test]
    fn test_translate_date_format() {
        assert_eq!(translate_date_format("Short Date").as_deref(), Some("m/d/yy"));
        assert_eq!(
            translate_date_format("dd/MM/yyyy HH:mm").as_deref(),
            Some("dd/mm/yyyy hh:mm")
        );
        assert_eq!(
            translate_date_format("h:mm a").as_deref(),
            Some("h:mm AM/PM")
        );
        assert_eq!(
            translate_date_format("EEEE 'the' d").as_deref(),
            Some("dddd \"the\" d")
        );
        assert_eq!(translate_date_format("HH:mm:ss.SSS").as_deref(), Some("hh:mm:ss.000"));
    }
}
