use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// A single converted CSV field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// The record being built for one CSV line, keyed by target field name.
///
/// A field that is not present here is "absent": either the line was too
/// short for the mapping's column index, or the conversion degraded to
/// nothing (an unparsable date, for instance).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRow {
    fields: HashMap<String, FieldValue>,
}

impl DecodedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a field. `None` removes any previous value.
    pub fn set(&mut self, field: &str, value: Option<FieldValue>) {
        match value {
            Some(v) => {
                self.fields.insert(field.to_string(), v);
            }
            None => {
                self.fields.remove(field);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Numeric field, with absence mapped to the not-a-number sentinel
    pub fn number_or_nan(&self, field: &str) -> f64 {
        self.number(field).unwrap_or(f64::NAN)
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_boolean)
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        self.get(field).and_then(FieldValue::as_date)
    }

    /// Text field with empty strings treated as absent
    pub fn non_empty_text(&self, field: &str) -> Option<String> {
        self.text(field)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse a numeric field. Whitespace is trimmed and an empty field is zero;
/// anything else that does not parse yields `NaN`. Never fails.
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a calendar date, dropping any time component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d", // "2020-03-01"
        "%Y/%m/%d", // "2020/03/01"
    ];
    for format in &formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    None
}

/// Non-empty text is true, the way a truthiness check would treat it.
pub fn parse_boolean(raw: &str) -> bool {
    !raw.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("5"), 5.0);
        assert_eq!(parse_number(" 12.5 "), 12.5);
        assert_eq!(parse_number("-3"), -3.0);
        assert_eq!(parse_number(""), 0.0);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("1,5").is_nan());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        assert_eq!(parse_date("2020-03-01"), Some(expected));
        assert_eq!(parse_date("2020/03/01"), Some(expected));
        assert_eq!(parse_date("2020-03-01T18:30:00Z"), Some(expected));
        assert_eq!(parse_date("2020-03-01T18:30:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_boolean() {
        assert!(parse_boolean("yes"));
        assert!(parse_boolean("false"));
        assert!(parse_boolean(" "));
        assert!(!parse_boolean(""));
    }

    #[test]
    fn test_row_set_none_clears_field() {
        let mut row = DecodedRow::new();
        row.set("a", Some(FieldValue::Number(1.0)));
        assert_eq!(row.number("a"), Some(1.0));
        row.set("a", None);
        assert!(!row.contains("a"));
        assert!(row.number_or_nan("a").is_nan());
    }

    #[test]
    fn test_typed_accessors_reject_wrong_type() {
        let mut row = DecodedRow::new();
        row.set("name", Some(FieldValue::Text("Portugal".to_string())));
        assert_eq!(row.text("name"), Some("Portugal"));
        assert_eq!(row.number("name"), None);
        assert_eq!(row.date("name"), None);
    }
}
