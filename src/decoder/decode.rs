use csv::ReaderBuilder;
use std::marker::PhantomData;
use tracing::{debug, trace};

use super::profile::{ColumnMap, RawCsvProfile, ValueType};
use super::value::{parse_boolean, parse_date, parse_number, DecodedRow, FieldValue};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;

/// Source name reported for text decoded without one
const INLINE_SOURCE: &str = "inline";

/// Builds a typed record from a decoded CSV line.
///
/// Conversion never fails: missing or degraded fields are expected to map
/// onto absent/sentinel values in the target type.
pub trait FromDecodedRow: Sized {
    fn from_row(row: DecodedRow) -> Self;
}

impl FromDecodedRow for DecodedRow {
    fn from_row(row: DecodedRow) -> Self {
        row
    }
}

/// Profile-driven CSV decoder producing records of type `T`.
///
/// Quoting is disabled, so a `"` is an ordinary character and values
/// containing commas cannot be represented. Lines may be shorter than the
/// profile needs; blank lines are skipped.
#[derive(Debug, Clone)]
pub struct CsvDecoder<T> {
    profile: RawCsvProfile,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromDecodedRow> CsvDecoder<T> {
    pub fn new(profile: RawCsvProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            _marker: PhantomData,
        })
    }

    pub fn profile(&self) -> &RawCsvProfile {
        &self.profile
    }

    /// Decode raw bytes fetched from `source_name`. Bytes that are not
    /// UTF-8 text fail the whole source.
    pub fn decode_bytes(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<T>> {
        let text = std::str::from_utf8(bytes).map_err(|e| PipelineError::Decode {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let rows = self.read_rows(source_name, text)?;
        Ok(rows.into_iter().map(T::from_row).collect())
    }

    /// Decode text into records, preserving line order.
    pub fn decode(&self, raw: &str) -> Result<Vec<T>> {
        Ok(self.decode_rows(raw)?.into_iter().map(T::from_row).collect())
    }

    /// Decode into untyped rows
    pub fn decode_rows(&self, raw: &str) -> Result<Vec<DecodedRow>> {
        self.read_rows(INLINE_SOURCE, raw)
    }

    fn read_rows(&self, source_name: &str, raw: &str) -> Result<Vec<DecodedRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let skip = usize::from(self.profile.skip_header_line);
        let mut rows = Vec::new();
        let mut degraded = 0usize;

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| PipelineError::Decode {
                source_name: source_name.to_string(),
                reason: format!("record {}: {}", index + 1, e),
            })?;
            if index < skip {
                continue;
            }
            let fields: Vec<&str> = record.iter().collect();
            let (row, bad) = decode_line(&self.profile.maps, &fields);
            degraded += bad;
            rows.push(row);
        }

        debug!(
            source = source_name,
            "CsvDecoder: decoded lines={} degraded_fields={} header_skipped={}",
            rows.len(),
            degraded,
            skip == 1
        );
        metrics::decode::lines_decoded(rows.len());
        metrics::decode::fields_degraded(degraded);
        Ok(rows)
    }
}

/// Apply every mapping in order to one line. Returns the row and the number
/// of fields that degraded to a sentinel or absent value.
fn decode_line(maps: &[ColumnMap], fields: &[&str]) -> (DecodedRow, usize) {
    let mut row = DecodedRow::new();
    let mut degraded = 0;

    for map in maps {
        let raw = fields.get(map.index).copied();
        let value = convert(raw, map.value_type);
        if raw.is_some() && is_degraded(&value) {
            trace!(field = %map.field, raw = ?raw, "field conversion degraded");
            degraded += 1;
        }
        row.set(&map.field, value);

        if let Some(formatter) = &map.formatter {
            let formatted = formatter.format(&row, map, fields);
            row.set(&map.field, formatted);
        }
    }

    (row, degraded)
}

/// Base conversion of a single raw field. A column missing from the line is
/// `false` for booleans and absent for every other type.
pub fn convert(raw: Option<&str>, value_type: ValueType) -> Option<FieldValue> {
    let Some(raw) = raw else {
        return (value_type == ValueType::Boolean).then_some(FieldValue::Boolean(false));
    };
    match value_type {
        ValueType::Text => Some(FieldValue::Text(raw.to_string())),
        ValueType::Number => Some(FieldValue::Number(parse_number(raw))),
        ValueType::Boolean => Some(FieldValue::Boolean(parse_boolean(raw))),
        ValueType::Date => parse_date(raw).map(FieldValue::Date),
    }
}

fn is_degraded(value: &Option<FieldValue>) -> bool {
    match value {
        None => true,
        Some(FieldValue::Number(n)) => n.is_nan(),
        Some(_) => false,
    }
}
