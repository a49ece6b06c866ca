use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::value::{DecodedRow, FieldValue};
use crate::error::{PipelineError, Result};

/// Built-in conversion applied to a raw field before any custom formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Text,
    Number,
    Boolean,
    Date,
}

/// Post-processing step for one column mapping.
///
/// Called after the base conversion with the row built so far, the mapping
/// itself and the raw fields of the line. The returned value replaces the
/// field (`None` makes it absent). The row holds the base conversion of the
/// current mapping plus every mapping listed before it; formatters must only
/// rely on those.
pub trait FieldFormatter: Send + Sync {
    fn format(&self, row: &DecodedRow, map: &ColumnMap, fields: &[&str]) -> Option<FieldValue>;
}

impl<F> FieldFormatter for F
where
    F: Fn(&DecodedRow, &ColumnMap, &[&str]) -> Option<FieldValue> + Send + Sync,
{
    fn format(&self, row: &DecodedRow, map: &ColumnMap, fields: &[&str]) -> Option<FieldValue> {
        self(row, map, fields)
    }
}

/// Maps one source column onto one target field
#[derive(Clone)]
pub struct ColumnMap {
    pub index: usize,
    pub field: String,
    pub value_type: ValueType,
    pub formatter: Option<Arc<dyn FieldFormatter>>,
}

impl ColumnMap {
    pub fn new(index: usize, field: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            index,
            field: field.into(),
            value_type,
            formatter: None,
        }
    }

    pub fn text(index: usize, field: impl Into<String>) -> Self {
        Self::new(index, field, ValueType::Text)
    }

    pub fn number(index: usize, field: impl Into<String>) -> Self {
        Self::new(index, field, ValueType::Number)
    }

    pub fn boolean(index: usize, field: impl Into<String>) -> Self {
        Self::new(index, field, ValueType::Boolean)
    }

    pub fn date(index: usize, field: impl Into<String>) -> Self {
        Self::new(index, field, ValueType::Date)
    }

    pub fn with_formatter(mut self, formatter: impl FieldFormatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Closure form of [`ColumnMap::with_formatter`]
    pub fn with_format_fn<F>(self, f: F) -> Self
    where
        F: Fn(&DecodedRow, &ColumnMap, &[&str]) -> Option<FieldValue> + Send + Sync + 'static,
    {
        self.with_formatter(f)
    }
}

impl fmt::Debug for ColumnMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMap")
            .field("index", &self.index)
            .field("field", &self.field)
            .field("value_type", &self.value_type)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Declarative description of one CSV format.
///
/// Mappings are applied strictly in the order they are listed.
#[derive(Debug, Clone, Default)]
pub struct RawCsvProfile {
    pub skip_header_line: bool,
    pub maps: Vec<ColumnMap>,
}

impl RawCsvProfile {
    pub fn new(skip_header_line: bool) -> Self {
        Self {
            skip_header_line,
            maps: Vec::new(),
        }
    }

    pub fn with_column(mut self, map: ColumnMap) -> Self {
        self.maps.push(map);
        self
    }

    /// Highest source column index any mapping reads
    pub fn max_index(&self) -> Option<usize> {
        self.maps.iter().map(|m| m.index).max()
    }

    /// Target field names must be unique within a profile.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for map in &self.maps {
            if !seen.insert(map.field.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate target field '{}' in CSV profile",
                    map.field
                )));
            }
        }
        Ok(())
    }
}
