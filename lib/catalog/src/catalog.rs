//! The catalog store and its validating loader.

use crate::record::{CatalogRecord, RejectReason};
use crate::{CatalogError, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// A record that did not make it into the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Zero-based position in the source array
    pub position: usize,
    /// The record's id, when one could be read
    pub id: Option<String>,
    pub reason: RejectReason,
}

/// Outcome of a catalog load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: Vec<Rejection>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Ids of rejected records that had one
    pub fn rejected_ids(&self) -> Vec<&str> {
        self.rejected.iter().filter_map(|r| r.id.as_deref()).collect()
    }
}

/// Loose shape of a record as it appears in the source file
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    category: Option<String>,
    duration_minutes: Option<Value>,
    recommended_roles: Option<Vec<String>>,
}

impl RawRecord {
    fn into_record(self) -> std::result::Result<CatalogRecord, RejectReason> {
        let duration_minutes = parse_duration(self.duration_minutes.as_ref())?;
        CatalogRecord {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            duration_minutes,
            recommended_roles: self.recommended_roles.unwrap_or_default(),
        }
        .normalized()
    }
}

/// Missing or null means zero minutes.
fn parse_duration(value: Option<&Value>) -> std::result::Result<u32, RejectReason> {
    let number = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n,
        Some(other) => {
            return Err(RejectReason::InvalidDuration {
                value: other.to_string(),
            })
        }
    };

    if let Some(minutes) = number.as_u64() {
        return u32::try_from(minutes).map_err(|_| RejectReason::InvalidDuration {
            value: number.to_string(),
        });
    }
    if let Some(negative) = number.as_i64() {
        return Err(RejectReason::NegativeDuration { value: negative });
    }
    Err(RejectReason::InvalidDuration {
        value: number.to_string(),
    })
}

/// Immutable, ordered collection of validated records.
///
/// Position in the catalog is the insertion order of the source and is the
/// tie-breaker for equal similarity scores downstream.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    positions: AHashMap<String, usize>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and validate a catalog file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport)> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (catalog, report) = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            "Loaded catalog {:?}: {} records, {} rejected",
            path,
            report.loaded,
            report.rejected.len()
        );
        Ok((catalog, report))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<(Self, LoadReport)> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    pub fn from_json_str(json: &str) -> Result<(Self, LoadReport)> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// The top-level value must be an array; anything else is a setup error.
    pub fn from_value(value: Value) -> Result<(Self, LoadReport)> {
        match value {
            Value::Array(items) => Ok(Self::from_values(items)),
            Value::Object(_) => Err(CatalogError::NotAnArray("an object")),
            Value::String(_) => Err(CatalogError::NotAnArray("a string")),
            Value::Number(_) => Err(CatalogError::NotAnArray("a number")),
            Value::Bool(_) => Err(CatalogError::NotAnArray("a boolean")),
            Value::Null => Err(CatalogError::NotAnArray("null")),
        }
    }

    /// Validate raw JSON records. Invalid ones are skipped and reported.
    pub fn from_values(items: Vec<Value>) -> (Self, LoadReport) {
        let mut builder = CatalogBuilder::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            let id = item.get("id").and_then(Value::as_str).map(|s| s.trim().to_string());
            let record = serde_json::from_value::<RawRecord>(item)
                .map_err(|e| RejectReason::Malformed { message: e.to_string() })
                .and_then(RawRecord::into_record);
            builder.push(position, id, record);
        }
        builder.finish()
    }

    /// Validate already-typed records with the same rules as the file loader.
    pub fn from_records<I>(records: I) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = CatalogRecord>,
    {
        let mut builder = CatalogBuilder::with_capacity(0);
        for (position, record) in records.into_iter().enumerate() {
            let id = Some(record.id.trim().to_string());
            builder.push(position, id, record.normalized());
        }
        builder.finish()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in catalog order
    #[inline]
    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogRecord> {
        self.positions.get(id).map(|&pos| &self.records[pos])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    #[inline]
    pub fn record_at(&self, position: usize) -> Option<&CatalogRecord> {
        self.records.get(position)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogRecord;
    type IntoIter = std::slice::Iter<'a, CatalogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

struct CatalogBuilder {
    catalog: Catalog,
    rejected: Vec<Rejection>,
}

impl CatalogBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            catalog: Catalog {
                records: Vec::with_capacity(capacity),
                positions: AHashMap::with_capacity(capacity),
            },
            rejected: Vec::new(),
        }
    }

    fn push(
        &mut self,
        position: usize,
        id: Option<String>,
        record: std::result::Result<CatalogRecord, RejectReason>,
    ) {
        let id = id.filter(|id| !id.is_empty());
        let outcome = record.and_then(|record| {
            if self.catalog.positions.contains_key(&record.id) {
                Err(RejectReason::DuplicateId)
            } else {
                Ok(record)
            }
        });

        match outcome {
            Ok(record) => {
                let pos = self.catalog.records.len();
                self.catalog.positions.insert(record.id.clone(), pos);
                self.catalog.records.push(record);
            }
            Err(reason) => {
                warn!(position, id = ?id, "Rejected catalog record: {}", reason);
                self.rejected.push(Rejection { position, id, reason });
            }
        }
    }

    fn finish(self) -> (Catalog, LoadReport) {
        let report = LoadReport {
            loaded: self.catalog.len(),
            rejected: self.rejected,
        };
        (self.catalog, report)
    }
}
