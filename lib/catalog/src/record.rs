//! Catalog record definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One recommendable assessment.
///
/// Records are only built through the validating loader or [`CatalogRecord::new`]
/// and never change once they are in a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Insertion-ordered and de-duplicated
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub recommended_roles: Vec<String>,
}

impl CatalogRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            category: String::new(),
            duration_minutes: 0,
            recommended_roles: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommended_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// The text submitted to the embedder for this record.
    ///
    /// Fixed rule, fields in this order:
    ///
    /// ```text
    /// {name}. {description} Categories: {category}. Tags: {t1, t2}. Recommended for: {r1, r2}.
    /// ```
    ///
    /// Changing it changes every score, so it is versioned with the index.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}. {} Categories: {}. Tags: {}. Recommended for: {}.",
            self.name,
            self.description,
            self.category,
            self.tags.join(", "),
            self.recommended_roles.join(", "),
        )
    }

    /// Trim text fields, drop blank list entries and duplicate tags, then check
    /// the required fields.
    pub(crate) fn normalized(mut self) -> std::result::Result<Self, RejectReason> {
        self.id = self.id.trim().to_string();
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.category = self.category.trim().to_string();

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|seen| seen == tag) {
                tags.push(tag.to_string());
            }
        }
        self.tags = tags;

        self.recommended_roles = self
            .recommended_roles
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        for (field, value) in [("id", &self.id), ("name", &self.name), ("description", &self.description)] {
            if value.is_empty() {
                return Err(RejectReason::MissingField { field });
            }
        }

        Ok(self)
    }
}

/// Why a single record was excluded from the catalog
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("required field '{field}' is missing or empty")]
    MissingField { field: &'static str },

    #[error("duration_minutes must be non-negative, got {value}")]
    NegativeDuration { value: i64 },

    #[error("duration_minutes must be a whole number of minutes, got {value}")]
    InvalidDuration { value: String },

    #[error("duplicate id")]
    DuplicateId,

    #[error("malformed record: {message}")]
    Malformed { message: String },
}
