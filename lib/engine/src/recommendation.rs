//! Result formatting

use crate::query::SearchResult;
use serde::Serialize;
use shortlist_catalog::CatalogRecord;

/// A search hit joined with the catalog fields a caller shows to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub duration_minutes: u32,
    pub recommended_roles: Vec<String>,
    pub tags: Vec<String>,
    pub score: f32,
    pub rank: usize,
}

impl Recommendation {
    pub fn from_parts(record: &CatalogRecord, hit: &SearchResult) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            duration_minutes: record.duration_minutes,
            recommended_roles: record.recommended_roles.clone(),
            tags: record.tags.clone(),
            score: hit.score,
            rank: hit.rank,
        }
    }
}
