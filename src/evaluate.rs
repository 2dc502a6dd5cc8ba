//! Built-in evaluation run over sample job queries.

use serde::Serialize;
use shortlist_engine::{EngineError, Recommendation, Recommender};

/// Job queries spanning the roles a typical assessment catalog serves
pub const SAMPLE_QUERIES: &[&str] = &[
    "Data Scientist with Python and machine learning experience",
    "Sales Manager with customer relationship skills",
    "Software Engineer proficient in Java and cloud technologies",
    "Financial Analyst with Excel and accounting knowledge",
    "Project Manager with Agile methodology experience",
    "Customer Service Representative with conflict resolution skills",
    "Human Resources Specialist with recruitment experience",
    "Marketing Manager with digital marketing and social media expertise",
    "Mechanical Engineer with CAD design skills",
    "Executive Leadership position requiring strategic decision making",
];

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub recommendations: Vec<Recommendation>,
}

/// Aggregate over every returned score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32,
}

impl ScoreSummary {
    /// `None` when there are no scores.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(f32::total_cmp);
        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            count: n,
            mean: sorted.iter().sum::<f32>() / n as f32,
            min: sorted[0],
            max: sorted[n - 1],
            median,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub top_k: usize,
    pub outcomes: Vec<QueryOutcome>,
    pub summary: Option<ScoreSummary>,
}

pub fn run(recommender: &Recommender, queries: &[&str], top_k: usize) -> Result<Evaluation, EngineError> {
    // One snapshot for the whole run so a concurrent reload cannot mix catalogs.
    let snapshot = recommender.snapshot();
    let outcomes = queries
        .iter()
        .map(|query| {
            snapshot
                .recommend(recommender.embedder(), query, top_k)
                .map(|recommendations| QueryOutcome {
                    query: query.to_string(),
                    recommendations,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let scores: Vec<f32> = outcomes
        .iter()
        .flat_map(|o| o.recommendations.iter().map(|r| r.score))
        .collect();

    Ok(Evaluation {
        top_k,
        summary: ScoreSummary::from_scores(&scores),
        outcomes,
    })
}
