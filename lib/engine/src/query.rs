//! Query engine
//!
//! Scores a query vector against index entries with cosine similarity and
//! keeps the `k` best. Order is score descending with catalog position as the
//! tie-break, so equal scores always come back in the same order.

use crate::config::SearchStrategy;
use crate::index::Index;
use crate::Result;
use ordered_float::OrderedFloat;
use serde::Serialize;
use shortlist_core::{Embedder, Error, Vector};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub record_id: String,
    pub score: f32,
    /// 1-based, contiguous
    pub rank: usize,
    /// Catalog position of the record
    #[serde(skip)]
    pub position: usize,
}

/// Convert a caller-supplied count to a usable `k`.
///
/// Zero and negative values are rejected. Values larger than the catalog are
/// allowed and simply return every entry.
pub fn validate_top_k(k: i64) -> shortlist_core::Result<usize> {
    if k <= 0 {
        return Err(Error::InvalidTopK(k));
    }
    usize::try_from(k).map_err(|_| Error::InvalidTopK(k))
}

/// Embed `query` and return the top `k` entries of `index`.
pub fn search(index: &Index, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<SearchResult>> {
    if k == 0 {
        return Err(Error::InvalidTopK(0).into());
    }
    index.check_compatible(embedder)?;

    let vector = embedder.embed(query)?;
    search_vector(index, &vector, k)
}

/// Top `k` entries of `index` for an already embedded query.
pub fn search_vector(index: &Index, query: &Vector, k: usize) -> Result<Vec<SearchResult>> {
    if k == 0 {
        return Err(Error::InvalidTopK(0).into());
    }
    if query.dim() != index.dimension() {
        return Err(Error::InvalidDimension {
            expected: index.dimension(),
            actual: query.dim(),
        }
        .into());
    }
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let scored = match (index.strategy(), index.graph()) {
        (SearchStrategy::Hnsw { ef_search, .. }, Some(graph)) if (*ef_search).max(k) < index.len() => {
            let candidates = graph.search(query, k, *ef_search);
            debug!("HNSW proposed {} candidates of {}", candidates.len(), index.len());
            // Nodes pruned out of every neighbour list are unreachable, so the
            // graph can come back short on heavily tied data.
            if candidates.len() < k {
                debug!("HNSW candidates short of k = {}, scanning all entries", k);
                exact_top_k(index, query, k)
            } else {
                top_k(candidates.into_iter().map(|position| score(index, query, position)), k)
            }
        }
        _ => exact_top_k(index, query, k),
    };

    Ok(rank(index, scored))
}

fn exact_top_k(index: &Index, query: &Vector, k: usize) -> Vec<(usize, f32)> {
    top_k((0..index.len()).map(|position| score(index, query, position)), k)
}

#[inline]
fn score(index: &Index, query: &Vector, position: usize) -> (usize, f32) {
    let similarity = index
        .entry(position)
        .map(|entry| query.cosine_similarity(&entry.embedding))
        .unwrap_or(shortlist_core::MIN_SIMILARITY);
    (position, similarity)
}

/// Keep the `k` best `(position, score)` pairs, best first.
fn top_k<I>(scored: I, k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    // Min-heap on (score, Reverse(position)): the root is the entry that
    // loses first, i.e. the lowest score, or the later position on a tie.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<usize>)>> = BinaryHeap::with_capacity(k + 1);

    for (position, score) in scored {
        let candidate = Reverse((OrderedFloat(score), Reverse(position)));
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    let mut best: Vec<(usize, f32)> = heap
        .into_iter()
        .map(|Reverse((score, Reverse(position)))| (position, score.0))
        .collect();
    best.sort_by(|a, b| OrderedFloat(b.1).cmp(&OrderedFloat(a.1)).then(a.0.cmp(&b.0)));
    best
}

fn rank(index: &Index, scored: Vec<(usize, f32)>) -> Vec<SearchResult> {
    scored
        .into_iter()
        .enumerate()
        .filter_map(|(i, (position, score))| {
            index.entry(position).map(|entry| SearchResult {
                record_id: entry.record_id.clone(),
                score,
                rank: i + 1,
                position,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shortlist_catalog::{Catalog, CatalogRecord};
    use shortlist_core::{HashEmbedder, HashEmbedderConfig};

    /// Looks up a fixed vector per text; unknown text embeds to zeros.
    struct TableEmbedder {
        table: Vec<(&'static str, Vec<f32>)>,
    }

    impl Embedder for TableEmbedder {
        fn embed(&self, text: &str) -> shortlist_core::Result<Vector> {
            Ok(self
                .table
                .iter()
                .find(|(key, _)| text.starts_with(key))
                .map(|(_, v)| Vector::from_slice(v))
                .unwrap_or_else(|| Vector::zeros(2)))
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "table"
        }
    }

    fn table_index(names: &[&'static str], table: Vec<(&'static str, Vec<f32>)>) -> (Index, TableEmbedder) {
        let records = names
            .iter()
            .enumerate()
            .map(|(i, name)| CatalogRecord::new(format!("r{i}"), *name, "d"));
        let (catalog, _) = Catalog::from_records(records);
        let embedder = TableEmbedder { table };
        let index = Index::build(&catalog, &embedder, &SearchStrategy::Exact).unwrap();
        (index, embedder)
    }

    fn hash_catalog(n: usize) -> Catalog {
        let words = [
            "verbal", "numerical", "reasoning", "sales", "java", "leadership", "mechanical", "customer", "finance",
            "agile", "cloud", "personality",
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let records = (0..n).map(|i| {
            let description: Vec<&str> = (0..6).map(|_| words[rng.random_range(0..words.len())]).collect();
            CatalogRecord::new(format!("a{i}"), format!("Assessment {i}"), description.join(" "))
        });
        Catalog::from_records(records).0
    }

    fn embedder() -> HashEmbedder {
        HashEmbedder::new(HashEmbedderConfig::default()).unwrap()
    }

    #[test]
    fn test_validate_top_k() {
        assert_eq!(validate_top_k(3).unwrap(), 3);
        assert_eq!(validate_top_k(0), Err(Error::InvalidTopK(0)));
        assert_eq!(validate_top_k(-1), Err(Error::InvalidTopK(-1)));
    }

    #[test]
    fn test_exact_order_and_ranks() {
        let (index, embedder) = table_index(
            &["low", "high", "mid"],
            vec![
                ("query", vec![1.0, 0.0]),
                ("low", vec![0.0, 1.0]),
                ("high", vec![1.0, 0.1]),
                ("mid", vec![1.0, 1.0]),
            ],
        );

        let results = search(&index, &embedder, "query", 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r0"]);
        assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.score)));
    }

    #[test]
    fn test_ties_break_by_catalog_position() {
        let (index, embedder) = table_index(
            &["same", "same", "same", "same"],
            vec![("query", vec![1.0, 0.0]), ("same", vec![1.0, 1.0])],
        );

        let results = search(&index, &embedder, "query", 2).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r1"]);
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn test_degenerate_entries_sort_last() {
        let (index, embedder) = table_index(
            &["blank", "opposite", "near"],
            vec![
                ("query", vec![1.0, 0.0]),
                ("opposite", vec![-1.0, 0.1]),
                ("near", vec![1.0, 0.0]),
            ],
        );

        let results = search(&index, &embedder, "query", 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
        // "blank" has no direction, so it loses even to a near-opposite vector.
        assert_eq!(ids, vec!["r2", "r1", "r0"]);
        assert_eq!(results[2].score, shortlist_core::MIN_SIMILARITY);
    }

    #[test]
    fn test_empty_query_scores_everything_minimum() {
        let (index, embedder) = table_index(&["a", "b"], vec![("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]);
        let results = search(&index, &embedder, "", 5).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == shortlist_core::MIN_SIMILARITY));
        assert_eq!(results[0].record_id, "r0");
    }

    #[test]
    fn test_k_larger_than_catalog() {
        let catalog = hash_catalog(7);
        let index = Index::build(&catalog, &embedder(), &SearchStrategy::Exact).unwrap();
        let results = search(&index, &embedder(), "sales leadership", 50).unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(results.last().unwrap().rank, 7);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = Index::build(&Catalog::empty(), &embedder(), &SearchStrategy::Exact).unwrap();
        assert!(search(&index, &embedder(), "anything", 3).unwrap().is_empty());
    }

    #[test]
    fn test_zero_k_rejected() {
        let index = Index::build(&hash_catalog(3), &embedder(), &SearchStrategy::Exact).unwrap();
        let err = search(&index, &embedder(), "java", 0).unwrap_err();
        assert!(matches!(err, EngineError::Core(Error::InvalidTopK(0))));
        assert!(err.is_query_error());
    }

    #[test]
    fn test_mismatched_embedder_rejected() {
        let index = Index::build(&hash_catalog(3), &embedder(), &SearchStrategy::Exact).unwrap();
        let other = HashEmbedder::builder().dimension(32).build().unwrap();
        let err = search(&index, &other, "java", 2).unwrap_err();
        assert!(matches!(err, EngineError::Core(Error::EmbedderMismatch { .. })));

        let err = search_vector(&index, &Vector::zeros(32), 2).unwrap_err();
        assert!(matches!(err, EngineError::Core(Error::InvalidDimension { .. })));
    }

    #[test]
    fn test_matches_brute_force() {
        let catalog = hash_catalog(200);
        let e = embedder();
        let index = Index::build(&catalog, &e, &SearchStrategy::Exact).unwrap();
        let query = e.embed("numerical reasoning for finance").unwrap();

        let mut expected: Vec<(usize, f32)> = index
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, query.cosine_similarity(&entry.embedding)))
            .collect();
        expected.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let results = search_vector(&index, &query, 10).unwrap();
        let got: Vec<usize> = results.iter().map(|r| r.position).collect();
        let want: Vec<usize> = expected.iter().take(10).map(|(i, _)| *i).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_hnsw_with_wide_ef_equals_exact() {
        let catalog = hash_catalog(60);
        let e = embedder();
        let exact = Index::build(&catalog, &e, &SearchStrategy::Exact).unwrap();
        let approx = Index::build(&catalog, &e, &SearchStrategy::hnsw(60)).unwrap();

        for query in ["java cloud", "customer sales", "mechanical agile leadership"] {
            assert_eq!(
                search(&exact, &e, query, 5).unwrap(),
                search(&approx, &e, query, 5).unwrap()
            );
        }
    }

    #[test]
    fn test_hnsw_results_keep_invariants() {
        let catalog = hash_catalog(300);
        let e = embedder();
        let index = Index::build(&catalog, &e, &SearchStrategy::hnsw(16)).unwrap();
        let results = search(&index, &e, "verbal reasoning", 8).unwrap();

        assert_eq!(results.len(), 8);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_hnsw_over_identical_records_returns_full_length() {
        let records = (0..100).map(|i| CatalogRecord::new(format!("d{i}"), "Verbal Reasoning", "Same text"));
        let (catalog, _) = Catalog::from_records(records);
        let e = embedder();
        let index = Index::build(&catalog, &e, &SearchStrategy::hnsw(8)).unwrap();

        for k in [100, 50, 20] {
            let results = search(&index, &e, "verbal", k).unwrap();
            assert_eq!(results.len(), k, "k = {k}");
            assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), (1..=k).collect::<Vec<_>>());
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }

        // With k covering the catalog the scan is exact, so ties keep catalog order.
        let all = search(&index, &e, "verbal", 100).unwrap();
        assert_eq!(all.iter().map(|r| r.position).collect::<Vec<_>>(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_hnsw_with_k_at_catalog_size_scans_everything() {
        let catalog = hash_catalog(40);
        let e = embedder();
        let exact = Index::build(&catalog, &e, &SearchStrategy::Exact).unwrap();
        let approx = Index::build(&catalog, &e, &SearchStrategy::hnsw(4)).unwrap();

        let results = search(&approx, &e, "numerical finance", 40).unwrap();
        assert_eq!(results.len(), 40);
        assert_eq!(results, search(&exact, &e, "numerical finance", 40).unwrap());
    }

    #[test]
    fn test_top_k_helper() {
        let scored: Vec<(usize, f32)> = vec![(0, 0.1), (1, 0.9), (2, 0.5), (3, 0.9), (4, -1.0)];
        assert_eq!(top_k(scored, 3), vec![(1, 0.9), (3, 0.9), (2, 0.5)]);
    }
}
