//! HNSW graph for approximate nearest-neighbour candidate generation.
//!
//! Nodes are addressed by their insertion position, which for the engine is the
//! catalog position. Level assignment uses a seeded RNG, so building twice from
//! the same vectors yields the same graph. Search returns candidate positions
//! only; callers rescore them exactly.

use crate::{Error, Result, Vector};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Graph construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Links per node on upper layers; layer 0 keeps twice as many.
    pub max_connections: usize,
    pub ef_construction: usize,
    pub max_layers: usize,
    pub seed: u64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            max_connections: 16,
            ef_construction: 200,
            max_layers: 16,
            seed: 0x686e_7377,
        }
    }
}

impl HnswParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_connections < 2 {
            return Err(Error::InvalidConfig(format!(
                "max_connections must be at least 2, got {}",
                self.max_connections
            )));
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidConfig("ef_construction must be at least 1".to_string()));
        }
        if self.max_layers == 0 {
            return Err(Error::InvalidConfig("max_layers must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Bit set for visited-node tracking during one layer search
struct VisitedSet {
    bits: Vec<u64>,
}

impl VisitedSet {
    #[inline]
    fn new(capacity: usize) -> Self {
        Self {
            bits: vec![0; (capacity + 63) / 64],
        }
    }

    /// Returns true if `idx` was not yet visited.
    #[inline]
    fn insert(&mut self, idx: usize) -> bool {
        let word = idx / 64;
        let mask = 1u64 << (idx % 64);
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let fresh = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        fresh
    }
}

#[derive(Debug, Clone)]
struct HnswNode {
    layers: Vec<Vec<usize>>,
}

/// Navigable small-world graph over unit-normalised vectors
#[derive(Debug, Clone)]
pub struct HnswGraph {
    nodes: Vec<HnswNode>,
    /// Contiguous storage, `dim` floats per node
    vectors: Vec<f32>,
    dim: usize,
    params: HnswParams,
    entry_point: Option<usize>,
    top_level: usize,
}

impl HnswGraph {
    /// Build a graph from vectors in order; node `i` is the `i`-th vector.
    pub fn build<'a, I>(dim: usize, vectors: I, params: HnswParams) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Vector>,
    {
        params.validate()?;

        let mut graph = Self {
            nodes: Vec::new(),
            vectors: Vec::new(),
            dim,
            params,
            entry_point: None,
            top_level: 0,
        };
        let mut rng = StdRng::seed_from_u64(params.seed);

        for vector in vectors {
            if vector.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: vector.dim(),
                });
            }
            let level = graph.select_level(&mut rng);
            graph.insert(vector.normalized().as_slice(), level);
        }

        Ok(graph)
    }

    #[inline]
    fn select_level(&self, rng: &mut StdRng) -> usize {
        let mut level = 0;
        while level < self.params.max_layers - 1 && rng.random::<f32>() < 0.5 {
            level += 1;
        }
        level
    }

    #[inline]
    fn vector(&self, idx: usize) -> &[f32] {
        let start = idx * self.dim;
        &self.vectors[start..start + self.dim]
    }

    #[inline]
    fn distance(&self, query: &[f32], idx: usize) -> f32 {
        1.0 - crate::simd::dot_product_simd(query, self.vector(idx))
    }

    /// Best-first search on one layer. Returns up to `ef` nodes sorted by
    /// ascending distance, ties by position.
    fn search_layer(&self, query: &[f32], entry: usize, ef: usize, layer: usize) -> Vec<(usize, f32)> {
        let mut visited = VisitedSet::new(self.nodes.len());
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat<f32>, usize)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat<f32>, usize)> = BinaryHeap::with_capacity(ef + 1);

        let entry_dist = OrderedFloat(self.distance(query, entry));
        visited.insert(entry);
        candidates.push(Reverse((entry_dist, entry)));
        results.push((entry_dist, entry));

        while let Some(Reverse((dist, idx))) = candidates.pop() {
            let worst = results.peek().map(|r| r.0).unwrap_or(OrderedFloat(f32::INFINITY));
            if results.len() >= ef && dist > worst {
                break;
            }

            let Some(neighbors) = self.nodes[idx].layers.get(layer) else {
                continue;
            };

            for &neighbor in neighbors {
                if !visited.insert(neighbor) {
                    continue;
                }
                let neighbor_dist = OrderedFloat(self.distance(query, neighbor));
                let worst = results.peek().map(|r| r.0).unwrap_or(OrderedFloat(f32::INFINITY));
                if results.len() < ef || neighbor_dist < worst {
                    candidates.push(Reverse((neighbor_dist, neighbor)));
                    results.push((neighbor_dist, neighbor));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut found: Vec<(usize, f32)> = results.into_iter().map(|(d, idx)| (idx, d.0)).collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    fn insert(&mut self, vector: &[f32], level: usize) {
        let idx = self.nodes.len();
        self.vectors.extend_from_slice(vector);
        self.nodes.push(HnswNode {
            layers: vec![Vec::new(); level + 1],
        });

        let Some(mut entry) = self.entry_point else {
            self.entry_point = Some(idx);
            self.top_level = level;
            return;
        };

        let mut layer = self.top_level;
        while layer > level {
            if let Some(&(closest, _)) = self.search_layer(vector, entry, 1, layer).first() {
                entry = closest;
            }
            layer -= 1;
        }

        for layer in (0..=level.min(self.top_level)).rev() {
            let candidates = self.search_layer(vector, entry, self.params.ef_construction, layer);
            let neighbors: Vec<usize> = candidates
                .iter()
                .map(|&(n, _)| n)
                .filter(|&n| n != idx)
                .take(self.params.max_connections)
                .collect();

            for &neighbor in &neighbors {
                self.link(neighbor, idx, layer);
            }
            self.nodes[idx].layers[layer] = neighbors;

            if let Some(&(closest, _)) = candidates.first() {
                entry = closest;
            }
        }

        if level > self.top_level {
            self.top_level = level;
            self.entry_point = Some(idx);
        }
    }

    /// Add a back-link `from -> to`, pruning to the closest links when full.
    fn link(&mut self, from: usize, to: usize, layer: usize) {
        let limit = if layer == 0 {
            self.params.max_connections * 2
        } else {
            self.params.max_connections
        };

        let Some(slot) = self.nodes[from].layers.get_mut(layer) else {
            return;
        };
        let mut links = std::mem::take(slot);
        links.push(to);

        if links.len() > limit {
            let base = self.vector(from).to_vec();
            links.sort_by_cached_key(|&n| (OrderedFloat(self.distance(&base, n)), n));
            links.truncate(limit);
        }

        self.nodes[from].layers[layer] = links;
    }

    /// Up to `max(ef, k)` candidate positions near `query`, closest first.
    pub fn search(&self, query: &Vector, k: usize, ef: usize) -> Vec<usize> {
        let Some(mut entry) = self.entry_point else {
            return Vec::new();
        };
        if query.dim() != self.dim {
            return Vec::new();
        }

        let normalized = query.normalized();
        let q = normalized.as_slice();

        for layer in (1..=self.top_level).rev() {
            if let Some(&(closest, _)) = self.search_layer(q, entry, 1, layer).first() {
                entry = closest;
            }
        }

        self.search_layer(q, entry, ef.max(k), 0)
            .into_iter()
            .map(|(idx, _)| idx)
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn params(&self) -> &HnswParams {
        &self.params
    }
}
