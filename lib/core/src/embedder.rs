//! Text embedders
//!
//! [`Embedder`] is the seam between the engine and whatever turns text into
//! vectors. The engine only needs three guarantees from an implementation:
//!
//! 1. Every vector it returns has exactly [`Embedder::dimension`] components.
//! 2. The same text always yields the same vector.
//! 3. Empty text yields a valid vector, not an error.
//!
//! [`HashEmbedder`] is the bundled local model. It hashes words and character
//! trigrams into a fixed number of buckets, so texts that share vocabulary (or
//! word fragments) point in similar directions. No files, no network.

use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Default embedding dimension
pub const DEFAULT_DIM: usize = 384;

const WORD_SEED: u64 = 0x5348_4f52_544c_5354;
const TRIGRAM_SEED: u64 = 0x7472_6967_7261_6d73;

/// Maps text to a fixed-dimension dense vector.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vector>;

    /// Embed many texts, preserving input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Number of components in every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Identifies the embedding space. Vectors from embedders with different
    /// ids must never be compared.
    fn model_id(&self) -> &str;
}

/// Configuration for [`HashEmbedder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashEmbedderConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_word_weight")]
    pub word_weight: f32,
    #[serde(default = "default_trigram_weight")]
    pub trigram_weight: f32,
}

fn default_dimension() -> usize {
    DEFAULT_DIM
}

fn default_word_weight() -> f32 {
    2.0
}

fn default_trigram_weight() -> f32 {
    1.0
}

impl Default for HashEmbedderConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            word_weight: default_word_weight(),
            trigram_weight: default_trigram_weight(),
        }
    }
}

impl HashEmbedderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::Setup("embedding dimension must be at least 1".to_string()));
        }
        for (name, weight) in [("word_weight", self.word_weight), ("trigram_weight", self.trigram_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Setup(format!("{name} must be a finite non-negative number, got {weight}")));
            }
        }
        if self.word_weight == 0.0 && self.trigram_weight == 0.0 {
            return Err(Error::Setup("word_weight and trigram_weight cannot both be zero".to_string()));
        }
        Ok(())
    }
}

/// Feature-hashing embedder over words and character trigrams.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    config: HashEmbedderConfig,
    model_id: String,
}

impl HashEmbedder {
    /// Create an embedder, validating the configuration up front.
    pub fn new(config: HashEmbedderConfig) -> Result<Self> {
        config.validate()?;
        let model_id = format!(
            "hash-trigram-v1:d{}:w{}:t{}",
            config.dimension, config.word_weight, config.trigram_weight
        );
        Ok(Self { config, model_id })
    }

    pub fn builder() -> HashEmbedderBuilder {
        HashEmbedderBuilder::default()
    }

    pub fn config(&self) -> &HashEmbedderConfig {
        &self.config
    }

    #[inline]
    fn bucket(&self, seed: u64, feature: &str) -> usize {
        let mut hasher = XxHash64::with_seed(seed);
        hasher.write(feature.as_bytes());
        (hasher.finish() % self.config.dimension as u64) as usize
    }

    fn accumulate_word(&self, word: &str, components: &mut [f32]) {
        if self.config.word_weight > 0.0 {
            components[self.bucket(WORD_SEED, word)] += self.config.word_weight;
        }

        if self.config.trigram_weight > 0.0 {
            let padded: Vec<char> = format!(" {word} ").chars().collect();
            let mut trigram = String::with_capacity(12);
            for window in padded.windows(3) {
                trigram.clear();
                trigram.extend(window);
                components[self.bucket(TRIGRAM_SEED, &trigram)] += self.config.trigram_weight;
            }
        }
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vector> {
        let mut components = vec![0.0f32; self.config.dimension];
        let lowered = text.to_lowercase();

        for word in tokenize(&lowered) {
            self.accumulate_word(word, &mut components);
        }

        let mut vector = Vector::new(components);
        vector.normalize();
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Split lowercased text into alphanumeric words.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

/// Builder for [`HashEmbedder`]
#[derive(Debug, Clone, Default)]
pub struct HashEmbedderBuilder {
    config: HashEmbedderConfig,
}

impl HashEmbedderBuilder {
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.config.dimension = dimension;
        self
    }

    pub fn word_weight(mut self, weight: f32) -> Self {
        self.config.word_weight = weight;
        self
    }

    pub fn trigram_weight(mut self, weight: f32) -> Self {
        self.config.trigram_weight = weight;
        self
    }

    pub fn build(self) -> Result<HashEmbedder> {
        HashEmbedder::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> HashEmbedder {
        HashEmbedder::new(HashEmbedderConfig::default()).unwrap()
    }

    #[test]
    fn test_dimension_is_fixed() {
        let e = embedder();
        let long = "long text ".repeat(500);
        for text in ["", "a", "Verify Verbal Reasoning", long.as_str()] {
            assert_eq!(e.embed(text).unwrap().dim(), DEFAULT_DIM);
        }
    }

    #[test]
    fn test_same_text_same_vector() {
        let e = embedder();
        let v1 = e.embed("Graduate numerical reasoning").unwrap();
        let v2 = e.embed("Graduate numerical reasoning").unwrap();
        let bits1: Vec<u32> = v1.as_slice().iter().map(|x| x.to_bits()).collect();
        let bits2: Vec<u32> = v2.as_slice().iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits1, bits2);
    }

    #[test]
    fn test_two_instances_agree() {
        let a = embedder();
        let b = embedder();
        assert_eq!(a.embed("sales manager").unwrap(), b.embed("sales manager").unwrap());
        assert_eq!(a.model_id(), b.model_id());
    }

    #[test]
    fn test_empty_text_is_valid_zero_vector() {
        let v = embedder().embed("").unwrap();
        assert_eq!(v.dim(), DEFAULT_DIM);
        assert!(v.is_degenerate());

        let punctuation_only = embedder().embed("  ... !!").unwrap();
        assert!(punctuation_only.is_degenerate());
    }

    #[test]
    fn test_output_is_unit_length() {
        let v = embedder().embed("Java developer with cloud experience").unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_case_insensitive() {
        let e = embedder();
        assert_eq!(e.embed("Verbal Reasoning").unwrap(), e.embed("verbal reasoning").unwrap());
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let e = embedder();
        let query = e.embed("verbal comprehension").unwrap();
        let verbal = e.embed("verbal reasoning and reading comprehension").unwrap();
        let mechanical = e.embed("mechanical physics and engineering").unwrap();
        assert!(query.cosine_similarity(&verbal) > query.cosine_similarity(&mechanical));
    }

    #[test]
    fn test_invalid_config_is_setup_error() {
        let err = HashEmbedder::builder().dimension(0).build().unwrap_err();
        assert!(matches!(err, Error::Setup(_)));

        let err = HashEmbedder::builder().word_weight(-1.0).build().unwrap_err();
        assert!(matches!(err, Error::Setup(_)));

        let err = HashEmbedder::builder().word_weight(0.0).trigram_weight(0.0).build().unwrap_err();
        assert!(matches!(err, Error::Setup(_)));
    }

    #[test]
    fn test_model_id_tracks_configuration() {
        let a = HashEmbedder::builder().dimension(128).build().unwrap();
        let b = HashEmbedder::builder().dimension(256).build().unwrap();
        assert_ne!(a.model_id(), b.model_id());
        assert_eq!(a.dimension(), 128);
    }

    #[test]
    fn test_tokenize() {
        let words: Vec<&str> = tokenize("c++, java/python; 3d-modelling").collect();
        assert_eq!(words, vec!["c", "java", "python", "3d", "modelling"]);
    }
}
