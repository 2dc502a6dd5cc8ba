use serde::{Deserialize, Serialize};

/// Score assigned when either side of a comparison has no usable direction.
/// Equal to the bottom of the cosine range so degenerate entries sort last.
pub const MIN_SIMILARITY: f32 = -1.0;

/// A dense embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        crate::simd::norm_simd(&self.data)
    }

    /// True when the vector is too short to define a direction.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.norm() > f32::EPSILON)
    }

    /// Cosine similarity in `[-1, 1]`.
    ///
    /// Near-zero vectors (and NaN components) score [`MIN_SIMILARITY`], so the
    /// result is always a comparable number.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return MIN_SIMILARITY;
        }

        let norm_a = crate::simd::norm_simd(&self.data);
        let norm_b = crate::simd::norm_simd(&other.data);

        if !(norm_a > f32::EPSILON) || !(norm_b > f32::EPSILON) {
            return MIN_SIMILARITY;
        }

        let dot_product = crate::simd::dot_product_simd(&self.data, &other.data);
        let score = dot_product / (norm_a * norm_b);
        if score.is_nan() {
            return MIN_SIMILARITY;
        }
        score.clamp(-1.0, 1.0)
    }

    /// Normalize to unit length in place. Degenerate vectors are left untouched.
    #[inline]
    pub fn normalize(&mut self) {
        let norm = crate::simd::norm_simd(&self.data);
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}
