use serde::{Deserialize, Serialize};

/// A dense embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(dim: usize) -> Self {
        Self::new(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Euclidean norm
    #[inline]
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Squared L2 distance, the metric a flat L2 index reports.
    /// Mismatched dimensions are infinitely far apart.
    #[inline]
    pub fn squared_l2_distance(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return f32::INFINITY;
        }

        // two accumulators keep the loop pipelined on long vectors
        let mut even = 0.0f32;
        let mut odd = 0.0f32;
        let mut lhs = self.data.chunks_exact(2);
        let mut rhs = other.data.chunks_exact(2);
        for (a, b) in (&mut lhs).zip(&mut rhs) {
            let d0 = a[0] - b[0];
            let d1 = a[1] - b[1];
            even += d0 * d0;
            odd += d1 * d1;
        }
        for (a, b) in lhs.remainder().iter().zip(rhs.remainder()) {
            let d = a - b;
            even += d * d;
        }
        even + odd
    }

    /// Scale to unit length; zero vectors stay zero
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            self.data.iter_mut().for_each(|x| *x /= norm);
        }
    }

    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}
