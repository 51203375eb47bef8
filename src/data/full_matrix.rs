//! Dense reference matrix used for validation round-trips.
//!
//! `FullMatrix` is a plain row-major `m x n` array over the full global index
//! space. Block matrices copy into and out of it so that accessor-driven
//! results can be compared against straightforward dense arithmetic.

use std::ops::{Index, IndexMut};

use num_traits::{Float, Zero};

use crate::bcsr_error::BlockCsrError;

/// Row-major dense matrix.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FullMatrix<V> {
    m: usize,
    n: usize,
    data: Vec<V>,
}

impl<V: Clone + Zero> FullMatrix<V> {
    /// An `m x n` matrix of zeros.
    pub fn zeros(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            data: vec![V::zero(); m * n],
        }
    }

    /// Build from row-major values.
    ///
    /// # Errors
    /// `LengthMismatch` if `data.len() != m * n`.
    pub fn from_row_major(m: usize, n: usize, data: Vec<V>) -> Result<Self, BlockCsrError> {
        if data.len() != m * n {
            return Err(BlockCsrError::LengthMismatch {
                expected: m * n,
                found: data.len(),
            });
        }
        Ok(Self { m, n, data })
    }

    /// Reset every entry to zero.
    pub fn set_zero(&mut self) {
        self.data.iter_mut().for_each(|v| *v = V::zero());
    }
}

impl<V> FullMatrix<V> {
    /// Number of rows.
    #[inline]
    pub fn m(&self) -> usize {
        self.m
    }

    /// Number of columns.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// `(m, n)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[V] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Row `i` as a mutable slice.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [V] {
        &mut self.data[i * self.n..(i + 1) * self.n]
    }

    /// Row-major values.
    #[inline]
    pub fn as_slice(&self) -> &[V] {
        &self.data
    }
}

impl<V: Float> FullMatrix<V> {
    /// `self += factor * other`.
    ///
    /// # Errors
    /// `DimensionMismatch` if the shapes differ.
    pub fn add(&mut self, factor: V, other: &Self) -> Result<(), BlockCsrError> {
        if self.shape() != other.shape() {
            return Err(BlockCsrError::DimensionMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = *a + factor * b;
        }
        Ok(())
    }

    /// Square root of the sum of squared entries.
    pub fn frobenius_norm(&self) -> V {
        self.data
            .iter()
            .fold(V::zero(), |acc, &v| acc + v * v)
            .sqrt()
    }

    /// Maximum absolute row sum.
    pub fn linfty_norm(&self) -> V {
        (0..self.m)
            .map(|i| self.row(i).iter().fold(V::zero(), |acc, &v| acc + v.abs()))
            .fold(V::zero(), V::max)
    }
}

impl<V> Index<(usize, usize)> for FullMatrix<V> {
    type Output = V;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &V {
        assert!(i < self.m && j < self.n, "({i}, {j}) out of {}x{}", self.m, self.n);
        &self.data[i * self.n + j]
    }
}

impl<V> IndexMut<(usize, usize)> for FullMatrix<V> {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut V {
        assert!(i < self.m && j < self.n, "({i}, {j}) out of {}x{}", self.m, self.n);
        &mut self.data[i * self.n + j]
    }
}
