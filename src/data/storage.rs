//! Pluggable storage for the tile buffer of a block matrix.
//!
//! All tiles of a [`BlockCsrMatrix`](crate::matrix::BlockCsrMatrix) live in
//! one flat buffer; each tile is a contiguous sub-slice. This trait abstracts
//! how that buffer is held so that pinned or mapped backends can be plugged
//! in later without touching the matrix API.

use core::fmt::{self, Debug};

/// Contiguous, indexable storage for `V` with slice access.
pub trait Storage<V>: Debug {
    /// Construct a buffer of `len`, filled with `fill`.
    fn with_len(len: usize, fill: V) -> Self
    where
        V: Clone;

    /// Current length in elements.
    fn len(&self) -> usize;

    /// Whether the buffer holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entire read-only buffer.
    fn as_slice(&self) -> &[V];

    /// Entire mutable buffer.
    fn as_mut_slice(&mut self) -> &mut [V];
}

/// `Vec`-backed storage (default).
#[derive(Clone)]
pub struct VecStorage<V>(pub(crate) Vec<V>);

impl<V> Debug for VecStorage<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecStorage")
            .field("len", &self.0.len())
            .finish()
    }
}

impl<V> Default for VecStorage<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Storage<V> for VecStorage<V> {
    fn with_len(len: usize, fill: V) -> Self
    where
        V: Clone,
    {
        Self(vec![fill; len])
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn as_slice(&self) -> &[V] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_fills_and_exposes_slices() {
        let mut s = VecStorage::with_len(4, 1.5f64);
        assert_eq!(s.len(), 4);
        assert!(!s.is_empty());
        s.as_mut_slice()[2] = -1.0;
        assert_eq!(s.as_slice(), &[1.5, 1.5, -1.0, 1.5]);
        assert!(VecStorage::<f64>::default().is_empty());
    }
}
