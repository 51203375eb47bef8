//! Distributed index partitioner: global row index ↔ process-local slot.
//!
//! The block matrix consumes the partitioner only through the
//! [`IndexPartitioner`] trait. Local slots are numbered with the owned
//! indices first (`0..local_size()`) followed by the ghost indices
//! (`local_size()..local_size() + n_ghost_indices()`).
//!
//! [`Partitioner`] is the in-crate implementation: a contiguous owned range
//! plus a sorted list of ghost indices, which is what a contiguous DoF
//! distribution produces.

use std::fmt::Debug;
use std::ops::Range;

use crate::bcsr_error::BlockCsrError;
use crate::debug_invariants::DebugInvariants;

/// Translation between global indices and this process's local slots.
pub trait IndexPartitioner: Debug + Send + Sync {
    /// Size of the global index space.
    fn size(&self) -> usize;

    /// Number of indices owned by this process.
    fn local_size(&self) -> usize;

    /// Number of ghost indices visible to this process.
    fn n_ghost_indices(&self) -> usize;

    /// Global index stored at `local_slot`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `local_slot >= local_size() + n_ghost_indices()`.
    fn local_to_global(&self, local_slot: usize) -> Result<usize, BlockCsrError>;

    /// Local slot of `global_index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` outside the global space, `GhostIndexNotFound`
    /// when the index is neither owned nor a ghost.
    fn global_to_local(&self, global_index: usize) -> Result<usize, BlockCsrError>;

    /// Whether `global_index` is owned by this process.
    fn in_local_range(&self, global_index: usize) -> bool;

    /// Whether `global_index` is a ghost on this process.
    fn is_ghost_entry(&self, global_index: usize) -> bool {
        !self.in_local_range(global_index) && self.global_to_local(global_index).is_ok()
    }
}

/// Contiguous ownership with an explicit ghost set.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Partitioner {
    size: usize,
    owned_begin: usize,
    owned_end: usize,
    /// Sorted, unique, all outside the owned range.
    ghosts: Vec<usize>,
}

impl Partitioner {
    /// A single process owning `[0, size)` with no ghosts.
    pub fn serial(size: usize) -> Self {
        Self {
            size,
            owned_begin: 0,
            owned_end: size,
            ghosts: Vec::new(),
        }
    }

    /// Own `owned` out of `[0, size)` and see `ghosts` read/write.
    ///
    /// Ghost indices may be given in any order and with duplicates.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `owned` or a ghost leaves `[0, size)`,
    /// `InvalidGhostIndex` if a ghost lies inside the owned range.
    pub fn new(
        size: usize,
        owned: Range<usize>,
        ghosts: impl IntoIterator<Item = usize>,
    ) -> Result<Self, BlockCsrError> {
        if owned.start > owned.end || owned.end > size {
            return Err(BlockCsrError::IndexOutOfRange {
                index: owned.end.max(owned.start),
                size,
            });
        }
        let mut ghosts: Vec<usize> = ghosts.into_iter().collect();
        ghosts.sort_unstable();
        ghosts.dedup();
        for &g in &ghosts {
            if g >= size {
                return Err(BlockCsrError::IndexOutOfRange { index: g, size });
            }
            if owned.contains(&g) {
                return Err(BlockCsrError::InvalidGhostIndex(g));
            }
        }
        let part = Self {
            size,
            owned_begin: owned.start,
            owned_end: owned.end,
            ghosts,
        };
        crate::debug_invariants!(part.validate_invariants(), "Partitioner invalid");
        Ok(part)
    }

    /// Owned global range.
    #[inline]
    pub fn owned_range(&self) -> Range<usize> {
        self.owned_begin..self.owned_end
    }

    /// Ghost indices in ascending order.
    #[inline]
    pub fn ghost_indices(&self) -> &[usize] {
        &self.ghosts
    }
}

impl IndexPartitioner for Partitioner {
    fn size(&self) -> usize {
        self.size
    }

    fn local_size(&self) -> usize {
        self.owned_end - self.owned_begin
    }

    fn n_ghost_indices(&self) -> usize {
        self.ghosts.len()
    }

    fn local_to_global(&self, local_slot: usize) -> Result<usize, BlockCsrError> {
        let n_owned = self.local_size();
        if local_slot < n_owned {
            return Ok(self.owned_begin + local_slot);
        }
        self.ghosts
            .get(local_slot - n_owned)
            .copied()
            .ok_or(BlockCsrError::IndexOutOfRange {
                index: local_slot,
                size: n_owned + self.ghosts.len(),
            })
    }

    fn global_to_local(&self, global_index: usize) -> Result<usize, BlockCsrError> {
        if global_index >= self.size {
            return Err(BlockCsrError::IndexOutOfRange {
                index: global_index,
                size: self.size,
            });
        }
        if self.in_local_range(global_index) {
            return Ok(global_index - self.owned_begin);
        }
        self.ghosts
            .binary_search(&global_index)
            .map(|pos| self.local_size() + pos)
            .map_err(|_| BlockCsrError::GhostIndexNotFound(global_index))
    }

    #[inline]
    fn in_local_range(&self, global_index: usize) -> bool {
        (self.owned_begin..self.owned_end).contains(&global_index)
    }
}

impl DebugInvariants for Partitioner {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Partitioner invalid");
    }

    fn validate_invariants(&self) -> Result<(), BlockCsrError> {
        if self.owned_begin > self.owned_end || self.owned_end > self.size {
            return Err(BlockCsrError::IndexOutOfRange {
                index: self.owned_end,
                size: self.size,
            });
        }
        if let Some(w) = self.ghosts.windows(2).find(|w| w[0] >= w[1]) {
            return Err(BlockCsrError::InvalidGhostIndex(w[1]));
        }
        if let Some(&g) = self
            .ghosts
            .iter()
            .find(|&&g| g >= self.size || self.in_local_range(g))
        {
            return Err(BlockCsrError::InvalidGhostIndex(g));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_owns_everything() {
        let p = Partitioner::serial(8);
        assert_eq!(p.local_size(), 8);
        assert_eq!(p.n_ghost_indices(), 0);
        for g in 0..8 {
            assert_eq!(p.global_to_local(g).unwrap(), g);
            assert_eq!(p.local_to_global(g).unwrap(), g);
        }
        assert!(p.global_to_local(8).is_err());
    }

    #[test]
    fn ghosts_follow_owned_slots() {
        let p = Partitioner::new(10, 4..7, [9, 2, 2]).unwrap();
        assert_eq!(p.local_size(), 3);
        assert_eq!(p.ghost_indices(), &[2, 9]);
        assert_eq!(p.global_to_local(5).unwrap(), 1);
        assert_eq!(p.global_to_local(2).unwrap(), 3);
        assert_eq!(p.global_to_local(9).unwrap(), 4);
        assert_eq!(p.local_to_global(4).unwrap(), 9);
        assert!(p.is_ghost_entry(2));
        assert!(!p.is_ghost_entry(5));
        assert_eq!(
            p.global_to_local(0).unwrap_err(),
            BlockCsrError::GhostIndexNotFound(0)
        );
        assert!(p.local_to_global(5).is_err());
    }

    #[test]
    fn ghost_inside_owned_range_rejected() {
        assert_eq!(
            Partitioner::new(10, 4..7, [5]).unwrap_err(),
            BlockCsrError::InvalidGhostIndex(5)
        );
        assert!(Partitioner::new(10, 4..12, []).is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let p = Partitioner::new(6, 0..3, [4]).unwrap();
        let ser = serde_json::to_string(&p).expect("serialize");
        let de: Partitioner = serde_json::from_str(&ser).expect("deserialize");
        assert_eq!(de, p);
    }
}
