//! BlockIndices: partition of one matrix axis into contiguous blocks.
//!
//! A `BlockIndices` stores the size of every block along an axis together
//! with a prefix-sum offset table, so that a global index can be mapped to
//! its owning block by binary search and back again in O(1).

use std::ops::Range;

use crate::bcsr_error::BlockCsrError;
use crate::debug_invariants::DebugInvariants;

/// Ordered list of block sizes along one axis.
///
/// # Invariants
///
/// - `offsets.len() == sizes.len() + 1` and `offsets[0] == 0`.
/// - `offsets[k + 1] == offsets[k] + sizes[k]` for every block `k`.
/// - Every block has a positive size.
///
/// Immutable after construction. A matrix shares its row and column
/// partitions read-only, usually behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawBlockIndices")]
pub struct BlockIndices {
    sizes: Vec<usize>,
    offsets: Vec<usize>,
}

/// Unchecked wire form; validated on the way in.
#[derive(serde::Deserialize)]
struct RawBlockIndices {
    sizes: Vec<usize>,
    offsets: Vec<usize>,
}

impl TryFrom<RawBlockIndices> for BlockIndices {
    type Error = BlockCsrError;

    fn try_from(raw: RawBlockIndices) -> Result<Self, Self::Error> {
        let blocks = Self {
            sizes: raw.sizes,
            offsets: raw.offsets,
        };
        blocks.validate_invariants()?;
        Ok(blocks)
    }
}

impl BlockIndices {
    /// Build a partition from the size of each block.
    ///
    /// # Errors
    /// Returns `Err(InvalidBlockSizes)` if any block is empty or the total
    /// size overflows `usize`.
    ///
    /// # Example
    /// ```rust
    /// # fn try_main() -> Result<(), block_csr::bcsr_error::BlockCsrError> {
    /// use block_csr::data::block_indices::BlockIndices;
    /// let rows = BlockIndices::new(vec![3, 2, 1, 2])?;
    /// assert_eq!(rows.total_size(), 8);
    /// assert_eq!(rows.global_to_local(4)?, (1, 1));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(sizes: Vec<usize>) -> Result<Self, BlockCsrError> {
        if sizes.contains(&0) {
            return Err(BlockCsrError::InvalidBlockSizes("block of size zero"));
        }
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        offsets.push(0usize);
        let mut total = 0usize;
        for &size in &sizes {
            total = total
                .checked_add(size)
                .ok_or(BlockCsrError::InvalidBlockSizes("total size overflows usize"))?;
            offsets.push(total);
        }
        let blocks = Self { sizes, offsets };
        crate::debug_invariants!(blocks.validate_invariants(), "BlockIndices invalid");
        Ok(blocks)
    }

    /// `n_blocks` blocks of identical `size`.
    pub fn uniform(n_blocks: usize, size: usize) -> Result<Self, BlockCsrError> {
        Self::new(vec![size; n_blocks])
    }

    /// Number of blocks.
    #[inline]
    pub fn n_blocks(&self) -> usize {
        self.sizes.len()
    }

    /// Sum of all block sizes.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.offsets[self.sizes.len()]
    }

    /// Size of block `block`.
    ///
    /// # Panics
    /// Panics if `block >= n_blocks()`.
    #[inline]
    pub fn block_size(&self, block: usize) -> usize {
        self.sizes[block]
    }

    /// First global index of block `block`.
    ///
    /// # Panics
    /// Panics if `block > n_blocks()`. `block_start(n_blocks())` is the
    /// total size.
    #[inline]
    pub fn block_start(&self, block: usize) -> usize {
        self.offsets[block]
    }

    /// Global index range `[start, end)` covered by `block`.
    #[inline]
    pub fn block_range(&self, block: usize) -> Range<usize> {
        self.offsets[block]..self.offsets[block + 1]
    }

    /// Block sizes in order.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Offset table of length `n_blocks() + 1`.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Block owning `global_index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `global_index >= total_size()`.
    pub fn block_of(&self, global_index: usize) -> Result<usize, BlockCsrError> {
        self.global_to_local(global_index).map(|(block, _)| block)
    }

    /// Map a global index to `(block, offset_in_block)`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `global_index >= total_size()`.
    ///
    /// # Complexity
    /// **O(log n_blocks)** binary search over the offset table.
    pub fn global_to_local(&self, global_index: usize) -> Result<(usize, usize), BlockCsrError> {
        let size = self.total_size();
        if global_index >= size {
            return Err(BlockCsrError::IndexOutOfRange {
                index: global_index,
                size,
            });
        }
        // Number of offsets <= global_index, minus the leading zero.
        let block = self.offsets.partition_point(|&off| off <= global_index) - 1;
        Ok((block, global_index - self.offsets[block]))
    }

    /// Inverse of [`global_to_local`](Self::global_to_local).
    ///
    /// # Errors
    /// `BlockOutOfRange` for an unknown block, `IndexOutOfRange` if
    /// `offset >= block_size(block)`.
    pub fn local_to_global(&self, block: usize, offset: usize) -> Result<usize, BlockCsrError> {
        let size = *self.sizes.get(block).ok_or(BlockCsrError::BlockOutOfRange {
            block,
            n_blocks: self.n_blocks(),
        })?;
        if offset >= size {
            return Err(BlockCsrError::IndexOutOfRange {
                index: offset,
                size,
            });
        }
        Ok(self.offsets[block] + offset)
    }
}

/// The empty partition: no blocks, total size zero.
impl Default for BlockIndices {
    fn default() -> Self {
        Self {
            sizes: Vec::new(),
            offsets: vec![0],
        }
    }
}

impl DebugInvariants for BlockIndices {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "BlockIndices invalid");
    }

    fn validate_invariants(&self) -> Result<(), BlockCsrError> {
        if self.offsets.len() != self.sizes.len() + 1 {
            return Err(BlockCsrError::LengthMismatch {
                expected: self.sizes.len() + 1,
                found: self.offsets.len(),
            });
        }
        if self.offsets[0] != 0 {
            return Err(BlockCsrError::NonContiguousOffsets {
                block: 0,
                expected: 0,
                found: self.offsets[0],
            });
        }
        for (k, &size) in self.sizes.iter().enumerate() {
            if size == 0 {
                return Err(BlockCsrError::InvalidBlockSizes("block of size zero"));
            }
            let expected = self.offsets[k]
                .checked_add(size)
                .ok_or(BlockCsrError::InvalidBlockSizes("total size overflows usize"))?;
            if self.offsets[k + 1] != expected {
                return Err(BlockCsrError::NonContiguousOffsets {
                    block: k + 1,
                    expected,
                    found: self.offsets[k + 1],
                });
            }
        }
        Ok(())
    }
}
