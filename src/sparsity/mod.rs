//! Block sparsity pattern: which (block-row, block-column) pairs are nonzero.
//!
//! The pattern is built dynamically by repeated [`add`](BlockSparsityPattern::add)
//! calls (duplicates allowed, order irrelevant) and then frozen by
//! [`compress`](BlockSparsityPattern::compress) into a CSR layout: one offset
//! table over block-rows and a flat array of sorted, deduplicated block-column
//! ids. After compression the pattern is immutable and all row queries walk
//! contiguous slices.

use std::fmt;

use crate::bcsr_error::BlockCsrError;
use crate::debug_invariants::DebugInvariants;

/// Lazy ascending sequence of the nonzero block-columns of one block-row.
///
/// Cloning the iterator restarts it from its current position.
pub type ColumnsIter<'a> = std::iter::Copied<std::slice::Iter<'a, usize>>;

/// Set of nonzero `(block_row, block_col)` pairs.
///
/// # Invariants (compressed form)
///
/// - `row_offsets.len() == n_block_rows + 1`, monotone, ending at
///   `columns.len()`.
/// - Within one row, column ids are strictly increasing and `< n_block_cols`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawPattern")]
pub struct BlockSparsityPattern {
    n_block_rows: usize,
    n_block_cols: usize,
    /// Insertions per row before compression; emptied by `compress`.
    pending: Vec<Vec<usize>>,
    /// CSR row pointer over `columns`.
    row_offsets: Vec<usize>,
    /// Sorted block-column ids, row after row.
    columns: Vec<usize>,
    compressed: bool,
}

/// Unchecked wire form; validated on the way in.
#[derive(serde::Deserialize)]
struct RawPattern {
    n_block_rows: usize,
    n_block_cols: usize,
    pending: Vec<Vec<usize>>,
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
    compressed: bool,
}

impl TryFrom<RawPattern> for BlockSparsityPattern {
    type Error = BlockCsrError;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        let sp = Self {
            n_block_rows: raw.n_block_rows,
            n_block_cols: raw.n_block_cols,
            pending: raw.pending,
            row_offsets: raw.row_offsets,
            columns: raw.columns,
            compressed: raw.compressed,
        };
        sp.validate_invariants()?;
        Ok(sp)
    }
}

impl BlockSparsityPattern {
    /// Empty dynamic pattern for `n_block_rows x n_block_cols` blocks.
    pub fn new(n_block_rows: usize, n_block_cols: usize) -> Self {
        Self {
            n_block_rows,
            n_block_cols,
            pending: vec![Vec::new(); n_block_rows],
            row_offsets: Vec::new(),
            columns: Vec::new(),
            compressed: false,
        }
    }

    /// Number of block-rows.
    #[inline]
    pub fn n_block_rows(&self) -> usize {
        self.n_block_rows
    }

    /// Number of block-columns.
    #[inline]
    pub fn n_block_cols(&self) -> usize {
        self.n_block_cols
    }

    /// Whether [`compress`](Self::compress) has been called.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Mark `(row_block, col_block)` as nonzero. Idempotent.
    ///
    /// # Errors
    /// `AlreadyCompressed` after compression; `BlockOutOfRange` if either
    /// block id is outside the pattern.
    pub fn add(&mut self, row_block: usize, col_block: usize) -> Result<(), BlockCsrError> {
        if self.compressed {
            return Err(BlockCsrError::AlreadyCompressed);
        }
        self.check_row(row_block)?;
        if col_block >= self.n_block_cols {
            return Err(BlockCsrError::BlockOutOfRange {
                block: col_block,
                n_blocks: self.n_block_cols,
            });
        }
        self.pending[row_block].push(col_block);
        Ok(())
    }

    /// Mark every `(row_block, c)` for `c` in `cols` as nonzero.
    pub fn add_row_entries<I>(&mut self, row_block: usize, cols: I) -> Result<(), BlockCsrError>
    where
        I: IntoIterator<Item = usize>,
    {
        cols.into_iter().try_for_each(|c| self.add(row_block, c))
    }

    /// Freeze the pattern: sort and deduplicate each row into CSR form.
    ///
    /// # Errors
    /// `AlreadyCompressed` if called twice.
    pub fn compress(&mut self) -> Result<(), BlockCsrError> {
        if self.compressed {
            return Err(BlockCsrError::AlreadyCompressed);
        }
        let pending = std::mem::take(&mut self.pending);
        let mut row_offsets = Vec::with_capacity(self.n_block_rows + 1);
        let mut columns = Vec::with_capacity(pending.iter().map(Vec::len).sum());
        row_offsets.push(0);
        for mut row in pending {
            row.sort_unstable();
            row.dedup();
            columns.extend_from_slice(&row);
            row_offsets.push(columns.len());
        }
        self.row_offsets = row_offsets;
        self.columns = columns;
        self.compressed = true;
        crate::debug_invariants!(self.validate_invariants(), "BlockSparsityPattern invalid");
        Ok(())
    }

    /// Ascending nonzero block-columns of `row_block`.
    ///
    /// # Errors
    /// `NotCompressed` before compression; `BlockOutOfRange` for an unknown row.
    pub fn columns_of(&self, row_block: usize) -> Result<ColumnsIter<'_>, BlockCsrError> {
        self.require_compressed()?;
        self.check_row(row_block)?;
        Ok(self.row_slice(row_block).iter().copied())
    }

    /// Whether `(row_block, col_block)` is nonzero.
    pub fn exists(&self, row_block: usize, col_block: usize) -> Result<bool, BlockCsrError> {
        Ok(self.row_position(row_block, col_block)?.is_some())
    }

    /// Position of `col_block` within the sorted columns of `row_block`.
    pub fn row_position(
        &self,
        row_block: usize,
        col_block: usize,
    ) -> Result<Option<usize>, BlockCsrError> {
        self.require_compressed()?;
        self.check_row(row_block)?;
        Ok(self.row_slice(row_block).binary_search(&col_block).ok())
    }

    /// Number of nonzero blocks in `row_block`.
    pub fn row_length(&self, row_block: usize) -> Result<usize, BlockCsrError> {
        self.require_compressed()?;
        self.check_row(row_block)?;
        Ok(self.row_offsets[row_block + 1] - self.row_offsets[row_block])
    }

    /// Total number of nonzero blocks.
    pub fn n_nonzero_blocks(&self) -> Result<usize, BlockCsrError> {
        self.require_compressed()?;
        Ok(self.columns.len())
    }

    /// Longest row.
    pub fn max_entries_per_row(&self) -> Result<usize, BlockCsrError> {
        self.require_compressed()?;
        Ok(self
            .row_offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0))
    }

    /// Sorted columns of a row; caller guarantees compression and range.
    #[inline]
    pub(crate) fn row_slice(&self, row_block: usize) -> &[usize] {
        &self.columns[self.row_offsets[row_block]..self.row_offsets[row_block + 1]]
    }

    fn require_compressed(&self) -> Result<(), BlockCsrError> {
        if self.compressed {
            Ok(())
        } else {
            Err(BlockCsrError::NotCompressed)
        }
    }

    fn check_row(&self, row_block: usize) -> Result<(), BlockCsrError> {
        if row_block >= self.n_block_rows {
            return Err(BlockCsrError::BlockOutOfRange {
                block: row_block,
                n_blocks: self.n_block_rows,
            });
        }
        Ok(())
    }
}

impl DebugInvariants for BlockSparsityPattern {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "BlockSparsityPattern invalid");
    }

    fn validate_invariants(&self) -> Result<(), BlockCsrError> {
        if !self.compressed {
            if self.pending.len() != self.n_block_rows {
                return Err(BlockCsrError::LengthMismatch {
                    expected: self.n_block_rows,
                    found: self.pending.len(),
                });
            }
            if let Some(&c) = self.pending.iter().flatten().find(|&&c| c >= self.n_block_cols) {
                return Err(BlockCsrError::BlockOutOfRange {
                    block: c,
                    n_blocks: self.n_block_cols,
                });
            }
            return Ok(());
        }
        if self.row_offsets.len() != self.n_block_rows + 1 {
            return Err(BlockCsrError::LengthMismatch {
                expected: self.n_block_rows + 1,
                found: self.row_offsets.len(),
            });
        }
        if self.row_offsets[0] != 0 {
            return Err(BlockCsrError::NonContiguousOffsets {
                block: 0,
                expected: 0,
                found: self.row_offsets[0],
            });
        }
        if self.row_offsets.last() != Some(&self.columns.len()) {
            return Err(BlockCsrError::LengthMismatch {
                expected: self.columns.len(),
                found: self.row_offsets.last().copied().unwrap_or(0),
            });
        }
        if let Some(row) =
            (0..self.n_block_rows).find(|&r| self.row_offsets[r] > self.row_offsets[r + 1])
        {
            return Err(BlockCsrError::NonContiguousOffsets {
                block: row + 1,
                expected: self.row_offsets[row],
                found: self.row_offsets[row + 1],
            });
        }
        // Offsets are monotone and end at `columns.len()`: rows slice safely.
        for row in 0..self.n_block_rows {
            let cols = self.row_slice(row);
            if let Some(&c) = cols.iter().find(|&&c| c >= self.n_block_cols) {
                return Err(BlockCsrError::BlockOutOfRange {
                    block: c,
                    n_blocks: self.n_block_cols,
                });
            }
            if let Some(w) = cols.windows(2).find(|w| w[0] >= w[1]) {
                return Err(BlockCsrError::UnsortedRow { row, col: w[1] });
            }
        }
        Ok(())
    }
}

/// One line per block-row listing its `[row,col]` entries.
impl fmt::Display for BlockSparsityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.n_block_rows {
            let cols: Vec<usize> = if self.compressed {
                self.row_slice(row).to_vec()
            } else {
                let mut cols = self.pending[row].clone();
                cols.sort_unstable();
                cols.dedup();
                cols
            };
            for c in cols {
                write!(f, "[{row},{c}]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
