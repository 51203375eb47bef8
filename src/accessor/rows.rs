//! Scalar row accessor: walk the nonzero columns of an explicit row list.
//!
//! Binding precomputes the ascending union of the nonzero block-columns of
//! every bound row's block-row. At each stop a bound row either has a tile at
//! the current column ([`has_entry`](RowsAccessor::has_entry) is true and
//! [`row`](RowsAccessor::row) returns its intra-block row) or it does not, in
//! which case the caller must leave it alone. Nothing is zero-filled.
//!
//! ```text
//! Unbound --reinit--> Bound(c0) --advance--> Bound(c1) ... --advance--> Exhausted
//! ```

use std::ops::Range;

use itertools::Itertools;

use crate::accessor::ColumnCursor;
use crate::bcsr_error::BlockCsrError;
use crate::bounds::ValueLike;
use crate::data::storage::{Storage, VecStorage};
use crate::matrix::BlockCsrMatrix;

/// Cursor state shared by the read and write accessors.
#[derive(Debug, Default)]
struct RowCursor {
    rows: Vec<usize>,
    /// `(local_row_block, offset_in_block)` per bound row.
    located: Vec<(usize, usize)>,
    /// Ascending union of the bound block-rows' columns.
    columns: Vec<usize>,
    pos: usize,
    bound: bool,
}

impl RowCursor {
    fn bind<V, S>(
        &mut self,
        matrix: &BlockCsrMatrix<V, S>,
        rows: &[usize],
    ) -> Result<Option<usize>, BlockCsrError>
    where
        V: ValueLike,
        S: Storage<V>,
    {
        self.bound = false;
        let located = rows
            .iter()
            .map(|&row| matrix.locate_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        let blocks: Vec<usize> = located
            .iter()
            .map(|&(block, _)| block)
            .sorted_unstable()
            .dedup()
            .collect();
        let columns: Vec<usize> = blocks
            .iter()
            .map(|&block| matrix.local_row_columns(block).iter().copied())
            .kmerge()
            .dedup()
            .collect();

        log::trace!(
            "rows accessor bound: {} rows, {} block-rows, {} columns",
            rows.len(),
            blocks.len(),
            columns.len()
        );
        if columns.is_empty() && !rows.is_empty() {
            log::warn!("rows accessor: {} bound rows touch no nonzero column", rows.len());
        }

        self.rows = rows.to_vec();
        self.located = located;
        self.columns = columns;
        self.pos = 0;
        self.bound = true;
        Ok(self.columns.first().copied())
    }

    #[inline]
    fn current(&self) -> Option<usize> {
        assert!(self.bound, "rows accessor used before reinit");
        self.columns.get(self.pos).copied()
    }

    fn advance(&mut self) -> bool {
        assert!(self.bound, "rows accessor used before reinit");
        if self.pos < self.columns.len() {
            self.pos += 1;
        }
        self.pos < self.columns.len()
    }

    /// Storage range of bound row `k` inside the tile at the current column.
    fn row_range<V, S>(&self, matrix: &BlockCsrMatrix<V, S>, k: usize) -> Option<Range<usize>>
    where
        V: ValueLike,
        S: Storage<V>,
    {
        let col = self.current()?;
        let (local, offset) = self.located[k];
        let tile = matrix.tile_range(local, col)?;
        let n = matrix.col_blocks().block_size(col);
        let start = tile.start + offset * n;
        Some(start..start + n)
    }
}

/// Read accessor over an explicit row list.
#[derive(Debug)]
pub struct RowsAccessor<'a, V, S = VecStorage<V>>
where
    S: Storage<V>,
{
    matrix: &'a BlockCsrMatrix<V, S>,
    cursor: RowCursor,
}

impl<'a, V, S> RowsAccessor<'a, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    /// Unbound accessor over `matrix`.
    pub fn new(matrix: &'a BlockCsrMatrix<V, S>) -> Self {
        Self {
            matrix,
            cursor: RowCursor::default(),
        }
    }

    /// Bind to `rows` and return the first nonzero column.
    ///
    /// `rows` may span several block-rows and may repeat indices.
    ///
    /// # Errors
    /// `IndexOutOfRange` or `RowNotLocallyRelevant` for a row the matrix does
    /// not store. The accessor is unbound afterwards.
    pub fn reinit(&mut self, rows: &[usize]) -> Result<Option<usize>, BlockCsrError> {
        self.cursor.bind(self.matrix, rows)
    }

    /// Current block-column, `None` once exhausted.
    ///
    /// # Panics
    /// Panics if the accessor was never bound.
    #[inline]
    pub fn current_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    /// Move to the next column of the union; `false` once exhausted.
    ///
    /// # Panics
    /// Panics if the accessor was never bound.
    pub fn advance(&mut self) -> bool {
        self.cursor.advance()
    }

    /// Whether every column has been visited.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.current().is_none()
    }

    /// Bound rows in caller order.
    pub fn rows(&self) -> &[usize] {
        &self.cursor.rows
    }

    /// Number of bound rows.
    pub fn n_rows(&self) -> usize {
        self.cursor.rows.len()
    }

    /// Size of the current block-column.
    pub fn col_block_size(&self) -> Option<usize> {
        self.current_column()
            .map(|c| self.matrix.col_blocks().block_size(c))
    }

    /// Whether bound row `k` has a tile at the current column.
    ///
    /// # Panics
    /// Panics if `k >= n_rows()`.
    pub fn has_entry(&self, k: usize) -> bool {
        self.cursor.row_range(self.matrix, k).is_some()
    }

    /// Values of bound row `k` at the current column.
    ///
    /// # Panics
    /// Panics if `k >= n_rows()`.
    pub fn row(&self, k: usize) -> Option<&'a [V]> {
        let range = self.cursor.row_range(self.matrix, k)?;
        Some(&self.matrix.values()[range])
    }

    /// Entry `j` of the current column block for bound row `k`.
    pub fn get(&self, k: usize, j: usize) -> Option<V> {
        self.row(k).and_then(|r| r.get(j).copied())
    }
}

impl<V, S> ColumnCursor for RowsAccessor<'_, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    fn current_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    fn advance(&mut self) -> bool {
        self.cursor.advance()
    }
}

/// Write accessor over an explicit row list.
///
/// Holds the matrix exclusively for as long as it lives.
#[derive(Debug)]
pub struct RowsAccessorMut<'a, V, S = VecStorage<V>>
where
    S: Storage<V>,
{
    matrix: &'a mut BlockCsrMatrix<V, S>,
    cursor: RowCursor,
}

impl<'a, V, S> RowsAccessorMut<'a, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    /// Unbound accessor over `matrix`.
    pub fn new(matrix: &'a mut BlockCsrMatrix<V, S>) -> Self {
        Self {
            matrix,
            cursor: RowCursor::default(),
        }
    }

    /// See [`RowsAccessor::reinit`].
    pub fn reinit(&mut self, rows: &[usize]) -> Result<Option<usize>, BlockCsrError> {
        self.cursor.bind(self.matrix, rows)
    }

    /// See [`RowsAccessor::current_column`].
    #[inline]
    pub fn current_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    /// See [`RowsAccessor::advance`].
    pub fn advance(&mut self) -> bool {
        self.cursor.advance()
    }

    /// See [`RowsAccessor::is_exhausted`].
    pub fn is_exhausted(&self) -> bool {
        self.cursor.current().is_none()
    }

    /// Bound rows in caller order.
    pub fn rows(&self) -> &[usize] {
        &self.cursor.rows
    }

    /// Number of bound rows.
    pub fn n_rows(&self) -> usize {
        self.cursor.rows.len()
    }

    /// See [`RowsAccessor::col_block_size`].
    pub fn col_block_size(&self) -> Option<usize> {
        self.current_column()
            .map(|c| self.matrix.col_blocks().block_size(c))
    }

    /// Whether bound row `k` has a tile at the current column.
    pub fn has_entry(&self, k: usize) -> bool {
        self.cursor.row_range(self.matrix, k).is_some()
    }

    /// Values of bound row `k` at the current column.
    pub fn row(&self, k: usize) -> Option<&[V]> {
        let range = self.cursor.row_range(self.matrix, k)?;
        Some(&self.matrix.values()[range])
    }

    /// Mutable values of bound row `k` at the current column.
    ///
    /// # Panics
    /// Panics if `k >= n_rows()`.
    pub fn row_mut(&mut self, k: usize) -> Option<&mut [V]> {
        let range = self.cursor.row_range(self.matrix, k)?;
        Some(&mut self.matrix.values_mut()[range])
    }
}

impl<V, S> ColumnCursor for RowsAccessorMut<'_, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    fn current_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    fn advance(&mut self) -> bool {
        self.cursor.advance()
    }
}
