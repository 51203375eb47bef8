//! Bulk kernel driver: per-cell source/destination accessor loop.
//!
//! For every unit of work (a cell's row list) the driver binds a read
//! accessor on the source matrix and a write accessor on the destination,
//! walks the source's nonzero columns, brings the destination into step with
//! [`synchronize`](crate::accessor::synchronize), and calls the kernel once
//! per shared column.
//!
//! # Example
//! ```rust
//! # fn try_main() -> Result<(), block_csr::bcsr_error::BlockCsrError> {
//! use std::sync::Arc;
//! use block_csr::algs::cell_loop;
//! use block_csr::data::block_indices::BlockIndices;
//! use block_csr::matrix::BlockCsrMatrix;
//! use block_csr::partitioner::Partitioner;
//! use block_csr::sparsity::BlockSparsityPattern;
//!
//! let rows = Arc::new(BlockIndices::new(vec![2, 2])?);
//! let cols = Arc::new(BlockIndices::new(vec![1, 1])?);
//! let mut sp = BlockSparsityPattern::new(2, 2);
//! sp.add(0, 0)?;
//! sp.add(1, 1)?;
//! sp.compress()?;
//! let part = Arc::new(Partitioner::serial(4));
//! let mut src = BlockCsrMatrix::<f64>::new();
//! src.reinit(&sp, rows.clone(), cols.clone(), part.clone())?;
//! src.set(0, 0, 2.0)?;
//! let mut dst = BlockCsrMatrix::<f64>::new();
//! dst.reinit(&sp, rows, cols, part)?;
//!
//! let stats = cell_loop(&mut dst, &src, [vec![0, 1], vec![2, 3]], |s, d| {
//!     for k in 0..s.n_rows() {
//!         if let (Some(x), Some(y)) = (s.row(k), d.row_mut(k)) {
//!             y[0] += 3.0 * x[0];
//!         }
//!     }
//! })?;
//! assert_eq!(stats.cells, 2);
//! assert_eq!(stats.nonzero_columns, 2);
//! assert_eq!(dst.el(0, 0)?, 6.0);
//! # Ok(())
//! # }
//! ```

use std::borrow::Borrow;

use crate::accessor::rows::{RowsAccessor, RowsAccessorMut};
use crate::accessor::synchronize;
use crate::bcsr_error::BlockCsrError;
use crate::bounds::ValueLike;
use crate::data::storage::Storage;
use crate::matrix::BlockCsrMatrix;

/// Counters reported by [`cell_loop`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellLoopStats {
    /// Units of work processed.
    pub cells: usize,
    /// Kernel invocations, summed over cells.
    pub nonzero_columns: usize,
}

/// Run `kernel` over every source column of every cell.
///
/// # Errors
/// Propagates accessor binding errors (a row outside either matrix).
///
/// # Panics
/// Panics if the destination does not store a column the source visits for
/// the same rows.
pub fn cell_loop<V, S, D, I, R, F>(
    dst: &mut BlockCsrMatrix<V, D>,
    src: &BlockCsrMatrix<V, S>,
    cells: I,
    mut kernel: F,
) -> Result<CellLoopStats, BlockCsrError>
where
    V: ValueLike,
    S: Storage<V>,
    D: Storage<V>,
    I: IntoIterator<Item = R>,
    R: Borrow<[usize]>,
    F: FnMut(&RowsAccessor<'_, V, S>, &mut RowsAccessorMut<'_, V, D>),
{
    let mut src_rows = RowsAccessor::new(src);
    let mut dst_rows = RowsAccessorMut::new(dst);
    let mut stats = CellLoopStats::default();

    for cell in cells {
        let rows: &[usize] = cell.borrow();
        stats.cells += 1;
        src_rows.reinit(rows)?;
        dst_rows.reinit(rows)?;
        while let Some(col) = src_rows.current_column() {
            synchronize(&mut dst_rows, col);
            kernel(&src_rows, &mut dst_rows);
            stats.nonzero_columns += 1;
            src_rows.advance();
        }
    }

    log::debug!(
        "cell loop: {} nonzero columns over {} cells",
        stats.nonzero_columns,
        stats.cells
    );
    Ok(stats)
}
