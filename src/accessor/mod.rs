//! Row-oriented accessors over a [`BlockCsrMatrix`](crate::matrix::BlockCsrMatrix).
//!
//! An accessor is bound to the rows touched by one unit of work and then
//! walks the ascending block-columns that are nonzero for at least one of
//! them. Two flavours exist:
//!
//! - [`rows`]: scalar accessor over an explicit row list, one row at a time.
//! - [`rows_block`]: vectorized accessor over a [`DofInfo`](dof_info::DofInfo),
//!   one lane per block-row, handing whole tiles to a callback.
//!
//! Read accessors borrow the matrix shared and may run on many threads at
//! once; write accessors borrow it exclusively.
//!
//! Accessors over matrices with different sparsity are kept in lock-step with
//! [`synchronize`]: the lagging cursor is advanced until it reaches the
//! leading column.

pub mod dof_info;
pub mod rows;
pub mod rows_block;

use crate::bcsr_error::BlockCsrError;

pub use dof_info::{DofInfo, RowGroup};
pub use rows::{RowsAccessor, RowsAccessorMut};
pub use rows_block::{ActiveRow, RowsBlockAccessor, RowsBlockAccessorMut};

/// A cursor over an ascending sequence of block-columns.
pub trait ColumnCursor {
    /// Current block-column, or `None` once exhausted.
    fn current_column(&self) -> Option<usize>;

    /// Step to the next block-column. Returns `false` once exhausted and
    /// keeps returning `false` afterwards.
    fn advance(&mut self) -> bool;
}

/// Advance `lagging` until its current column equals `column`.
///
/// # Errors
/// `ColumnMismatch` if `lagging` skips past `column` or runs out first. The
/// cursor is left where the search stopped.
pub fn try_synchronize<C>(lagging: &mut C, column: usize) -> Result<(), BlockCsrError>
where
    C: ColumnCursor + ?Sized,
{
    loop {
        match lagging.current_column() {
            Some(c) if c == column => return Ok(()),
            Some(c) if c < column => {
                lagging.advance();
            }
            found => {
                return Err(BlockCsrError::ColumnMismatch {
                    expected: column,
                    found,
                });
            }
        }
    }
}

/// Advance `lagging` until its current column equals `column`.
///
/// # Panics
/// Panics if the columns cannot be realigned: the two matrices disagree on
/// which columns matter for the bound rows.
pub fn synchronize<C>(lagging: &mut C, column: usize)
where
    C: ColumnCursor + ?Sized,
{
    if let Err(e) = try_synchronize(lagging, column) {
        panic!("accessor synchronization failed: {e}");
    }
}
