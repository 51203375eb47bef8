#![cfg_attr(docsrs, feature(doc_cfg))]
//! # block-csr
//!
//! block-csr is a distributed block-structured sparse matrix store for
//! matrix-free finite element codes. Rows and columns are split into
//! contiguous blocks; every nonzero `(block-row, block-column)` pair owns one
//! dense tile. Bulk kernels read and write the matrix through row-oriented
//! accessors that walk only the block-columns that matter for the rows of one
//! unit of work.
//!
//! ## Features
//! - Block partitions with O(log n) global → (block, offset) resolution
//! - Dynamic sparsity patterns compressed into a CSR layout
//! - A tile store indexed by local block-rows, with owned rows and staged ghost rows
//! - Scalar and vectorized row accessors, with column synchronization between
//!   matrices of different sparsity
//! - Dense round-trips (`copy_to` / `copy_from`) for verification
//!
//! ## Cargo features
//! - `rayon`: parallel bulk tile operations (`zero_all`, `scale`, `frobenius_norm`)
//! - `check-invariants`: validate structural invariants after mutation in
//!   release builds too
//!
//! ## Concurrency
//!
//! Writes go through `&mut BlockCsrMatrix`, so there is at most one writer per
//! matrix. Read accessors share `&BlockCsrMatrix` and can run on many threads
//! at once. Schedulers that need concurrent scatter must color their units of
//! work upstream.

pub mod accessor;
pub mod algs;
pub mod bcsr_error;
pub mod bounds;
pub mod data;
pub mod debug_invariants;
pub mod matrix;
pub mod partitioner;
pub mod sparsity;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::accessor::dof_info::{DofInfo, RowGroup};
    pub use crate::accessor::rows::{RowsAccessor, RowsAccessorMut};
    pub use crate::accessor::rows_block::{ActiveRow, RowsBlockAccessor, RowsBlockAccessorMut};
    pub use crate::accessor::{ColumnCursor, synchronize, try_synchronize};
    pub use crate::algs::cell_loop::{CellLoopStats, cell_loop};
    pub use crate::bcsr_error::BlockCsrError;
    pub use crate::bounds::ValueLike;
    pub use crate::data::block_indices::BlockIndices;
    pub use crate::data::full_matrix::FullMatrix;
    pub use crate::data::storage::{Storage, VecStorage};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::matrix::{BlockCsrMatrix, StoreOptions, TileMut, TileRef, local_index};
    pub use crate::partitioner::{IndexPartitioner, Partitioner};
    pub use crate::sparsity::BlockSparsityPattern;
}
