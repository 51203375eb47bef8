//! BlockCsrError: Unified error type for block-csr public APIs
//!
//! Configuration errors (malformed partitions, sparsity outside the
//! partitions) and bounds errors (global indices outside a partition) are
//! reported through this type. Contract violations inside the accessor
//! protocol panic instead; see the `# Panics` sections of the accessors.

use thiserror::Error;

/// Unified error type for block-csr operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockCsrError {
    /// A block partition was built from an invalid list of block sizes.
    #[error("Invalid block sizes: {0}")]
    InvalidBlockSizes(&'static str),
    /// A block offset table is not monotone and contiguous.
    #[error("Block offsets are not contiguous at block {block}: expected {expected}, found {found}")]
    NonContiguousOffsets {
        block: usize,
        expected: usize,
        found: usize,
    },
    /// A global index lies outside `[0, size)`.
    #[error("Index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },
    /// A block id lies outside `[0, n_blocks)`.
    #[error("Block {block} out of range for {n_blocks} blocks")]
    BlockOutOfRange { block: usize, n_blocks: usize },
    /// `compress` was called on an already compressed pattern, or `add` after it.
    #[error("Sparsity pattern is already compressed")]
    AlreadyCompressed,
    /// A query that requires the compressed form was made before `compress`.
    #[error("Sparsity pattern is not compressed")]
    NotCompressed,
    /// A compressed pattern contains a repeated or unsorted column.
    #[error("Sparsity row {row} is not strictly increasing at column {col}")]
    UnsortedRow { row: usize, col: usize },
    /// The sparsity pattern shape does not match the row/column partitions.
    #[error(
        "Sparsity has {sparsity_rows}x{sparsity_cols} blocks, partitions have {row_blocks}x{col_blocks}"
    )]
    SparsityShapeMismatch {
        sparsity_rows: usize,
        sparsity_cols: usize,
        row_blocks: usize,
        col_blocks: usize,
    },
    /// The index partitioner does not cover the row partition.
    #[error("Partitioner size {partitioner} does not match row partition size {rows}")]
    PartitionSizeMismatch { partitioner: usize, rows: usize },
    /// A block-row is only partially owned by this process.
    #[error("Block-row {block} straddles the ownership boundary of the partitioner")]
    BlockStraddlesOwnership { block: usize },
    /// A ghost index overlaps the owned range or is not sorted.
    #[error("Invalid ghost index {0}")]
    InvalidGhostIndex(usize),
    /// The requested global index is neither owned nor a ghost on this process.
    #[error("Global index {0} is not locally relevant")]
    GhostIndexNotFound(usize),
    /// `(row_block, col_block)` has no tile in the store.
    #[error("No tile stored for block ({row_block}, {col_block})")]
    MissingTile { row_block: usize, col_block: usize },
    /// A requested row lives on a block-row that is neither owned nor staged.
    #[error("Row {row} (block-row {block}) is not locally relevant")]
    RowNotLocallyRelevant { row: usize, block: usize },
    /// Two synchronized accessors could not agree on a column.
    #[error("Column mismatch: expected {expected}, lagging accessor found {found:?}")]
    ColumnMismatch {
        expected: usize,
        found: Option<usize>,
    },
    /// A dense matrix shape does not match the block matrix.
    #[error("Dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A buffer length does not match the expected length.
    #[error("Length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}
