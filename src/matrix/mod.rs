//! BlockCsrMatrix: distributed block-sparse matrix with dense tiles.
//!
//! The store owns one dense tile per nonzero `(block-row, block-column)` of a
//! compressed [`BlockSparsityPattern`], restricted to the block-rows that are
//! relevant on this process:
//!
//! - **owned** block-rows (their indices are owned by the partitioner), and
//! - **ghost** block-rows (not owned, but containing a ghost index), which
//!   serve as staging tiles for contributions that a separate exchange pass
//!   must ship to their owner.
//!
//! Block-rows are addressed by a *local* id: owned block-rows first in
//! ascending global order, then ghost block-rows in ascending global order.
//! All tiles share one flat buffer in local-row order, so the ghost tiles form
//! a contiguous tail.

pub mod tile;

use std::marker::PhantomData;
use std::ops::Range;
use std::sync::Arc;

use num_traits::Float;

use crate::bcsr_error::BlockCsrError;
use crate::bounds::ValueLike;
use crate::data::block_indices::BlockIndices;
use crate::data::full_matrix::FullMatrix;
use crate::data::storage::{Storage, VecStorage};
use crate::debug_invariants::DebugInvariants;
use crate::partitioner::{IndexPartitioner, Partitioner};
use crate::sparsity::BlockSparsityPattern;

pub use tile::{RowTiles, RowTilesMut, TileMut, TileRef, local_index};

/// Runtime options for [`BlockCsrMatrix::reinit_with_options`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Allocate staging tiles for ghost block-rows. When `false`, rows on
    /// ghost block-rows are rejected by the accessors.
    pub stage_ghost_rows: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            stage_ghost_rows: true,
        }
    }
}

/// Block-sparse matrix whose nonzero blocks are dense row-major tiles.
#[derive(Debug)]
pub struct BlockCsrMatrix<V, S = VecStorage<V>>
where
    S: Storage<V>,
{
    sparsity: Arc<BlockSparsityPattern>,
    row_blocks: Arc<BlockIndices>,
    col_blocks: Arc<BlockIndices>,
    partitioner: Arc<dyn IndexPartitioner>,
    /// Local block-row id → global block-row.
    local_rows: Vec<usize>,
    /// Global block-row → local block-row id.
    local_of_global: Vec<Option<usize>>,
    n_owned_rows: usize,
    /// CSR pointer from local block-row into `tile_offsets`.
    row_entry_start: Vec<usize>,
    /// Storage offset of every local tile, plus the total length.
    tile_offsets: Vec<usize>,
    values: S,
    _marker: PhantomData<V>,
}

impl<V, S> Default for BlockCsrMatrix<V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    fn default() -> Self {
        let mut sparsity = BlockSparsityPattern::new(0, 0);
        // Compressing an empty, fresh pattern cannot fail.
        let _ = sparsity.compress();
        Self {
            sparsity: Arc::new(sparsity),
            row_blocks: Arc::new(BlockIndices::default()),
            col_blocks: Arc::new(BlockIndices::default()),
            partitioner: Arc::new(Partitioner::serial(0)),
            local_rows: Vec::new(),
            local_of_global: Vec::new(),
            n_owned_rows: 0,
            row_entry_start: vec![0],
            tile_offsets: vec![0],
            values: S::with_len(0, V::zero()),
            _marker: PhantomData,
        }
    }
}

impl<V, S> BlockCsrMatrix<V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    /// Empty matrix; call [`reinit`](Self::reinit) before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate zeroed tiles for `sparsity` over the given partitions.
    ///
    /// # Errors
    /// - `NotCompressed` if `sparsity` was not compressed,
    /// - `NonContiguousOffsets`, `LengthMismatch`, `UnsortedRow` or
    ///   `BlockOutOfRange` if a partition or the sparsity is malformed,
    /// - `SparsityShapeMismatch` if its block counts differ from the partitions,
    /// - `PartitionSizeMismatch` if the partitioner does not cover the rows,
    /// - `BlockStraddlesOwnership` if a block-row is only partially owned.
    pub fn reinit(
        &mut self,
        sparsity: &BlockSparsityPattern,
        row_blocks: Arc<BlockIndices>,
        col_blocks: Arc<BlockIndices>,
        partitioner: Arc<dyn IndexPartitioner>,
    ) -> Result<(), BlockCsrError> {
        self.reinit_with_options(
            sparsity,
            row_blocks,
            col_blocks,
            partitioner,
            &StoreOptions::default(),
        )
    }

    /// [`reinit`](Self::reinit) with explicit [`StoreOptions`].
    pub fn reinit_with_options(
        &mut self,
        sparsity: &BlockSparsityPattern,
        row_blocks: Arc<BlockIndices>,
        col_blocks: Arc<BlockIndices>,
        partitioner: Arc<dyn IndexPartitioner>,
        options: &StoreOptions,
    ) -> Result<(), BlockCsrError> {
        if !sparsity.is_compressed() {
            return Err(BlockCsrError::NotCompressed);
        }
        row_blocks.validate_invariants()?;
        col_blocks.validate_invariants()?;
        sparsity.validate_invariants()?;
        if sparsity.n_block_rows() != row_blocks.n_blocks()
            || sparsity.n_block_cols() != col_blocks.n_blocks()
        {
            return Err(BlockCsrError::SparsityShapeMismatch {
                sparsity_rows: sparsity.n_block_rows(),
                sparsity_cols: sparsity.n_block_cols(),
                row_blocks: row_blocks.n_blocks(),
                col_blocks: col_blocks.n_blocks(),
            });
        }
        if partitioner.size() != row_blocks.total_size() {
            return Err(BlockCsrError::PartitionSizeMismatch {
                partitioner: partitioner.size(),
                rows: row_blocks.total_size(),
            });
        }

        let owned = owned_block_rows(&row_blocks, partitioner.as_ref())?;
        let ghosts = if options.stage_ghost_rows {
            ghost_block_rows(&row_blocks, partitioner.as_ref(), &owned)?
        } else {
            Vec::new()
        };

        let n_block_rows = row_blocks.n_blocks();
        let mut local_rows = Vec::with_capacity(owned.len() + ghosts.len());
        local_rows.extend((0..n_block_rows).filter(|&b| owned[b]));
        let n_owned_rows = local_rows.len();
        local_rows.extend_from_slice(&ghosts);

        let mut local_of_global = vec![None; n_block_rows];
        for (local, &global) in local_rows.iter().enumerate() {
            local_of_global[global] = Some(local);
        }

        let mut row_entry_start = Vec::with_capacity(local_rows.len() + 1);
        let mut tile_offsets = Vec::new();
        let mut total = 0usize;
        row_entry_start.push(0);
        for &global in &local_rows {
            let m = row_blocks.block_size(global);
            for &col in sparsity.row_slice(global) {
                tile_offsets.push(total);
                total += m * col_blocks.block_size(col);
            }
            row_entry_start.push(tile_offsets.len());
        }
        tile_offsets.push(total);

        log::debug!(
            "block matrix: {} owned + {} ghost block-rows, {} tiles, {} values",
            n_owned_rows,
            ghosts.len(),
            tile_offsets.len() - 1,
            total
        );

        self.sparsity = Arc::new(sparsity.clone());
        self.row_blocks = row_blocks;
        self.col_blocks = col_blocks;
        self.partitioner = partitioner;
        self.local_rows = local_rows;
        self.local_of_global = local_of_global;
        self.n_owned_rows = n_owned_rows;
        self.row_entry_start = row_entry_start;
        self.tile_offsets = tile_offsets;
        self.values = S::with_len(total, V::zero());
        crate::debug_invariants!(self.validate_invariants(), "BlockCsrMatrix invalid");
        Ok(())
    }

    /// Build a matrix over `sparsity` and fill it from `dense`.
    pub fn from_full(
        dense: &FullMatrix<V>,
        sparsity: &BlockSparsityPattern,
        row_blocks: Arc<BlockIndices>,
        col_blocks: Arc<BlockIndices>,
        partitioner: Arc<dyn IndexPartitioner>,
    ) -> Result<Self, BlockCsrError> {
        let mut matrix = Self::new();
        matrix.reinit(sparsity, row_blocks, col_blocks, partitioner)?;
        matrix.copy_from(dense)?;
        Ok(matrix)
    }

    /// Number of global rows.
    #[inline]
    pub fn m(&self) -> usize {
        self.row_blocks.total_size()
    }

    /// Number of global columns.
    #[inline]
    pub fn n(&self) -> usize {
        self.col_blocks.total_size()
    }

    /// Row partition.
    #[inline]
    pub fn row_blocks(&self) -> &Arc<BlockIndices> {
        &self.row_blocks
    }

    /// Column partition.
    #[inline]
    pub fn col_blocks(&self) -> &Arc<BlockIndices> {
        &self.col_blocks
    }

    /// The compressed pattern the tiles were allocated for.
    #[inline]
    pub fn sparsity_pattern(&self) -> &BlockSparsityPattern {
        &self.sparsity
    }

    /// The row index partitioner.
    #[inline]
    pub fn partitioner(&self) -> &Arc<dyn IndexPartitioner> {
        &self.partitioner
    }

    /// Number of owned block-rows.
    #[inline]
    pub fn n_local_row_blocks(&self) -> usize {
        self.n_owned_rows
    }

    /// Number of staged ghost block-rows.
    #[inline]
    pub fn n_ghost_row_blocks(&self) -> usize {
        self.local_rows.len() - self.n_owned_rows
    }

    /// Local id of a global block-row, if it is owned or staged.
    #[inline]
    pub fn local_row_block(&self, global_block: usize) -> Option<usize> {
        self.local_of_global.get(global_block).copied().flatten()
    }

    /// Global block-row of a local id.
    ///
    /// # Panics
    /// Panics if `local_row_block >= n_local_row_blocks() + n_ghost_row_blocks()`.
    #[inline]
    pub fn global_row_block(&self, local_row_block: usize) -> usize {
        self.local_rows[local_row_block]
    }

    /// Number of allocated tiles (owned and ghost).
    #[inline]
    pub fn n_tiles(&self) -> usize {
        self.tile_offsets.len() - 1
    }

    /// Number of stored scalar values (owned and ghost).
    #[inline]
    pub fn n_stored_elements(&self) -> usize {
        self.values.len()
    }

    /// Nonzero block-columns of a local block-row, ascending.
    #[inline]
    pub(crate) fn local_row_columns(&self, local_row_block: usize) -> &[usize] {
        self.sparsity.row_slice(self.local_rows[local_row_block])
    }

    /// Storage range of tile `(local_row_block, col_block)`, if stored.
    pub(crate) fn tile_range(&self, local_row_block: usize, col_block: usize) -> Option<Range<usize>> {
        let pos = self
            .local_row_columns(local_row_block)
            .binary_search(&col_block)
            .ok()?;
        Some(self.entry_range(local_row_block, pos))
    }

    /// Storage range of the `pos`-th tile of a local block-row.
    #[inline]
    pub(crate) fn entry_range(&self, local_row_block: usize, pos: usize) -> Range<usize> {
        let k = self.row_entry_start[local_row_block] + pos;
        self.tile_offsets[k]..self.tile_offsets[k + 1]
    }

    /// Resolve a global row to `(local_row_block, offset_in_block)`.
    pub(crate) fn locate_row(&self, row: usize) -> Result<(usize, usize), BlockCsrError> {
        let (block, offset) = self.row_blocks.global_to_local(row)?;
        let local = self
            .local_row_block(block)
            .ok_or(BlockCsrError::RowNotLocallyRelevant { row, block })?;
        Ok((local, offset))
    }

    #[inline]
    pub(crate) fn values(&self) -> &[V] {
        self.values.as_slice()
    }

    #[inline]
    pub(crate) fn values_mut(&mut self) -> &mut [V] {
        self.values.as_mut_slice()
    }

    fn check_local_row(&self, local_row_block: usize) -> Result<(), BlockCsrError> {
        if local_row_block >= self.local_rows.len() {
            return Err(BlockCsrError::BlockOutOfRange {
                block: local_row_block,
                n_blocks: self.local_rows.len(),
            });
        }
        Ok(())
    }

    /// Read-only tile at `(local_row_block, col_block)`.
    ///
    /// # Errors
    /// `BlockOutOfRange` for an unknown local block-row, `MissingTile` if the
    /// pair is not in the compressed sparsity.
    pub fn try_tile(
        &self,
        local_row_block: usize,
        col_block: usize,
    ) -> Result<TileRef<'_, V>, BlockCsrError> {
        self.check_local_row(local_row_block)?;
        let range = self
            .tile_range(local_row_block, col_block)
            .ok_or(BlockCsrError::MissingTile {
                row_block: local_row_block,
                col_block,
            })?;
        Ok(TileRef {
            column: col_block,
            rows: self.row_blocks.block_size(self.local_rows[local_row_block]),
            cols: self.col_blocks.block_size(col_block),
            data: &self.values.as_slice()[range],
        })
    }

    /// Read-only tile at `(local_row_block, col_block)`.
    ///
    /// # Panics
    /// Panics if the pair is not in the compressed sparsity; asking for a
    /// tile that does not exist is a contract violation.
    pub fn tile(&self, local_row_block: usize, col_block: usize) -> TileRef<'_, V> {
        match self.try_tile(local_row_block, col_block) {
            Ok(tile) => tile,
            Err(e) => panic!("BlockCsrMatrix::tile: {e}"),
        }
    }

    /// Mutable tile at `(local_row_block, col_block)`.
    ///
    /// # Panics
    /// Panics if the pair is not in the compressed sparsity.
    pub fn tile_mut(&mut self, local_row_block: usize, col_block: usize) -> TileMut<'_, V> {
        if let Err(e) = self.check_local_row(local_row_block) {
            panic!("BlockCsrMatrix::tile_mut: {e}");
        }
        let Some(range) = self.tile_range(local_row_block, col_block) else {
            panic!(
                "BlockCsrMatrix::tile_mut: {}",
                BlockCsrError::MissingTile {
                    row_block: local_row_block,
                    col_block
                }
            );
        };
        let rows = self.row_blocks.block_size(self.local_rows[local_row_block]);
        let cols = self.col_blocks.block_size(col_block);
        TileMut {
            column: col_block,
            rows,
            cols,
            data: &mut self.values.as_mut_slice()[range],
        }
    }

    /// Tiles of a local block-row in ascending column order.
    ///
    /// # Panics
    /// Panics if `local_row_block` is out of range.
    pub fn iter_row(&self, local_row_block: usize) -> RowTiles<'_, V> {
        let global = self.local_rows[local_row_block];
        let start = self.tile_offsets[self.row_entry_start[local_row_block]];
        let end = self.tile_offsets[self.row_entry_start[local_row_block + 1]];
        RowTiles {
            columns: self.sparsity.row_slice(global).iter(),
            col_blocks: &self.col_blocks,
            rows: self.row_blocks.block_size(global),
            rest: &self.values.as_slice()[start..end],
        }
    }

    /// Mutable tiles of a local block-row in ascending column order.
    ///
    /// # Panics
    /// Panics if `local_row_block` is out of range.
    pub fn iter_row_mut(&mut self, local_row_block: usize) -> RowTilesMut<'_, V> {
        let global = self.local_rows[local_row_block];
        let start = self.tile_offsets[self.row_entry_start[local_row_block]];
        let end = self.tile_offsets[self.row_entry_start[local_row_block + 1]];
        RowTilesMut {
            columns: self.sparsity.row_slice(global).iter(),
            col_blocks: &self.col_blocks,
            rows: self.row_blocks.block_size(global),
            rest: &mut self.values.as_mut_slice()[start..end],
        }
    }

    /// Staged ghost tiles as `(global_block_row, tile)`.
    pub fn ghost_tiles(&self) -> impl Iterator<Item = (usize, TileRef<'_, V>)> + '_ {
        (self.n_owned_rows..self.local_rows.len())
            .flat_map(move |local| self.iter_row(local).map(move |t| (self.local_rows[local], t)))
    }

    /// Position of `(i, j)` in the tile buffer.
    fn element_index(&self, i: usize, j: usize) -> Result<usize, BlockCsrError> {
        let (local, ii) = self.locate_row(i)?;
        let (col_block, jj) = self.col_blocks.global_to_local(j)?;
        let range = self
            .tile_range(local, col_block)
            .ok_or(BlockCsrError::MissingTile {
                row_block: local,
                col_block,
            })?;
        let m = self.row_blocks.block_size(self.local_rows[local]);
        let n = self.col_blocks.block_size(col_block);
        Ok(range.start + local_index(ii, jj, m, n))
    }

    /// Entry at global `(i, j)`; zero when the block is not stored.
    ///
    /// # Errors
    /// `IndexOutOfRange` outside the matrix, `RowNotLocallyRelevant` for a
    /// row on a block-row that is neither owned nor staged.
    pub fn el(&self, i: usize, j: usize) -> Result<V, BlockCsrError> {
        match self.element_index(i, j) {
            Ok(idx) => Ok(self.values.as_slice()[idx]),
            Err(BlockCsrError::MissingTile { .. }) => Ok(V::zero()),
            Err(e) => Err(e),
        }
    }

    /// Overwrite the entry at global `(i, j)`.
    ///
    /// # Errors
    /// As [`el`](Self::el), plus `MissingTile` when `(i, j)` has no tile.
    pub fn set(&mut self, i: usize, j: usize, value: V) -> Result<(), BlockCsrError> {
        let idx = self.element_index(i, j)?;
        self.values.as_mut_slice()[idx] = value;
        Ok(())
    }

    /// Accumulate into the entry at global `(i, j)`.
    pub fn add(&mut self, i: usize, j: usize, value: V) -> Result<(), BlockCsrError> {
        let idx = self.element_index(i, j)?;
        let slot = &mut self.values.as_mut_slice()[idx];
        *slot = *slot + value;
        Ok(())
    }

    /// Zero every tile, owned and ghost.
    pub fn zero_all(&mut self) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.values
                .as_mut_slice()
                .par_iter_mut()
                .for_each(|v| *v = V::zero());
        }
        #[cfg(not(feature = "rayon"))]
        self.values.as_mut_slice().fill(V::zero());
    }

    /// Zero the ghost staging tiles only.
    pub fn zero_ghosts(&mut self) {
        let start = self.ghost_values_start();
        self.values.as_mut_slice()[start..].fill(V::zero());
    }

    /// Multiply every stored value by `factor`.
    pub fn scale(&mut self, factor: V) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.values
                .as_mut_slice()
                .par_iter_mut()
                .for_each(|v| *v = *v * factor);
        }
        #[cfg(not(feature = "rayon"))]
        self.values
            .as_mut_slice()
            .iter_mut()
            .for_each(|v| *v = *v * factor);
    }

    /// Offset in the tile buffer where the ghost tail begins.
    #[inline]
    fn ghost_values_start(&self) -> usize {
        self.tile_offsets[self.row_entry_start[self.n_owned_rows]]
    }

    fn check_dense_shape(&self, dense: &FullMatrix<V>) -> Result<(), BlockCsrError> {
        if dense.shape() != (self.m(), self.n()) {
            return Err(BlockCsrError::DimensionMismatch {
                expected: (self.m(), self.n()),
                found: dense.shape(),
            });
        }
        Ok(())
    }

    /// Write this process's tiles into a dense matrix over the global space.
    ///
    /// `dense` is zeroed first; owned and staged ghost tiles are then added at
    /// their global positions. Summing the dense results of all processes
    /// gives the assembled global matrix.
    ///
    /// # Errors
    /// `DimensionMismatch` if `dense` is not `m() x n()`.
    pub fn copy_to(&self, dense: &mut FullMatrix<V>) -> Result<(), BlockCsrError> {
        self.check_dense_shape(dense)?;
        dense.set_zero();
        for local in 0..self.local_rows.len() {
            let row_start = self.row_blocks.block_start(self.local_rows[local]);
            for tile in self.iter_row(local) {
                let col_start = self.col_blocks.block_start(tile.column);
                for ii in 0..tile.rows {
                    let dst = &mut dense.row_mut(row_start + ii)[col_start..col_start + tile.cols];
                    for (d, &v) in dst.iter_mut().zip(tile.row(ii)) {
                        *d = *d + v;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fill every stored tile from the matching entries of `dense`.
    ///
    /// Entries of `dense` outside the stored blocks are ignored.
    ///
    /// # Errors
    /// `DimensionMismatch` if `dense` is not `m() x n()`.
    pub fn copy_from(&mut self, dense: &FullMatrix<V>) -> Result<(), BlockCsrError> {
        self.check_dense_shape(dense)?;
        let row_blocks = Arc::clone(&self.row_blocks);
        let col_blocks = Arc::clone(&self.col_blocks);
        for local in 0..self.local_rows.len() {
            let row_start = row_blocks.block_start(self.local_rows[local]);
            for tile in self.iter_row_mut(local) {
                let col_start = col_blocks.block_start(tile.column);
                for (ii, row) in tile.data.chunks_exact_mut(tile.cols).enumerate() {
                    row.copy_from_slice(
                        &dense.row(row_start + ii)[col_start..col_start + tile.cols],
                    );
                }
            }
        }
        Ok(())
    }
}

impl<V, S> BlockCsrMatrix<V, S>
where
    V: ValueLike + Float,
    S: Storage<V>,
{
    /// Frobenius norm over the owned tiles.
    pub fn frobenius_norm(&self) -> V {
        let owned = &self.values.as_slice()[..self.ghost_values_start()];
        #[cfg(feature = "rayon")]
        let sum = {
            use rayon::prelude::*;
            owned
                .par_iter()
                .map(|&v| v * v)
                .reduce(V::zero, |a, b| a + b)
        };
        #[cfg(not(feature = "rayon"))]
        let sum = owned.iter().fold(V::zero(), |acc, &v| acc + v * v);
        sum.sqrt()
    }
}

impl<V, S> BlockCsrMatrix<V, S>
where
    V: ValueLike + bytemuck::Pod,
    S: Storage<V>,
{
    /// Raw bytes of the ghost staging tiles, in local ghost-row order.
    ///
    /// The layout matches [`ghost_tiles`](Self::ghost_tiles), so an exchange
    /// pass can ship the bytes and the receiver can rebuild the tiles from
    /// the same sparsity pattern.
    pub fn ghost_tile_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values.as_slice()[self.ghost_values_start()..])
    }
}

impl<V, S> DebugInvariants for BlockCsrMatrix<V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "BlockCsrMatrix invalid");
    }

    fn validate_invariants(&self) -> Result<(), BlockCsrError> {
        self.row_blocks.validate_invariants()?;
        self.col_blocks.validate_invariants()?;
        self.sparsity.validate_invariants()?;
        if self.row_entry_start.len() != self.local_rows.len() + 1 {
            return Err(BlockCsrError::LengthMismatch {
                expected: self.local_rows.len() + 1,
                found: self.row_entry_start.len(),
            });
        }
        for (local, &global) in self.local_rows.iter().enumerate() {
            if self.local_of_global.get(global).copied().flatten() != Some(local) {
                return Err(BlockCsrError::BlockOutOfRange {
                    block: global,
                    n_blocks: self.local_of_global.len(),
                });
            }
            let n_entries = self.row_entry_start[local + 1] - self.row_entry_start[local];
            let expected = self.sparsity.row_slice(global).len();
            if n_entries != expected {
                return Err(BlockCsrError::LengthMismatch {
                    expected,
                    found: n_entries,
                });
            }
        }
        let total = self.tile_offsets.last().copied().unwrap_or(0);
        if total != self.values.len() {
            return Err(BlockCsrError::LengthMismatch {
                expected: total,
                found: self.values.len(),
            });
        }
        Ok(())
    }
}

/// Flag each block-row as owned, rejecting block-rows split by ownership.
fn owned_block_rows(
    row_blocks: &BlockIndices,
    partitioner: &dyn IndexPartitioner,
) -> Result<Vec<bool>, BlockCsrError> {
    (0..row_blocks.n_blocks())
        .map(|block| {
            let mut range = row_blocks.block_range(block);
            let owned = partitioner.in_local_range(range.start);
            if range.any(|g| partitioner.in_local_range(g) != owned) {
                return Err(BlockCsrError::BlockStraddlesOwnership { block });
            }
            Ok(owned)
        })
        .collect()
}

/// Sorted, unique non-owned block-rows that contain a ghost index.
fn ghost_block_rows(
    row_blocks: &BlockIndices,
    partitioner: &dyn IndexPartitioner,
    owned: &[bool],
) -> Result<Vec<usize>, BlockCsrError> {
    let first = partitioner.local_size();
    let mut ghosts = Vec::with_capacity(partitioner.n_ghost_indices());
    for slot in first..first + partitioner.n_ghost_indices() {
        let block = row_blocks.block_of(partitioner.local_to_global(slot)?)?;
        if !owned[block] {
            ghosts.push(block);
        }
    }
    ghosts.sort_unstable();
    ghosts.dedup();
    Ok(ghosts)
}

#[cfg(test)]
mod thread_safety {
    //! Shared readers need the store to cross threads.
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(BlockCsrMatrix<f64>: Send, Sync);
    assert_impl_all!(BlockCsrMatrix<f32>: Send, Sync);
}
