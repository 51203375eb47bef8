//! Vectorized block-row accessor: one lane per block-row of a [`DofInfo`].
//!
//! Each lane walks the sorted nonzero columns of its own block-row. The
//! accessor's current column is the smallest column any live lane still has,
//! so a column that no lane stores is never presented. At each column,
//! [`process_active_rows_vectorized`](RowsBlockAccessor::process_active_rows_vectorized)
//! hands the callback the active `(offset, lane, position)` triples and one
//! tile slice per lane (`None` for lanes without a tile at this column).
//!
//! Tiles are row-major, so intra-block row `r` of a lane's tile starts at
//! `r * stride` where `stride` is the current column block size.

use std::ops::Range;

use crate::accessor::ColumnCursor;
use crate::accessor::dof_info::DofInfo;
use crate::bcsr_error::BlockCsrError;
use crate::bounds::ValueLike;
use crate::data::storage::{Storage, VecStorage};
use crate::matrix::BlockCsrMatrix;

/// A bound row that has a tile at the current column.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ActiveRow {
    /// Row offset inside the lane's block-row.
    pub offset: usize,
    /// Lane (group) index in the bound [`DofInfo`].
    pub lane: usize,
    /// Position of the row in the caller's row list.
    pub position: usize,
}

#[derive(Debug)]
struct Lane {
    local_row_block: usize,
    entries: Vec<(usize, usize)>,
    /// Next unvisited entry in the block-row's column list.
    pos: usize,
    len: usize,
}

impl Lane {
    #[inline]
    fn exhausted(&self) -> bool {
        self.pos >= self.len
    }
}

/// Lane state shared by the read and write accessors.
#[derive(Debug, Default)]
struct LaneCursor {
    lanes: Vec<Lane>,
    current: Option<usize>,
    bound: bool,
}

impl LaneCursor {
    fn bind<V, S>(
        &mut self,
        matrix: &BlockCsrMatrix<V, S>,
        dof_info: &DofInfo,
    ) -> Result<Option<usize>, BlockCsrError>
    where
        V: ValueLike,
        S: Storage<V>,
    {
        self.bound = false;
        let row_blocks = matrix.row_blocks();
        let mut lanes = Vec::with_capacity(dof_info.n_groups());
        for group in dof_info.groups() {
            // The DofInfo may have been resolved against another partition.
            if group.block_row >= row_blocks.n_blocks() {
                return Err(BlockCsrError::BlockOutOfRange {
                    block: group.block_row,
                    n_blocks: row_blocks.n_blocks(),
                });
            }
            let size = row_blocks.block_size(group.block_row);
            if let Some(&(offset, _)) = group.entries.iter().find(|&&(o, _)| o >= size) {
                return Err(BlockCsrError::IndexOutOfRange {
                    index: offset,
                    size,
                });
            }
            let local_row_block = matrix.local_row_block(group.block_row).ok_or_else(|| {
                let offset = group.entries.first().map_or(0, |&(o, _)| o);
                BlockCsrError::RowNotLocallyRelevant {
                    row: row_blocks.block_start(group.block_row) + offset,
                    block: group.block_row,
                }
            })?;
            lanes.push(Lane {
                local_row_block,
                entries: group.entries.clone(),
                pos: 0,
                len: matrix.local_row_columns(local_row_block).len(),
            });
        }
        self.lanes = lanes;
        self.bound = true;
        self.current = self.min_column(matrix);
        log::trace!(
            "rows block accessor bound: {} rows in {} lanes, first column {:?}",
            dof_info.n_rows(),
            self.lanes.len(),
            self.current
        );
        if self.current.is_none() && dof_info.n_rows() > 0 {
            log::warn!(
                "rows block accessor: {} lanes touch no nonzero column",
                self.lanes.len()
            );
        }
        Ok(self.current)
    }

    /// Column of `lane` at its cursor, `None` if the lane is exhausted.
    #[inline]
    fn lane_column<V, S>(&self, matrix: &BlockCsrMatrix<V, S>, lane: &Lane) -> Option<usize>
    where
        V: ValueLike,
        S: Storage<V>,
    {
        matrix
            .local_row_columns(lane.local_row_block)
            .get(lane.pos)
            .copied()
    }

    fn min_column<V, S>(&self, matrix: &BlockCsrMatrix<V, S>) -> Option<usize>
    where
        V: ValueLike,
        S: Storage<V>,
    {
        self.lanes
            .iter()
            .filter_map(|lane| self.lane_column(matrix, lane))
            .min()
    }

    #[inline]
    fn current(&self) -> Option<usize> {
        assert!(self.bound, "rows block accessor used before reinit");
        self.current
    }

    fn advance<V, S>(&mut self, matrix: &BlockCsrMatrix<V, S>) -> Option<usize>
    where
        V: ValueLike,
        S: Storage<V>,
    {
        let col = self.current()?;
        for lane in &mut self.lanes {
            let cols = matrix.local_row_columns(lane.local_row_block);
            if cols.get(lane.pos) == Some(&col) {
                lane.pos += 1;
            }
        }
        self.current = self.min_column(matrix);
        self.current
    }

    /// Lanes whose block-row stores the current column.
    fn active_lanes<'c, V, S>(
        &'c self,
        matrix: &'c BlockCsrMatrix<V, S>,
    ) -> impl Iterator<Item = usize> + 'c
    where
        V: ValueLike,
        S: Storage<V>,
    {
        let current = self.current();
        self.lanes
            .iter()
            .enumerate()
            .filter(move |(_, lane)| {
                current.is_some() && self.lane_column(matrix, lane) == current
            })
            .map(|(k, _)| k)
    }

    fn collect_active<V, S>(&self, matrix: &BlockCsrMatrix<V, S>, out: &mut Vec<ActiveRow>)
    where
        V: ValueLike,
        S: Storage<V>,
    {
        out.clear();
        for lane in self.active_lanes(matrix) {
            out.extend(
                self.lanes[lane]
                    .entries
                    .iter()
                    .map(|&(offset, position)| ActiveRow {
                        offset,
                        lane,
                        position,
                    }),
            );
        }
    }

    /// Fill `out` with `(lane, storage range)` of every active lane's tile.
    fn active_tiles<V, S>(&self, matrix: &BlockCsrMatrix<V, S>, out: &mut Vec<(usize, Range<usize>)>)
    where
        V: ValueLike,
        S: Storage<V>,
    {
        out.clear();
        out.extend(self.active_lanes(matrix).map(|k| {
            let lane = &self.lanes[k];
            (k, matrix.entry_range(lane.local_row_block, lane.pos))
        }));
    }
}

/// Empty a slot buffer and hand its allocation over to a new borrow.
fn recycle<'x, 'y, T: ?Sized>(mut buf: Vec<Option<&'x mut T>>) -> Vec<Option<&'y mut T>> {
    buf.clear();
    buf.into_iter().map(|_| None).collect()
}

/// Read-only vectorized accessor.
#[derive(Debug)]
pub struct RowsBlockAccessor<'a, V, S = VecStorage<V>>
where
    S: Storage<V>,
{
    matrix: &'a BlockCsrMatrix<V, S>,
    cursor: LaneCursor,
    active: Vec<ActiveRow>,
    ranges: Vec<(usize, Range<usize>)>,
    tiles: Vec<Option<&'a [V]>>,
}

impl<'a, V, S> RowsBlockAccessor<'a, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    /// Unbound accessor over `matrix`.
    pub fn new(matrix: &'a BlockCsrMatrix<V, S>) -> Self {
        Self {
            matrix,
            cursor: LaneCursor::default(),
            active: Vec::new(),
            ranges: Vec::new(),
            tiles: Vec::new(),
        }
    }

    /// Bind one lane per group of `dof_info`; returns the first column.
    ///
    /// # Errors
    /// `RowNotLocallyRelevant` if a group's block-row is neither owned nor
    /// staged. The accessor is unbound afterwards.
    pub fn reinit(&mut self, dof_info: &DofInfo) -> Result<Option<usize>, BlockCsrError> {
        self.cursor.bind(self.matrix, dof_info)
    }

    /// Current block-column, `None` once exhausted.
    ///
    /// # Panics
    /// Panics if the accessor was never bound.
    #[inline]
    pub fn get_current_block_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    /// Size of the current block-column.
    pub fn get_col_block_size(&self) -> Option<usize> {
        self.cursor
            .current()
            .map(|c| self.matrix.col_blocks().block_size(c))
    }

    /// Next column stored by at least one lane; `None` once exhausted.
    ///
    /// # Panics
    /// Panics if the accessor was never bound.
    pub fn advance(&mut self) -> Option<usize> {
        self.cursor.advance(self.matrix)
    }

    /// Number of bound lanes.
    pub fn n_lanes(&self) -> usize {
        self.cursor.lanes.len()
    }

    /// Whether `lane` has visited all of its columns.
    pub fn is_lane_exhausted(&self, lane: usize) -> bool {
        self.cursor.lanes[lane].exhausted()
    }

    /// Call `f(active, tiles, stride)` for the current column.
    ///
    /// `tiles[lane]` is the lane's whole tile or `None` when the lane has no
    /// tile here. Does nothing once exhausted.
    ///
    /// # Panics
    /// Panics if the accessor was never bound.
    pub fn process_active_rows_vectorized<F>(&mut self, mut f: F)
    where
        F: FnMut(&[ActiveRow], &[Option<&[V]>], usize),
    {
        let Some(stride) = self.get_col_block_size() else {
            return;
        };
        let matrix = self.matrix;
        self.cursor.collect_active(matrix, &mut self.active);
        self.cursor.active_tiles(matrix, &mut self.ranges);
        let values = matrix.values();
        self.tiles.clear();
        self.tiles.resize(self.cursor.lanes.len(), None);
        for (lane, range) in &self.ranges {
            self.tiles[*lane] = Some(&values[range.clone()]);
        }
        f(&self.active, &self.tiles, stride);
    }
}

impl<V, S> ColumnCursor for RowsBlockAccessor<'_, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    fn current_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    fn advance(&mut self) -> bool {
        RowsBlockAccessor::advance(self).is_some()
    }
}

/// Vectorized accessor with write access to the tiles.
#[derive(Debug)]
pub struct RowsBlockAccessorMut<'a, V, S = VecStorage<V>>
where
    S: Storage<V>,
{
    matrix: &'a mut BlockCsrMatrix<V, S>,
    cursor: LaneCursor,
    active: Vec<ActiveRow>,
    ranges: Vec<(usize, Range<usize>)>,
    /// Always empty between calls; only its allocation is kept.
    tile_buf: Vec<Option<&'a mut [V]>>,
}

impl<'a, V, S> RowsBlockAccessorMut<'a, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    /// Unbound accessor over `matrix`.
    pub fn new(matrix: &'a mut BlockCsrMatrix<V, S>) -> Self {
        Self {
            matrix,
            cursor: LaneCursor::default(),
            active: Vec::new(),
            ranges: Vec::new(),
            tile_buf: Vec::new(),
        }
    }

    /// See [`RowsBlockAccessor::reinit`].
    pub fn reinit(&mut self, dof_info: &DofInfo) -> Result<Option<usize>, BlockCsrError> {
        self.cursor.bind(self.matrix, dof_info)
    }

    /// See [`RowsBlockAccessor::get_current_block_column`].
    #[inline]
    pub fn get_current_block_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    /// See [`RowsBlockAccessor::get_col_block_size`].
    pub fn get_col_block_size(&self) -> Option<usize> {
        self.cursor
            .current()
            .map(|c| self.matrix.col_blocks().block_size(c))
    }

    /// See [`RowsBlockAccessor::advance`].
    pub fn advance(&mut self) -> Option<usize> {
        self.cursor.advance(self.matrix)
    }

    /// Number of bound lanes.
    pub fn n_lanes(&self) -> usize {
        self.cursor.lanes.len()
    }

    /// See [`RowsBlockAccessor::is_lane_exhausted`].
    pub fn is_lane_exhausted(&self, lane: usize) -> bool {
        self.cursor.lanes[lane].exhausted()
    }

    /// Call `f(active, tiles, stride)` with mutable tiles for the current
    /// column. Lanes are distinct block-rows, so their tiles never alias.
    ///
    /// # Panics
    /// Panics if the accessor was never bound.
    pub fn process_active_rows_vectorized<F>(&mut self, mut f: F)
    where
        F: FnMut(&[ActiveRow], &mut [Option<&mut [V]>], usize),
    {
        let Some(stride) = self.get_col_block_size() else {
            return;
        };
        self.cursor.collect_active(self.matrix, &mut self.active);
        self.cursor.active_tiles(self.matrix, &mut self.ranges);
        self.ranges.sort_unstable_by_key(|(_, r)| r.start);

        let mut tiles = recycle(std::mem::take(&mut self.tile_buf));
        tiles.resize_with(self.cursor.lanes.len(), || None);
        let mut rest = self.matrix.values_mut();
        let mut consumed = 0;
        for (lane, range) in &self.ranges {
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(range.start - consumed);
            let (tile, tail) = tail.split_at_mut(range.len());
            tiles[*lane] = Some(tile);
            rest = tail;
            consumed = range.end;
        }
        f(&self.active, &mut tiles, stride);
        self.tile_buf = recycle(tiles);
    }
}

impl<V, S> ColumnCursor for RowsBlockAccessorMut<'_, V, S>
where
    V: ValueLike,
    S: Storage<V>,
{
    fn current_column(&self) -> Option<usize> {
        self.cursor.current()
    }

    fn advance(&mut self) -> bool {
        RowsBlockAccessorMut::advance(self).is_some()
    }
}
