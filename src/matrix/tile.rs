//! Tile views: the dense rectangle behind one nonzero block.
//!
//! Every tile is stored row-major: entry `(i, j)` of an `m x n` tile lives at
//! [`local_index(i, j, m, n)`](local_index) `= i * n + j`. The read path,
//! the write path and the dense round-trip all go through this one rule, and
//! the stride between consecutive intra-block rows is therefore `n`.

use std::sync::Arc;

use crate::data::block_indices::BlockIndices;

/// Flattened position of `(i, j)` inside an `m x n` tile.
#[inline(always)]
pub const fn local_index(i: usize, j: usize, m: usize, n: usize) -> usize {
    debug_assert!(i < m && j < n);
    i * n + j
}

/// Read-only view of one tile.
#[derive(Clone, Copy, Debug)]
pub struct TileRef<'a, V> {
    /// Block-column of the tile.
    pub column: usize,
    /// Tile height (row block size).
    pub rows: usize,
    /// Tile width (column block size).
    pub cols: usize,
    /// Row-major values, `rows * cols` long.
    pub data: &'a [V],
}

impl<'a, V: Copy> TileRef<'a, V> {
    /// Entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> V {
        self.data[local_index(i, j, self.rows, self.cols)]
    }

    /// Intra-block row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &'a [V] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

/// Mutable view of one tile.
#[derive(Debug)]
pub struct TileMut<'a, V> {
    /// Block-column of the tile.
    pub column: usize,
    /// Tile height (row block size).
    pub rows: usize,
    /// Tile width (column block size).
    pub cols: usize,
    /// Row-major values, `rows * cols` long.
    pub data: &'a mut [V],
}

impl<V: Copy> TileMut<'_, V> {
    /// Entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> V {
        self.data[local_index(i, j, self.rows, self.cols)]
    }

    /// Overwrite entry `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: V) {
        self.data[local_index(i, j, self.rows, self.cols)] = value;
    }
}

/// Tiles of one block-row in ascending column order.
pub struct RowTiles<'a, V> {
    pub(crate) columns: std::slice::Iter<'a, usize>,
    pub(crate) col_blocks: &'a Arc<BlockIndices>,
    pub(crate) rows: usize,
    pub(crate) rest: &'a [V],
}

impl<'a, V> Iterator for RowTiles<'a, V> {
    type Item = TileRef<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let &column = self.columns.next()?;
        let cols = self.col_blocks.block_size(column);
        let (data, rest) = self.rest.split_at(self.rows * cols);
        self.rest = rest;
        Some(TileRef {
            column,
            rows: self.rows,
            cols,
            data,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.columns.size_hint()
    }
}

/// Mutable tiles of one block-row in ascending column order.
pub struct RowTilesMut<'a, V> {
    pub(crate) columns: std::slice::Iter<'a, usize>,
    pub(crate) col_blocks: &'a Arc<BlockIndices>,
    pub(crate) rows: usize,
    pub(crate) rest: &'a mut [V],
}

impl<'a, V> Iterator for RowTilesMut<'a, V> {
    type Item = TileMut<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let &column = self.columns.next()?;
        let cols = self.col_blocks.block_size(column);
        let (data, rest) = std::mem::take(&mut self.rest).split_at_mut(self.rows * cols);
        self.rest = rest;
        Some(TileMut {
            column,
            rows: self.rows,
            cols,
            data,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.columns.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_index_is_row_major() {
        assert_eq!(local_index(0, 0, 3, 2), 0);
        assert_eq!(local_index(0, 1, 3, 2), 1);
        assert_eq!(local_index(1, 0, 3, 2), 2);
        assert_eq!(local_index(2, 1, 3, 2), 5);
    }

    #[test]
    fn tile_ref_rows_are_contiguous() {
        let data = [1, 2, 3, 4, 5, 6];
        let t = TileRef {
            column: 0,
            rows: 2,
            cols: 3,
            data: &data,
        };
        assert_eq!(t.row(1), &[4, 5, 6]);
        assert_eq!(t.get(0, 2), 3);
    }
}
