#![allow(dead_code)]
use std::sync::Arc;

use block_csr::data::block_indices::BlockIndices;
use block_csr::data::full_matrix::FullMatrix;
use block_csr::matrix::BlockCsrMatrix;
use block_csr::partitioner::Partitioner;
use block_csr::sparsity::BlockSparsityPattern;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const ROW_BLOCKS: [usize; 4] = [3, 2, 1, 2];
pub const COL_BLOCKS: [usize; 5] = [2, 2, 1, 1, 3];
pub const SCENARIO_ENTRIES: [(usize, usize); 9] = [
    (0, 0),
    (0, 3),
    (1, 1),
    (1, 4),
    (2, 0),
    (2, 3),
    (2, 4),
    (3, 0),
    (3, 1),
];

/// Compressed pattern from an entry list.
pub fn pattern(n_rows: usize, n_cols: usize, entries: &[(usize, usize)]) -> BlockSparsityPattern {
    let mut sp = BlockSparsityPattern::new(n_rows, n_cols);
    for &(r, c) in entries {
        sp.add(r, c).unwrap();
    }
    sp.compress().unwrap();
    sp
}

pub fn blocks(sizes: &[usize]) -> Arc<BlockIndices> {
    Arc::new(BlockIndices::new(sizes.to_vec()).unwrap())
}

/// Serial matrix over `row_sizes x col_sizes` with the given entries, zeroed.
pub fn serial_matrix(
    row_sizes: &[usize],
    col_sizes: &[usize],
    entries: &[(usize, usize)],
) -> BlockCsrMatrix<f64> {
    let rows = blocks(row_sizes);
    let cols = blocks(col_sizes);
    let sp = pattern(rows.n_blocks(), cols.n_blocks(), entries);
    let part = Arc::new(Partitioner::serial(rows.total_size()));
    let mut a = BlockCsrMatrix::new();
    a.reinit(&sp, rows, cols, part).unwrap();
    a
}

/// Dense matrix with every entry nonzero: `a(i, j) = 1 + 100 i + j`.
pub fn numbered_dense(m: usize, n: usize) -> FullMatrix<f64> {
    let data = (0..m * n)
        .map(|k| 1.0 + 100.0 * (k / n) as f64 + (k % n) as f64)
        .collect();
    FullMatrix::from_row_major(m, n, data).unwrap()
}

/// Dense matrix of uniform values in `[-1, 1)` from a fixed seed.
pub fn random_dense(m: usize, n: usize, seed: u64) -> FullMatrix<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let data = (0..m * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    FullMatrix::from_row_major(m, n, data).unwrap()
}

/// The block layout used by the end-to-end scenario, filled with
/// [`numbered_dense`] values on every stored entry.
pub fn scenario_matrix() -> BlockCsrMatrix<f64> {
    let mut a = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &SCENARIO_ENTRIES);
    a.copy_from(&numbered_dense(a.m(), a.n())).unwrap();
    a
}
