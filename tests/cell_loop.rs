mod util;

use block_csr::accessor::{RowsAccessor, RowsAccessorMut};
use block_csr::algs::cell_loop::{CellLoopStats, cell_loop};
use block_csr::data::full_matrix::FullMatrix;
use util::*;

/// Cells of the scenario layout; rows 2 and 7 are shared, row 7 repeats.
fn cells() -> Vec<Vec<usize>> {
    vec![vec![0, 1, 2], vec![2, 3, 4], vec![5, 6, 7], vec![7, 7]]
}

/// `dst_row += factor * src_row` for every bound row present at the column.
fn axpy_kernel(
    factor: f64,
) -> impl FnMut(&RowsAccessor<'_, f64>, &mut RowsAccessorMut<'_, f64>) {
    move |src: &RowsAccessor<'_, f64>, dst: &mut RowsAccessorMut<'_, f64>| {
        for k in 0..src.n_rows() {
            if let (Some(x), Some(y)) = (src.row(k), dst.row_mut(k)) {
                for (y, x) in y.iter_mut().zip(x) {
                    *y += factor * x;
                }
            }
        }
    }
}

#[test]
fn accessor_path_matches_dense_arithmetic() {
    let mut src = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &SCENARIO_ENTRIES);
    src.copy_from(&random_dense(8, 9, 42)).unwrap();
    let mut dst = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &SCENARIO_ENTRIES);

    let stats = cell_loop(&mut dst, &src, cells(), axpy_kernel(2.0)).unwrap();
    assert_eq!(stats.cells, 4);

    let mut src_dense = FullMatrix::zeros(8, 9);
    src.copy_to(&mut src_dense).unwrap();
    let mut expected = FullMatrix::zeros(8, 9);
    for cell in cells() {
        for r in cell {
            for (e, &s) in expected.row_mut(r).iter_mut().zip(src_dense.row(r)) {
                *e += 2.0 * s;
            }
        }
    }

    let mut got = FullMatrix::zeros(8, 9);
    dst.copy_to(&mut got).unwrap();
    let mut diff = got.clone();
    diff.add(-1.0, &expected).unwrap();
    assert!(diff.linfty_norm() < 1e-12, "max row error {}", diff.linfty_norm());
}

#[test]
fn counts_source_columns_per_cell() {
    let src = scenario_matrix();
    let mut dst = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &SCENARIO_ENTRIES);
    // Unions: {0,3}, {0,1,3,4}, {0,1,3,4}, {0,1}.
    let stats = cell_loop(&mut dst, &src, cells(), |_, _| {}).unwrap();
    assert_eq!(
        stats,
        CellLoopStats {
            cells: 4,
            nonzero_columns: 12
        }
    );
}

#[test]
fn destination_superset_is_skipped_where_source_is_empty() {
    let mut src = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &[(0, 3), (3, 1)]);
    src.copy_from(&numbered_dense(8, 9)).unwrap();
    let mut dst = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &SCENARIO_ENTRIES);
    let stats = cell_loop(&mut dst, &src, [[0usize, 6]], axpy_kernel(1.0)).unwrap();
    assert_eq!(stats.nonzero_columns, 2);
    // Block (0, 3) holds column 5, block (3, 1) columns 2..4.
    assert_eq!(dst.el(0, 5).unwrap(), 6.0);
    assert_eq!(dst.el(6, 2).unwrap(), 603.0);
    // Column 0 is stored in dst but empty in src: untouched.
    assert_eq!(dst.el(0, 0).unwrap(), 0.0);
}

#[test]
fn empty_cells_are_counted_without_columns() {
    let src = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &[(0, 0)]);
    let mut dst = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &[(0, 0)]);
    let cells: [&[usize]; 2] = [&[], &[5]];
    let stats = cell_loop(&mut dst, &src, cells, |_, _| panic!("no column")).unwrap();
    assert_eq!(stats.cells, 2);
    assert_eq!(stats.nonzero_columns, 0);
}

#[test]
#[should_panic(expected = "accessor synchronization failed")]
fn destination_missing_source_column_panics() {
    let src = scenario_matrix();
    let mut dst = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &[(0, 3)]);
    let _ = cell_loop(&mut dst, &src, [vec![0]], |_, _| {});
}
