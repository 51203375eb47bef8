mod util;

use std::collections::BTreeSet;

use block_csr::accessor::dof_info::DofInfo;
use block_csr::accessor::rows::{RowsAccessor, RowsAccessorMut};
use block_csr::accessor::rows_block::RowsBlockAccessor;
use block_csr::matrix::BlockCsrMatrix;
use proptest::prelude::*;
use util::*;

type Layout = (Vec<usize>, Vec<usize>, Vec<(usize, usize)>, Vec<usize>);

/// Row block sizes, column block sizes, pattern entries and a row list.
fn layout() -> impl Strategy<Value = Layout> {
    (
        prop::collection::vec(1usize..4, 1..5),
        prop::collection::vec(1usize..4, 1..6),
    )
        .prop_flat_map(|(rows, cols)| {
            let (nr, nc) = (rows.len(), cols.len());
            let m: usize = rows.iter().sum();
            (
                Just(rows),
                Just(cols),
                prop::collection::vec((0..nr, 0..nc), 0..12),
                prop::collection::vec(0..m, 0..6),
            )
        })
}

fn expected_columns(a: &BlockCsrMatrix<f64>, bound: &[usize]) -> Vec<usize> {
    let mut set = BTreeSet::new();
    for &r in bound {
        let block = a.row_blocks().block_of(r).unwrap();
        set.extend(a.sparsity_pattern().columns_of(block).unwrap());
    }
    set.into_iter().collect()
}

proptest! {
    #[test]
    fn scalar_accessor_visits_exact_union((rows, cols, entries, bound) in layout()) {
        let a = serial_matrix(&rows, &cols, &entries);
        let mut acc = RowsAccessor::new(&a);
        let first = acc.reinit(&bound).unwrap();
        let mut seen = Vec::new();
        while let Some(c) = acc.current_column() {
            seen.push(c);
            acc.advance();
        }
        prop_assert_eq!(first, seen.first().copied());
        prop_assert_eq!(seen, expected_columns(&a, &bound));
        // Exhaustion is sticky.
        prop_assert!(!acc.advance());
        prop_assert!(!acc.advance());
        prop_assert_eq!(acc.current_column(), None);
    }

    #[test]
    fn vectorized_accessor_agrees_with_scalar((rows, cols, entries, bound) in layout()) {
        let a = serial_matrix(&rows, &cols, &entries);
        let info = DofInfo::initialize(&bound, a.row_blocks()).unwrap();
        let mut acc = RowsBlockAccessor::new(&a);
        let mut seen = Vec::new();
        let mut col = acc.reinit(&info).unwrap();
        while let Some(c) = col {
            let mut n_active = 0;
            acc.process_active_rows_vectorized(|active, _, _| n_active = active.len());
            // A presented column always has at least one active row.
            prop_assert!(n_active > 0);
            seen.push(c);
            col = acc.advance();
        }
        prop_assert_eq!(seen, expected_columns(&a, &bound));
        prop_assert_eq!(acc.advance(), None);
    }

    #[test]
    fn accessor_writes_read_back_by_global_index((rows, cols, entries, bound) in layout()) {
        let mut a = serial_matrix(&rows, &cols, &entries);
        let col_blocks = a.col_blocks().clone();
        let value = |i: usize, j: usize| 1.0 + (i * 1000 + j) as f64;
        {
            let mut acc = RowsAccessorMut::new(&mut a);
            acc.reinit(&bound).unwrap();
            while let Some(c) = acc.current_column() {
                let start = col_blocks.block_start(c);
                for (k, &i) in bound.iter().enumerate() {
                    if let Some(row) = acc.row_mut(k) {
                        for (jj, slot) in row.iter_mut().enumerate() {
                            *slot = value(i, start + jj);
                        }
                    }
                }
                acc.advance();
            }
        }
        for &i in &bound {
            let block = a.row_blocks().block_of(i).unwrap();
            for c in a.sparsity_pattern().columns_of(block).unwrap() {
                for j in col_blocks.block_range(c) {
                    prop_assert_eq!(a.el(i, j).unwrap(), value(i, j));
                }
            }
        }
    }
}
