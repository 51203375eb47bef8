mod util;

use block_csr::accessor::dof_info::DofInfo;
use block_csr::accessor::rows::RowsAccessor;
use block_csr::accessor::rows_block::{ActiveRow, RowsBlockAccessor, RowsBlockAccessorMut};
use block_csr::bcsr_error::BlockCsrError;
use block_csr::data::block_indices::BlockIndices;
use block_csr::data::full_matrix::FullMatrix;
use util::*;

const BOUND_ROWS: [usize; 4] = [1, 2, 3, 7];

#[test]
fn scenario_skips_empty_column() {
    let a = scenario_matrix();
    let info = DofInfo::initialize(&BOUND_ROWS, a.row_blocks()).unwrap();
    assert_eq!(info.n_groups(), 3);

    let mut acc = RowsBlockAccessor::new(&a);
    let mut seen = vec![acc.reinit(&info).unwrap().unwrap()];
    while let Some(c) = acc.advance() {
        seen.push(c);
    }
    assert_eq!(seen, vec![0, 1, 3, 4]);
    assert_eq!(acc.advance(), None);
    assert_eq!(acc.get_current_block_column(), None);
}

#[test]
fn scenario_zeroes_bound_rows_only() {
    let mut a = scenario_matrix();
    let mut before = FullMatrix::zeros(8, 9);
    a.copy_to(&mut before).unwrap();

    let info = DofInfo::initialize(&BOUND_ROWS, a.row_blocks()).unwrap();
    let mut visited = Vec::new();
    {
        let mut acc = RowsBlockAccessorMut::new(&mut a);
        let mut col = acc.reinit(&info).unwrap();
        while let Some(c) = col {
            visited.push(c);
            assert_eq!(acc.get_col_block_size(), Some(COL_BLOCKS[c]));
            acc.process_active_rows_vectorized(|active, tiles, stride| {
                for row in active {
                    let tile = tiles[row.lane].as_deref_mut().unwrap();
                    tile[row.offset * stride..(row.offset + 1) * stride].fill(0.0);
                }
            });
            col = acc.advance();
        }
    }
    assert_eq!(visited, vec![0, 1, 3, 4]);

    let mut after = FullMatrix::zeros(8, 9);
    a.copy_to(&mut after).unwrap();
    for i in 0..8 {
        for j in 0..9 {
            if BOUND_ROWS.contains(&i) {
                assert_eq!(after[(i, j)], 0.0, "bound entry ({i}, {j})");
            } else {
                assert_eq!(after[(i, j)], before[(i, j)], "unbound entry ({i}, {j})");
            }
        }
    }
    // Row 4 shares block-row 1 with bound row 3 and must keep its values.
    assert_ne!(after[(4, 2)], 0.0);
}

#[test]
fn active_lists_follow_lane_patterns() {
    let a = scenario_matrix();
    let info = DofInfo::initialize(&BOUND_ROWS, a.row_blocks()).unwrap();
    let mut acc = RowsBlockAccessor::new(&a);
    acc.reinit(&info).unwrap();
    assert_eq!(acc.n_lanes(), 3);

    // Lanes: 0 = block-row 0 (rows 1, 2), 1 = block-row 1 (row 3),
    // 2 = block-row 3 (row 7).
    let mut per_column = Vec::new();
    loop {
        acc.process_active_rows_vectorized(|active, tiles, _| {
            let lanes: Vec<usize> = active.iter().map(|r| r.lane).collect();
            let present: Vec<bool> = tiles.iter().map(Option::is_some).collect();
            per_column.push((lanes, present));
        });
        if acc.advance().is_none() {
            break;
        }
    }
    assert_eq!(
        per_column,
        vec![
            (vec![0, 0, 2], vec![true, false, true]),
            (vec![1, 2], vec![false, true, true]),
            (vec![0, 0], vec![true, false, false]),
            (vec![1], vec![false, true, false]),
        ]
    );
}

#[test]
fn vectorized_reads_match_scalar_reads() {
    let a = scenario_matrix();
    let rows = [7, 2, 5, 2];
    let info = DofInfo::initialize(&rows, a.row_blocks()).unwrap();
    let mut block = RowsBlockAccessor::new(&a);
    let mut scalar = RowsAccessor::new(&a);
    block.reinit(&info).unwrap();
    scalar.reinit(&rows).unwrap();

    loop {
        assert_eq!(block.get_current_block_column(), scalar.current_column());
        block.process_active_rows_vectorized(|active, tiles, stride| {
            for &ActiveRow {
                offset,
                lane,
                position,
            } in active
            {
                let tile = tiles[lane].unwrap();
                let from_block = &tile[offset * stride..(offset + 1) * stride];
                assert_eq!(Some(from_block), scalar.row(position));
            }
        });
        let b = block.advance();
        scalar.advance();
        if b.is_none() {
            break;
        }
    }
    assert_eq!(scalar.current_column(), None);
}

#[test]
fn duplicate_rows_are_distinct_slots() {
    let mut a = scenario_matrix();
    let rows = [3, 3, 4];
    let info = DofInfo::initialize(&rows, a.row_blocks()).unwrap();
    let mut acc = RowsBlockAccessorMut::new(&mut a);
    acc.reinit(&info).unwrap();
    let mut positions = Vec::new();
    acc.process_active_rows_vectorized(|active, _, _| {
        positions.extend(active.iter().map(|r| (r.offset, r.position)));
    });
    assert_eq!(positions, vec![(0, 0), (0, 1), (1, 2)]);
}

#[test]
fn duplicate_positions_write_independently() {
    let mut a = serial_matrix(&ROW_BLOCKS, &COL_BLOCKS, &SCENARIO_ENTRIES);
    let rows = [3, 4, 3];
    let info = DofInfo::initialize(&rows, a.row_blocks()).unwrap();
    let mut per_position = [0.0; 3];
    {
        let mut acc = RowsBlockAccessorMut::new(&mut a);
        let mut col = acc.reinit(&info).unwrap();
        while col.is_some() {
            acc.process_active_rows_vectorized(|active, tiles, stride| {
                for row in active {
                    let tile = tiles[row.lane].as_deref_mut().unwrap();
                    let value = 10f64.powi(row.position as i32);
                    for v in &mut tile[row.offset * stride..(row.offset + 1) * stride] {
                        *v += value;
                    }
                    per_position[row.position] += value;
                }
            });
            col = acc.advance();
        }
    }
    // Two columns visited; positions 0 and 2 both hit row 3.
    assert_eq!(per_position, [2.0, 20.0, 200.0]);
    for j in [2, 3, 6, 7, 8] {
        assert_eq!(a.el(3, j).unwrap(), 101.0);
        assert_eq!(a.el(4, j).unwrap(), 10.0);
    }

    // Read back through the positions of the same row list.
    let mut scalar = RowsAccessor::new(&a);
    scalar.reinit(&rows).unwrap();
    while scalar.current_column().is_some() {
        assert_eq!(scalar.get(0, 0), Some(101.0));
        assert_eq!(scalar.get(2, 0), Some(101.0));
        assert_eq!(scalar.get(1, 0), Some(10.0));
        scalar.advance();
    }
}

#[test]
fn dof_info_from_foreign_partition_rejected() {
    let a = scenario_matrix();

    // Block-row 9 does not exist in a matrix with four block-rows.
    let wide = BlockIndices::uniform(10, 1).unwrap();
    let info = DofInfo::initialize(&[9], &wide).unwrap();
    let mut acc = RowsBlockAccessor::new(&a);
    assert_eq!(
        acc.reinit(&info).unwrap_err(),
        BlockCsrError::BlockOutOfRange {
            block: 9,
            n_blocks: 4
        }
    );

    // Offset 6 lies past the end of block-row 0, which has three rows.
    let single = BlockIndices::new(vec![8]).unwrap();
    let info = DofInfo::initialize(&[6], &single).unwrap();
    assert_eq!(
        acc.reinit(&info).unwrap_err(),
        BlockCsrError::IndexOutOfRange { index: 6, size: 3 }
    );
    assert!(std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        acc.get_current_block_column()
    }))
    .is_err());
}

#[test]
fn row_outside_partition_rejected() {
    let a = scenario_matrix();
    assert!(matches!(
        DofInfo::initialize(&[9], a.row_blocks()),
        Err(BlockCsrError::IndexOutOfRange { index: 9, size: 8 })
    ));
}
