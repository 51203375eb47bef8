//! DofInfo: a row list resolved against a block partition.
//!
//! A bulk kernel hands over the global rows touched by one unit of work (for
//! example the degrees of freedom of a cell). `DofInfo` groups them by owning
//! block-row and remembers, for every occurrence, its offset inside the block
//! and its position in the caller's list. Duplicates are kept: two
//! occurrences of the same row are two distinct output slots.

use hashbrown::HashMap;

use crate::bcsr_error::BlockCsrError;
use crate::data::block_indices::BlockIndices;

/// All occurrences of rows from one block-row.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RowGroup {
    /// Global block-row id.
    pub block_row: usize,
    /// `(offset_in_block, position_in_row_list)` in caller order.
    pub entries: Vec<(usize, usize)>,
}

/// Row list grouped by block-row, ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DofInfo {
    rows: Vec<usize>,
    groups: Vec<RowGroup>,
}

impl DofInfo {
    /// Resolve `rows` against `row_blocks`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if a row lies outside the partition.
    ///
    /// # Example
    /// ```rust
    /// # fn try_main() -> Result<(), block_csr::bcsr_error::BlockCsrError> {
    /// use block_csr::accessor::dof_info::DofInfo;
    /// use block_csr::data::block_indices::BlockIndices;
    /// let blocks = BlockIndices::new(vec![3, 2, 1, 2])?;
    /// let info = DofInfo::initialize(&[7, 1, 2, 1], &blocks)?;
    /// assert_eq!(info.n_groups(), 2);
    /// assert_eq!(info.groups()[0].entries, vec![(1, 1), (2, 2), (1, 3)]);
    /// assert_eq!(info.groups()[1].entries, vec![(1, 0)]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn initialize(rows: &[usize], row_blocks: &BlockIndices) -> Result<Self, BlockCsrError> {
        let mut group_of: HashMap<usize, usize> = HashMap::with_capacity(rows.len());
        let mut groups: Vec<RowGroup> = Vec::new();
        for (position, &row) in rows.iter().enumerate() {
            let (block_row, offset) = row_blocks.global_to_local(row)?;
            let g = *group_of.entry(block_row).or_insert_with(|| {
                groups.push(RowGroup {
                    block_row,
                    entries: Vec::new(),
                });
                groups.len() - 1
            });
            groups[g].entries.push((offset, position));
        }
        // Stable, and block-rows are unique, so entries keep caller order.
        groups.sort_by_key(|g| g.block_row);
        Ok(Self {
            rows: rows.to_vec(),
            groups,
        })
    }

    /// Groups in ascending block-row order.
    #[inline]
    pub fn groups(&self) -> &[RowGroup] {
        &self.groups
    }

    /// Number of distinct block-rows.
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    /// Length of the caller's row list, duplicates included.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// The caller's row list.
    #[inline]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }
}
