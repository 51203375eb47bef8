//! Data module: block partitions, tile storage and dense reference matrices
#![warn(missing_docs)]

pub mod block_indices;
pub mod full_matrix;
pub mod storage;

pub use block_indices::BlockIndices;
pub use full_matrix::FullMatrix;
pub use storage::{Storage, VecStorage};
