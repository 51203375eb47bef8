//! Common bound aliases used across matrix and accessor code.
//!
//! These traits have blanket impls, so any type satisfying the underlying
//! bounds will automatically implement them. They are zero-cost and only
//! reduce duplication in `where` clauses.

/// Canonical bound set for stored matrix entries.
///
/// - `Num + Copy` for accumulate/scale in tile loops
/// - `Send + Sync` so tile buffers can be shared by concurrent readers
/// - `Debug` for diagnostics and invariant checks
pub trait ValueLike: num_traits::Num + Copy + Send + Sync + std::fmt::Debug + 'static {}
impl<T> ValueLike for T where T: num_traits::Num + Copy + Send + Sync + std::fmt::Debug + 'static {}
