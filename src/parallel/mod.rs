/// How a solver component is laid out across processes.
///
/// Everything in this crate runs sequentially; the other categories exist so
/// a distributed setup can be plugged in behind the same interfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverCategory {
    Sequential,
    Nonoverlapping,
    Overlapping,
}

/// Which unknowns the local process owns. The Galerkin product only sums
/// contributions from owned rows.
pub trait Ownership {
    fn is_owned(&self, index: usize) -> bool;
}

/// Ownership predicate for the sequential case: every unknown is local.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllOwned;

impl Ownership for AllOwned {
    fn is_owned(&self, _index: usize) -> bool {
        true
    }
}

/// Parallel information for a purely sequential run.
///
/// Consistency projections are no-ops here; a distributed implementation
/// would zero non-owned entries and communicate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialInfo;

impl SequentialInfo {
    pub fn category(&self) -> SolverCategory {
        SolverCategory::Sequential
    }

    /// Make a vector consistent across processes. Nothing to do sequentially.
    pub fn project<T>(&self, _x: &mut [T]) {}
}

impl Ownership for SequentialInfo {
    fn is_owned(&self, _index: usize) -> bool {
        true
    }
}
