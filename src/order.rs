/// Decides which queue a stage drains next.
///
/// `takes_left` returns true when the front of queue 0 must be emitted before
/// the front of queue 1. Implementations must return true for equal keys so
/// that queue 0 wins ties; the merge is only stable under that rule.
pub trait MergeOrder<T> {
    fn takes_left(&self, left: &T, right: &T) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    #[default]
    #[value(name = "asc")]
    Ascending,
    #[value(name = "desc")]
    Descending,
}

impl<T: Ord> MergeOrder<T> for SortOrder {
    fn takes_left(&self, left: &T, right: &T) -> bool {
        match self {
            SortOrder::Ascending => left <= right,
            SortOrder::Descending => left >= right,
        }
    }
}

impl<T, F> MergeOrder<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn takes_left(&self, left: &T, right: &T) -> bool {
        self(left, right)
    }
}
