use crate::error::Error;
use crate::merge::MergePreview;
use crate::model::{MatchGroup, MergeSelection};

/// Indices into [`MatchGroup::folders`] chosen by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeChoice {
    pub primary: usize,
    pub merge_from: Vec<usize>,
}

impl MergeChoice {
    pub fn new(primary: usize, merge_from: Vec<usize>) -> Self {
        Self {
            primary,
            merge_from,
        }
    }
}

/// Outcome of presenting one group for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Merge(MergeChoice),
    Skip,
    Quit,
}

/// The operator side of an interactive run.
///
/// `review` is asked again for the same group after a choice is rejected by
/// [`MergeSelection::from_group`]; `rejected` is told why first.
pub trait SelectionHandler {
    fn review(&mut self, group: &MatchGroup, index: usize, total: usize) -> ReviewAction;

    fn confirm(&mut self, selection: &MergeSelection, preview: &MergePreview) -> bool;

    fn rejected(&mut self, _error: &Error) {}
}
