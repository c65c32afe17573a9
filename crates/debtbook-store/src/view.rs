use std::fmt;

use debtbook_types::{Debtor, DebtorId};

/// Lifecycle of a [`LedgerStore`](crate::LedgerStore).
///
/// ```text
/// Uninitialized -> Loading -> Ready | Error
/// Error -> Loading                     (retry)
/// Ready -> Loading                     (refresh)
/// Ready -> Mutating -> Ready           (every create/delete)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Mutating,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Mutating => "mutating",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Observable state published to presentation layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerView {
    pub phase: Phase,
    /// Most recently created first.
    pub debtors: Vec<Debtor>,
    /// Message of the last failed load or mutation, cleared on success.
    pub error: Option<String>,
}

impl LedgerView {
    /// `true` while an operation is waiting on the collaborator.
    pub fn loading(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::Mutating)
    }

    pub fn debtor(&self, id: &DebtorId) -> Option<&Debtor> {
        self.debtors.iter().find(|d| &d.id == id)
    }

    pub(crate) fn debtor_mut(&mut self, id: &DebtorId) -> Option<&mut Debtor> {
        self.debtors.iter_mut().find(|d| &d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_is_uninitialized_and_empty() {
        let view = LedgerView::default();
        assert_eq!(view.phase, Phase::Uninitialized);
        assert!(view.debtors.is_empty());
        assert!(view.error.is_none());
        assert!(!view.loading());
    }

    #[test]
    fn loading_covers_pending_phases() {
        for (phase, loading) in [
            (Phase::Uninitialized, false),
            (Phase::Loading, true),
            (Phase::Ready, false),
            (Phase::Mutating, true),
            (Phase::Error, false),
        ] {
            let view = LedgerView {
                phase,
                ..Default::default()
            };
            assert_eq!(view.loading(), loading, "{phase}");
        }
    }
}
