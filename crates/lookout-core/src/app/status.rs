//! Status - Resolver の集計ビュー

use serde::{Deserialize, Serialize};

/// Snapshot of a resolver's bookkeeping.
///
/// `sent` counts queries the engine accepted; every sent query ends up in
/// exactly one of `answered`, `errored` or `canceled`, or is still
/// `outstanding`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverStatus {
    pub outstanding: usize,
    pub sent: usize,
    pub answered: usize,
    pub errored: usize,
    pub canceled: usize,
    pub closed: bool,
}

impl ResolverStatus {
    pub fn finished(&self) -> usize {
        self.answered + self.errored + self.canceled
    }
}
