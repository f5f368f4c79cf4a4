//! Correlation token handed to the engine as opaque user data.

use std::fmt;

/// A generational slot reference into the [`CorrelationStore`].
///
/// The engine receives it with each submission and returns it unchanged in
/// its completion callback. A token whose generation no longer matches its slot
/// is stale and resolves to nothing.
///
/// [`CorrelationStore`]: crate::query::CorrelationStore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    index: u32,
    generation: u32,
}

impl Token {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
