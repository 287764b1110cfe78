//! Node identity for task graphs.

use std::fmt;

/// Identity of a task node.
///
/// Callers identify tasks by integer ids, but ids are not guaranteed to be
/// unique within a batch. The first task carrying an id gets occurrence `0`;
/// every later task reusing the id gets the next occurrence so it remains a
/// distinct node. Dependencies always name the primary occurrence.
///
/// Keys order by id, then occurrence. All traversal tie-breaks use this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey {
    id: i64,
    occurrence: u32,
}

impl TaskKey {
    /// Key for the first task carrying `id`.
    #[must_use]
    pub const fn primary(id: i64) -> Self {
        Self { id, occurrence: 0 }
    }

    /// Key for the `occurrence`-th task carrying `id` (0 is the primary).
    #[must_use]
    pub const fn new(id: i64, occurrence: u32) -> Self {
        Self { id, occurrence }
    }

    /// The caller-supplied task id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// How many earlier tasks in the batch carried the same id.
    #[must_use]
    pub const fn occurrence(&self) -> u32 {
        self.occurrence
    }

    /// Whether this is the first task carrying its id.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.occurrence == 0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primary() {
            write!(f, "#{}", self.id)
        } else {
            write!(f, "#{} (duplicate {})", self.id, self.occurrence)
        }
    }
}
