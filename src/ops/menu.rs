use crate::model::instant::Instant;
use crate::ops::store::TaskId;

/// One line of the menu: where the task was and which task it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub instant: Instant,
    pub id: TaskId,
}

/// Ordered result of the last query, addressed by 1-based position.
///
/// The menu only refers to tasks; it is replaced wholesale by each query and
/// never patched by edits, so entries may go stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        Menu { entries }
    }

    /// Entry at 1-based `position`
    pub fn get(&self, position: usize) -> Option<MenuEntry> {
        position
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .copied()
    }

    /// Entries with their 1-based positions
    pub fn iter(&self) -> impl Iterator<Item = (usize, MenuEntry)> + '_ {
        self.entries.iter().enumerate().map(|(i, e)| (i + 1, *e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
