use std::collections::BTreeMap;
use std::ops::RangeBounds;

use serde::Serialize;

use crate::model::instant::Instant;
use crate::model::task::Task;
use crate::ops::tag_index::TagIndex;

/// Identity of a stored task, stable across renames, retags and reschedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Entry {
    id: TaskId,
    task: Task,
}

/// Primary store (instant → task) plus the tag index kept as its inverse.
///
/// Every mutating method checks its preconditions before touching either
/// map, so a rejected call leaves both exactly as they were.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: BTreeMap<Instant, Entry>,
    tags: TagIndex,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task at a free instant. Returns `None` if the instant is taken.
    pub fn insert(&mut self, at: Instant, task: Task) -> Option<TaskId> {
        if self.tasks.contains_key(&at) {
            return None;
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        for tag in task.tags() {
            self.tags.insert(tag, at);
        }
        self.tasks.insert(at, Entry { id, task });
        Some(id)
    }

    /// Remove the task at `at` together with its index entries
    pub fn remove(&mut self, at: Instant) -> Option<Task> {
        let entry = self.tasks.remove(&at)?;
        for tag in entry.task.tags() {
            self.tags.remove(tag, at);
        }
        Some(entry.task)
    }

    /// Move a task to another instant, carrying its tags along.
    /// Returns false (and changes nothing) if `from` is empty or `to` is taken.
    pub fn relocate(&mut self, from: Instant, to: Instant) -> bool {
        if from == to {
            return self.tasks.contains_key(&from);
        }
        if self.tasks.contains_key(&to) {
            return false;
        }
        let Some(entry) = self.tasks.remove(&from) else {
            return false;
        };
        for tag in entry.task.tags() {
            self.tags.remove(tag, from);
            self.tags.insert(tag, to);
        }
        self.tasks.insert(to, entry);
        true
    }

    pub fn set_title(&mut self, at: Instant, title: &str) -> bool {
        match self.tasks.get_mut(&at) {
            Some(entry) => {
                entry.task.set_title(title);
                true
            }
            None => false,
        }
    }

    /// Add a tag to the task at `at`. Adding a tag it already has is a no-op.
    pub fn add_tag(&mut self, at: Instant, tag: &str) -> bool {
        match self.tasks.get_mut(&at) {
            Some(entry) => {
                if entry.task.add_tag(tag) {
                    self.tags.insert(tag, at);
                }
                true
            }
            None => false,
        }
    }

    /// Remove a tag from the task at `at`. Removing an absent tag is a no-op.
    pub fn remove_tag(&mut self, at: Instant, tag: &str) -> bool {
        match self.tasks.get_mut(&at) {
            Some(entry) => {
                if entry.task.remove_tag(tag) {
                    self.tags.remove(tag, at);
                }
                true
            }
            None => false,
        }
    }

    pub fn clear_tags(&mut self, at: Instant) -> bool {
        match self.tasks.get_mut(&at) {
            Some(entry) => {
                for tag in entry.task.clear_tags() {
                    self.tags.remove(&tag, at);
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, at: Instant) -> Option<&Task> {
        self.tasks.get(&at).map(|entry| &entry.task)
    }

    pub fn id_at(&self, at: Instant) -> Option<TaskId> {
        self.tasks.get(&at).map(|entry| entry.id)
    }

    /// Instants of every task within `range`, ascending
    pub fn instants<R: RangeBounds<Instant>>(&self, range: R) -> Vec<Instant> {
        self.tasks.range(range).map(|(at, _)| *at).collect()
    }

    /// Tasks within `range`, ascending by instant
    pub fn range<R: RangeBounds<Instant>>(&self, range: R) -> impl Iterator<Item = (Instant, &Task)> {
        self.tasks.range(range).map(|(at, entry)| (*at, &entry.task))
    }

    /// Instants carrying `tag` within `range`, ascending
    pub fn tagged<R: RangeBounds<Instant>>(&self, tag: &str, range: R) -> Vec<Instant> {
        self.tags.range(tag, range)
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check that the tag index is exactly the inverse of the tasks' tag sets
    #[cfg(test)]
    pub(crate) fn index_is_consistent(&self) -> bool {
        let forward = self
            .tasks
            .iter()
            .all(|(at, entry)| entry.task.tags().all(|tag| self.tags.contains(tag, *at)));
        let backward = self.tags.iter().all(|(tag, set)| {
            !set.is_empty()
                && set
                    .iter()
                    .all(|at| self.get(*at).is_some_and(|task| task.has_tag(tag)))
        });
        forward && backward
    }
}
