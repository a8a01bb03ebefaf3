use tracing::debug;

use crate::model::instant::{Day, Instant, TimeOfDay};
use crate::model::task::{InvalidTag, Task, normalize_tag};
use crate::ops::menu::{Menu, MenuEntry};
use crate::ops::query::{self, Query, Scope};
use crate::ops::store::TaskStore;
use crate::parse::ExprError;

/// Error type for agenda operations. None of them leaves the agenda changed.
#[derive(Debug, thiserror::Error)]
pub enum AgendaError {
    #[error("{0} is not in the future")]
    Past(Instant),
    #[error("{0} already has a task")]
    Occupied(Instant),
    #[error("no task at {0}")]
    NotFound(Instant),
    #[error("clock cannot go back from {current} to {requested}")]
    ClockBackwards { current: Instant, requested: Instant },
    #[error("no item {position} in the menu ({len} items)")]
    NoSuchPosition { position: usize, len: usize },
    #[error("menu item {0} no longer refers to its task; run a new query")]
    Stale(usize),
    #[error(transparent)]
    InvalidTag(#[from] InvalidTag),
    #[error("invalid expression: {0}")]
    InvalidExpression(#[from] ExprError),
    #[error("invalid title pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A line of the current menu as seen through the store
#[derive(Debug, Clone, Copy)]
pub struct MenuItem<'a> {
    pub position: usize,
    pub instant: Instant,
    /// `None` when the entry is stale (task deleted or moved)
    pub task: Option<&'a Task>,
}

/// Tasks keyed by instant, their tag index, the clock and the last menu.
///
/// Tasks at or before the clock are past: they stay listed by [`Agenda::past`]
/// but no query returns them and no edit can touch them.
#[derive(Debug, Clone, Default)]
pub struct Agenda {
    clock: Instant,
    store: TaskStore,
    menu: Menu,
}

impl Agenda {
    pub fn new(clock: Instant) -> Self {
        Agenda {
            clock,
            ..Agenda::default()
        }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    pub fn clock(&self) -> Instant {
        self.clock
    }

    /// True when `at` is not strictly later than the clock
    pub fn is_past(&self, at: Instant) -> bool {
        at <= self.clock
    }

    /// Move the clock forward. Moving it to its current value is allowed.
    pub fn advance_clock(&mut self, to: Instant) -> Result<(), AgendaError> {
        if to < self.clock {
            return Err(AgendaError::ClockBackwards {
                current: self.clock,
                requested: to,
            });
        }
        debug!(from = %self.clock, to = %to, "clock advanced");
        self.clock = to;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Primary store
    // -----------------------------------------------------------------------

    /// Add a task at a free future instant
    pub fn insert(&mut self, at: Instant, task: Task) -> Result<(), AgendaError> {
        if self.is_past(at) {
            return Err(AgendaError::Past(at));
        }
        self.store
            .insert(at, task)
            .ok_or(AgendaError::Occupied(at))?;
        debug!(at = %at, tasks = self.store.len(), "task inserted");
        Ok(())
    }

    /// Remove the future task at `at`
    pub fn remove(&mut self, at: Instant) -> Result<Task, AgendaError> {
        if self.is_past(at) {
            return Err(AgendaError::Past(at));
        }
        let task = self.store.remove(at).ok_or(AgendaError::NotFound(at))?;
        debug!(at = %at, tasks = self.store.len(), "task removed");
        Ok(task)
    }

    pub fn get(&self, at: Instant) -> Option<&Task> {
        self.store.get(at)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Tasks at or before the clock, oldest first
    pub fn past(&self) -> impl Iterator<Item = (Instant, &Task)> {
        self.store.range(..=self.clock)
    }

    /// Every indexed tag with how many tasks (past ones included) carry it
    pub fn tag_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.store.tag_index().iter().map(|(tag, set)| (tag, set.len()))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Run a query and make its result the current menu
    pub fn query(&mut self, query: &Query) -> &Menu {
        let hits = query::evaluate(&self.store, self.clock, query);
        let entries = hits
            .into_iter()
            .filter_map(|at| self.store.id_at(at).map(|id| MenuEntry { instant: at, id }))
            .collect();
        self.menu = Menu::new(entries);
        debug!(scope = ?query.scope, hits = self.menu.len(), "menu rebuilt");
        &self.menu
    }

    /// Parse `expression` and run it over `scope`. A malformed expression
    /// leaves the current menu in place.
    pub fn consult(&mut self, scope: Scope, expression: &str) -> Result<&Menu, AgendaError> {
        let query = Query::parse(scope, expression)?;
        Ok(self.query(&query))
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// The current menu resolved against the store
    pub fn menu_items(&self) -> Vec<MenuItem<'_>> {
        self.menu
            .iter()
            .map(|(position, entry)| MenuItem {
                position,
                instant: entry.instant,
                task: self.lookup(entry),
            })
            .collect()
    }

    fn lookup(&self, entry: MenuEntry) -> Option<&Task> {
        if self.store.id_at(entry.instant) == Some(entry.id) {
            self.store.get(entry.instant)
        } else {
            None
        }
    }

    /// Instant of the task at menu `position`, checked to still be the same
    /// task and still editable
    fn resolve(&self, position: usize) -> Result<Instant, AgendaError> {
        let entry = self
            .menu
            .get(position)
            .ok_or(AgendaError::NoSuchPosition {
                position,
                len: self.menu.len(),
            })?;
        if self.lookup(entry).is_none() {
            debug!(position, at = %entry.instant, "stale menu entry");
            return Err(AgendaError::Stale(position));
        }
        if self.is_past(entry.instant) {
            return Err(AgendaError::Past(entry.instant));
        }
        Ok(entry.instant)
    }

    // -----------------------------------------------------------------------
    // Edits through the menu
    // -----------------------------------------------------------------------

    pub fn set_title(&mut self, position: usize, title: &str) -> Result<(), AgendaError> {
        let at = self.resolve(position)?;
        self.store.set_title(at, title);
        debug!(position, at = %at, "title changed");
        Ok(())
    }

    /// Move item `position` to another instant. Moving it onto itself is a
    /// no-op; an occupied or past target leaves it where it was.
    pub fn reschedule(&mut self, position: usize, to: Instant) -> Result<(), AgendaError> {
        let from = self.resolve(position)?;
        if from == to {
            return Ok(());
        }
        if self.is_past(to) {
            return Err(AgendaError::Past(to));
        }
        if !self.store.relocate(from, to) {
            return Err(AgendaError::Occupied(to));
        }
        debug!(position, from = %from, to = %to, "task rescheduled");
        Ok(())
    }

    /// Move item `position` to another day, keeping its time
    pub fn set_day(&mut self, position: usize, day: Day) -> Result<(), AgendaError> {
        let from = self.resolve(position)?;
        self.reschedule(position, from.with_day(day))
    }

    /// Move item `position` to another time, keeping its day
    pub fn set_time(&mut self, position: usize, time: TimeOfDay) -> Result<(), AgendaError> {
        let from = self.resolve(position)?;
        self.reschedule(position, from.with_time(time))
    }

    /// Add tags to item `position`. Tags it already has are skipped; one
    /// invalid name rejects the whole call.
    pub fn add_tags<S: AsRef<str>>(
        &mut self,
        position: usize,
        tags: &[S],
    ) -> Result<(), AgendaError> {
        let at = self.resolve(position)?;
        let names = normalize_all(tags)?;
        for name in &names {
            self.store.add_tag(at, name);
        }
        debug!(position, at = %at, tags = ?names, "tags added");
        Ok(())
    }

    pub fn add_tag(&mut self, position: usize, tag: &str) -> Result<(), AgendaError> {
        self.add_tags(position, &[tag])
    }

    /// Remove tags from item `position`. Tags it does not have are skipped.
    pub fn remove_tags<S: AsRef<str>>(
        &mut self,
        position: usize,
        tags: &[S],
    ) -> Result<(), AgendaError> {
        let at = self.resolve(position)?;
        let names = normalize_all(tags)?;
        for name in &names {
            self.store.remove_tag(at, name);
        }
        debug!(position, at = %at, tags = ?names, "tags removed");
        Ok(())
    }

    pub fn remove_tag(&mut self, position: usize, tag: &str) -> Result<(), AgendaError> {
        self.remove_tags(position, &[tag])
    }

    pub fn clear_tags(&mut self, position: usize) -> Result<(), AgendaError> {
        let at = self.resolve(position)?;
        self.store.clear_tags(at);
        debug!(position, at = %at, "tags cleared");
        Ok(())
    }

    /// Delete item `position`, returning the removed task
    pub fn delete(&mut self, position: usize) -> Result<Task, AgendaError> {
        let at = self.resolve(position)?;
        self.remove(at)
    }
}

fn normalize_all<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>, AgendaError> {
    tags.iter()
        .map(|raw| normalize_tag(raw.as_ref()).map_err(AgendaError::from))
        .collect()
}
