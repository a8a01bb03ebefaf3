pub mod agenda;
pub mod menu;
pub mod merge;
pub mod query;
pub mod store;
pub mod tag_index;

pub use agenda::{Agenda, AgendaError, MenuItem};
pub use menu::{Menu, MenuEntry};
pub use query::{Query, Scope, Window};
pub use store::{TaskId, TaskStore};
pub use tag_index::TagIndex;
