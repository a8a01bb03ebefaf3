//! In-memory agenda: tasks keyed by instant, tagged, and selected through a
//! boolean tag query whose result becomes a positionally addressed menu.

pub mod cli;
pub mod io;
pub mod logging;
pub mod model;
pub mod ops;
pub mod parse;

pub use model::{Day, Instant, InstantParseError, Task, TimeOfDay};
pub use ops::{Agenda, AgendaError, Menu, MenuItem, Query, Scope};
pub use parse::{Expr, ExprError, parse_expr};
