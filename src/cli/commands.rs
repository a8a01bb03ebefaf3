use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::instant::{Day, Instant, TimeOfDay};
use crate::ops::query::Scope;

#[derive(Parser)]
#[command(name = "ag", about = concat!("agenda v", env!("CARGO_PKG_VERSION"), " - tasks by the minute, found by tag"), version)]
pub struct Cli {
    /// Script of agenda commands, one per line (default: stdin)
    pub script: Option<PathBuf>,

    /// Config file (default: ./agenda.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial clock, "dd.mm.yy hh:mm"
    #[arg(long)]
    pub clock: Option<Instant>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Log filter, e.g. "debug" or "agenda=trace" (AGENDA_LOG overrides)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// One line of a script, parsed without a binary name
#[derive(Parser, Debug)]
#[command(name = "ag", no_binary_name = true, disable_version_flag = true)]
pub struct ScriptLine {
    #[command(subcommand)]
    pub command: ScriptCommand,
}

#[derive(Subcommand, Debug)]
pub enum ScriptCommand {
    /// Add a task at a future instant
    Add(AddArgs),
    /// Select tasks by day range and tag expression; the result becomes the menu
    Query(QueryArgs),
    /// Show the current menu again
    Menu,
    /// Rename a menu item
    Title(TitleArgs),
    /// Move a menu item to another day, keeping its time
    Day(DayArgs),
    /// Move a menu item to another time, keeping its day
    Time(TimeArgs),
    /// Move a menu item to another day and time
    Move(MoveArgs),
    /// Add tags to a menu item
    Tag(TagArgs),
    /// Remove tags from a menu item
    Untag(UntagArgs),
    /// Delete a menu item
    Delete(DeleteArgs),
    /// Show the clock, or advance it
    Clock(ClockArgs),
    /// List past tasks
    Past,
    /// List every tag in use with its task count
    Tags,
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Day, dd.mm.yy
    pub day: Day,
    /// Time, hh:mm
    pub time: TimeOfDay,
    /// Tags, with or without a leading #
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Only this day
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub day: Option<Day>,
    /// First day of a range (needs --to)
    #[arg(long, requires = "to")]
    pub from: Option<Day>,
    /// Last day of a range (needs --from)
    #[arg(long, requires = "from")]
    pub to: Option<Day>,
    /// Keep only tasks whose title matches this regex
    #[arg(long)]
    pub title: Option<String>,
    /// Tag expression: tags combined with AND, OR, NOT and parentheses
    pub expr: Vec<String>,
}

impl QueryArgs {
    pub fn scope(&self) -> Scope {
        match (self.day, self.from, self.to) {
            (Some(day), _, _) => Scope::Day(day),
            (None, Some(first), Some(last)) => Scope::Range(first, last),
            _ => Scope::Future,
        }
    }

    pub fn expression(&self) -> String {
        self.expr.join(" ")
    }
}

#[derive(Args, Debug)]
pub struct TitleArgs {
    /// Menu position
    pub position: usize,
    /// New title
    pub title: String,
}

#[derive(Args, Debug)]
pub struct DayArgs {
    /// Menu position
    pub position: usize,
    /// New day, dd.mm.yy
    pub day: Day,
}

#[derive(Args, Debug)]
pub struct TimeArgs {
    /// Menu position
    pub position: usize,
    /// New time, hh:mm
    pub time: TimeOfDay,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Menu position
    pub position: usize,
    /// New day, dd.mm.yy
    pub day: Day,
    /// New time, hh:mm
    pub time: TimeOfDay,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Menu position
    pub position: usize,
    /// Tags to add
    #[arg(required = true)]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UntagArgs {
    /// Menu position
    pub position: usize,
    /// Tags to remove
    #[arg(required_unless_present = "all")]
    pub tags: Vec<String>,
    /// Remove every tag
    #[arg(long, conflicts_with = "tags")]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Menu position
    pub position: usize,
}

#[derive(Args, Debug)]
pub struct ClockArgs {
    /// Day to advance to, dd.mm.yy
    #[arg(requires = "time")]
    pub day: Option<Day>,
    /// Time to advance to, hh:mm
    pub time: Option<TimeOfDay>,
}
