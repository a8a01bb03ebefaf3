use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use clap::Parser;
use clap::error::ErrorKind;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::logging;
use crate::model::instant::Instant;
use crate::model::task::Task;
use crate::ops::agenda::{Agenda, AgendaError};
use crate::ops::query::Query;
use crate::parse::{LineError, is_blank_or_comment, split_words};

/// Error type for a single script line
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Line(#[from] LineError),
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Agenda(#[from] AgendaError),
    #[error("output error: {0}")]
    Io(#[from] io::Error),
    #[error("output error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = config_io::load_config(cli.config.as_deref(), &cwd)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    logging::init(level);

    let clock = cli.clock.or(config.clock.start).unwrap_or_default();
    let mut session = Session::new(Agenda::new(clock));
    session.json = cli.json || config.display.json;
    session.tag_marker = config.display.tag_marker.clone();
    info!(clock = %clock, json = session.json, "session started");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let failures = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
            session.run_script(BufReader::new(file), &mut out, &mut err)?
        }
        None => session.run_script(io::stdin().lock(), &mut out, &mut err)?,
    };

    if failures > 0 {
        return Err(format!("{} command(s) failed", failures).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An agenda driven by script lines, with its output settings
pub struct Session {
    pub agenda: Agenda,
    pub json: bool,
    pub tag_marker: String,
}

impl Session {
    pub fn new(agenda: Agenda) -> Self {
        Session {
            agenda,
            json: false,
            tag_marker: "#".to_string(),
        }
    }

    /// Run every line of `input`. Failed lines are reported on `err` and the
    /// script goes on. Returns how many lines failed.
    pub fn run_script<R: BufRead, W: Write, E: Write>(
        &mut self,
        input: R,
        out: &mut W,
        err: &mut E,
    ) -> io::Result<usize> {
        let mut failures = 0;
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if let Err(e) = self.run_line(&line, out) {
                failures += 1;
                warn!(line = index + 1, error = %e, "command failed");
                writeln!(err, "error: line {}: {}", index + 1, e)?;
            }
        }
        out.flush()?;
        Ok(failures)
    }

    /// Parse and execute one script line
    pub fn run_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<(), CommandError> {
        if is_blank_or_comment(line) {
            return Ok(());
        }
        let words = split_words(line)?;
        match ScriptLine::try_parse_from(&words) {
            Ok(parsed) => self.execute(parsed.command, out),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                write!(out, "{}", e.render())?;
                Ok(())
            }
            Err(e) => Err(CommandError::Usage(usage_message(&e))),
        }
    }

    pub fn execute<W: Write>(
        &mut self,
        command: ScriptCommand,
        out: &mut W,
    ) -> Result<(), CommandError> {
        match command {
            ScriptCommand::Add(args) => cmd_add(&mut self.agenda, args),
            ScriptCommand::Query(args) => {
                self.cmd_query(args)?;
                self.print_menu(out)
            }
            ScriptCommand::Menu => self.print_menu(out),
            ScriptCommand::Title(args) => Ok(self.agenda.set_title(args.position, &args.title)?),
            ScriptCommand::Day(args) => Ok(self.agenda.set_day(args.position, args.day)?),
            ScriptCommand::Time(args) => Ok(self.agenda.set_time(args.position, args.time)?),
            ScriptCommand::Move(args) => {
                let to = Instant::new(args.day, args.time);
                Ok(self.agenda.reschedule(args.position, to)?)
            }
            ScriptCommand::Tag(args) => Ok(self.agenda.add_tags(args.position, &args.tags)?),
            ScriptCommand::Untag(args) => {
                if args.all {
                    Ok(self.agenda.clear_tags(args.position)?)
                } else {
                    Ok(self.agenda.remove_tags(args.position, &args.tags)?)
                }
            }
            ScriptCommand::Delete(args) => {
                self.agenda.delete(args.position)?;
                Ok(())
            }
            ScriptCommand::Clock(args) => self.cmd_clock(args, out),
            ScriptCommand::Past => self.print_past(out),
            ScriptCommand::Tags => self.print_tags(out),
        }
    }

    fn cmd_query(&mut self, args: QueryArgs) -> Result<(), CommandError> {
        // Build the whole query first so a bad expression or pattern keeps the old menu
        let mut query =
            Query::parse(args.scope(), &args.expression()).map_err(AgendaError::from)?;
        if let Some(pattern) = &args.title {
            query = query.with_title(Regex::new(pattern).map_err(AgendaError::from)?);
        }
        self.agenda.query(&query);
        Ok(())
    }

    fn cmd_clock<W: Write>(&mut self, args: ClockArgs, out: &mut W) -> Result<(), CommandError> {
        if let (Some(day), Some(time)) = (args.day, args.time) {
            self.agenda.advance_clock(Instant::new(day, time))?;
            return Ok(());
        }
        let clock = self.agenda.clock();
        if self.json {
            self.emit_json(out, &ClockJson { clock })
        } else {
            writeln!(out, "{}", clock)?;
            Ok(())
        }
    }

    fn print_menu<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        let items = self.agenda.menu_items();
        if self.json {
            let json: Vec<MenuItemJson> = items.iter().map(menu_item_to_json).collect();
            return self.emit_json(out, &json);
        }
        for item in &items {
            writeln!(out, "{}", format_menu_item(item, &self.tag_marker))?;
        }
        Ok(())
    }

    fn print_past<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        if self.json {
            let json: Vec<TaskJson> = self
                .agenda
                .past()
                .map(|(at, task)| task_to_json(at, task))
                .collect();
            return self.emit_json(out, &json);
        }
        for (at, task) in self.agenda.past() {
            writeln!(out, "{}", format_task(at, task, &self.tag_marker))?;
        }
        Ok(())
    }

    fn print_tags<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        if self.json {
            let json: Vec<TagCountJson> = self
                .agenda
                .tag_counts()
                .map(|(tag, tasks)| TagCountJson {
                    tag: tag.to_string(),
                    tasks,
                })
                .collect();
            return self.emit_json(out, &json);
        }
        for (tag, tasks) in self.agenda.tag_counts() {
            writeln!(out, "{}{} {}", self.tag_marker, tag, tasks)?;
        }
        Ok(())
    }

    fn emit_json<W: Write, T: Serialize>(&self, out: &mut W, value: &T) -> Result<(), CommandError> {
        serde_json::to_writer(&mut *out, value)?;
        writeln!(out)?;
        Ok(())
    }
}

fn cmd_add(agenda: &mut Agenda, args: AddArgs) -> Result<(), CommandError> {
    let task = Task::with_tags(args.title, &args.tags).map_err(AgendaError::from)?;
    agenda.insert(Instant::new(args.day, args.time), task)?;
    Ok(())
}

/// First line of a clap error, without its `error: ` prefix
fn usage_message(e: &clap::Error) -> String {
    let rendered = e.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(Agenda::new("01.05.24 00:00".parse().unwrap()))
    }

    /// Run lines, returning (stdout, stderr, failures)
    fn run(session: &mut Session, script: &str) -> (String, String, usize) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let failures = session.run_script(script.as_bytes(), &mut out, &mut err).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            failures,
        )
    }

    const SETUP: &str = "\
add Standup 10.05.24 09:00 #work
add \"Incident review\" 10.05.24 10:00 #work #urgent
add Groceries 11.05.24 08:00 #home
";

    #[test]
    fn test_query_prints_menu() {
        let mut s = session();
        let script = format!("{SETUP}query --day 10.05.24 work AND urgent\n");
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 0, "{err}");
        assert_eq!(out, "1 Incident review 10.05.24 10:00 #urgent #work\n");
    }

    #[test]
    fn test_range_query_and_not() {
        let mut s = session();
        let script = format!(
            "{SETUP}query --from 10.05.24 --to 11.05.24 work OR home\nquery --from 10.05.24 --to 11.05.24 NOT urgent\n"
        );
        let (out, _, failures) = run(&mut s, &script);
        assert_eq!(failures, 0);
        assert_eq!(
            out,
            "\
1 Standup 10.05.24 09:00 #work
2 Incident review 10.05.24 10:00 #urgent #work
3 Groceries 11.05.24 08:00 #home
1 Standup 10.05.24 09:00 #work
2 Groceries 11.05.24 08:00 #home
"
        );
    }

    #[test]
    fn test_edits_through_menu() {
        let mut s = session();
        let script = format!(
            "{SETUP}query home\ntitle 1 \"Farmers market\"\ntag 1 weekend\nuntag 1 home\ntime 1 09:30\nquery weekend\n"
        );
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 0, "{err}");
        assert_eq!(
            out,
            "1 Groceries 11.05.24 08:00 #home\n1 Farmers market 11.05.24 09:30 #weekend\n"
        );
    }

    #[test]
    fn test_failures_are_reported_and_script_continues() {
        let mut s = session();
        let script = format!("{SETUP}query home\ndelete 5\nquery (home\nmenu\n");
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 2);
        assert!(err.contains("error: line 5: no item 5 in the menu (1 items)"));
        assert!(err.contains("error: line 6: invalid expression: unbalanced parenthesis at 0"));
        // the bad query left the menu alone
        assert_eq!(
            out,
            "1 Groceries 11.05.24 08:00 #home\n1 Groceries 11.05.24 08:00 #home\n"
        );
    }

    #[test]
    fn test_usage_errors() {
        let mut s = session();
        let (_, err, failures) = run(&mut s, "add Lunch 10/05/24 12:00\nfrobnicate\n");
        assert_eq!(failures, 2);
        assert!(err.contains("line 1: invalid value '10/05/24'"), "{err}");
        assert!(err.contains("line 2: unrecognized subcommand 'frobnicate'"), "{err}");
    }

    #[test]
    fn test_clock_and_past() {
        let mut s = session();
        let script = format!("{SETUP}clock 10.05.24 09:30\nclock\npast\nclock 01.05.24 00:00\n");
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 1);
        assert!(err.contains("clock cannot go back"));
        assert_eq!(out, "10.05.24 09:30\nStandup 10.05.24 09:00 #work\n");
    }

    #[test]
    fn test_stale_menu_entry() {
        let mut s = session();
        let script = format!("{SETUP}query work\nmove 1 20.05.24 09:00\nmenu\ntitle 1 x\n");
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 1);
        assert!(err.contains("menu item 1 no longer refers to its task"));
        assert!(out.ends_with(
            "1 (gone) 10.05.24 09:00\n2 Incident review 10.05.24 10:00 #urgent #work\n"
        ));
    }

    #[test]
    fn test_json_output() {
        let mut s = session();
        s.json = true;
        let script = format!("{SETUP}query --day 11.05.24\ntags\n");
        let (out, _, failures) = run(&mut s, &script);
        assert_eq!(failures, 0);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            r#"[{"position":1,"instant":"11.05.24 08:00","title":"Groceries","tags":["home"]}]"#
        );
        let tags: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(tags[0]["tag"], "home");
        assert_eq!(tags[2]["tasks"], 2);
    }

    #[test]
    fn test_title_filter() {
        let mut s = session();
        let script = format!("{SETUP}query --title \"(?i)^incident\" work\nquery --title \"[\" work\n");
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 1);
        assert!(err.contains("invalid title pattern"));
        assert_eq!(out, "1 Incident review 10.05.24 10:00 #urgent #work\n");
    }

    #[test]
    fn test_custom_tag_marker() {
        let mut s = session();
        s.tag_marker = "@".to_string();
        let (out, _, _) = run(&mut s, &format!("{SETUP}query home\ntags\n"));
        assert_eq!(
            out,
            "1 Groceries 11.05.24 08:00 @home\n@home 1\n@urgent 1\n@work 2\n"
        );
    }

    #[test]
    fn test_deep_expression_is_a_line_error() {
        let mut s = session();
        let n = 100_000;
        let script = format!(
            "{SETUP}query home\nquery {}home{}\nquery {}home\nmenu\n",
            "(".repeat(n),
            ")".repeat(n),
            "NOT ".repeat(n / 2)
        );
        let (out, err, failures) = run(&mut s, &script);
        assert_eq!(failures, 2);
        assert!(err.contains("error: line 5: invalid expression: expression nested too deeply"));
        assert!(err.contains("error: line 6: invalid expression: expression nested too deeply"));
        assert_eq!(
            out,
            "1 Groceries 11.05.24 08:00 #home\n1 Groceries 11.05.24 08:00 #home\n"
        );
    }

    #[test]
    fn test_add_rejects_tags_queries_cannot_name() {
        let mut s = session();
        let (_, err, failures) = run(&mut s, "add Lunch 10.05.24 12:00 food a&b\ntags\n");
        assert_eq!(failures, 1);
        assert!(err.contains("line 1: invalid tag 'a&b'"), "{err}");
        assert!(s.agenda.is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let mut s = session();
        let (out, _, failures) = run(&mut s, "// nothing yet\n\n   \nquery\n");
        assert_eq!(failures, 0);
        assert_eq!(out, "");
    }
}
