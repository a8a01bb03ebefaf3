use serde::Serialize;

use crate::model::instant::Instant;
use crate::model::task::Task;
use crate::ops::agenda::MenuItem;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct MenuItemJson {
    pub position: usize,
    pub instant: Instant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}

#[derive(Serialize)]
pub struct TaskJson {
    pub instant: Instant,
    pub title: String,
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct TagCountJson {
    pub tag: String,
    pub tasks: usize,
}

#[derive(Serialize)]
pub struct ClockJson {
    pub clock: Instant,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn menu_item_to_json(item: &MenuItem<'_>) -> MenuItemJson {
    MenuItemJson {
        position: item.position,
        instant: item.instant,
        title: item.task.map(|t| t.title.clone()),
        tags: item
            .task
            .map(|t| t.tags().map(str::to_string).collect())
            .unwrap_or_default(),
        stale: item.task.is_none(),
    }
}

pub fn task_to_json(at: Instant, task: &Task) -> TaskJson {
    TaskJson {
        instant: at,
        title: task.title.clone(),
        tags: task.tags().map(str::to_string).collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Tags each prefixed with `marker`, space separated
pub fn format_tags(task: &Task, marker: &str) -> String {
    task.tags()
        .map(|tag| format!("{}{}", marker, tag))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `TITLE dd.mm.yy hh:mm #tag1 #tag2`, with no trailing space when untagged
pub fn format_task(at: Instant, task: &Task, marker: &str) -> String {
    let tags = format_tags(task, marker);
    if tags.is_empty() {
        format!("{} {}", task.title, at)
    } else {
        format!("{} {} {}", task.title, at, tags)
    }
}

/// `N TITLE dd.mm.yy hh:mm #tags`; a stale entry shows `(gone)` for its task
pub fn format_menu_item(item: &MenuItem<'_>, marker: &str) -> String {
    match item.task {
        Some(task) => format!("{} {}", item.position, format_task(item.instant, task, marker)),
        None => format!("{} (gone) {}", item.position, item.instant),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn at(s: &str) -> Instant {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_task_with_tags() {
        let task = Task::with_tags("Incident review", ["work", "urgent"]).unwrap();
        assert_snapshot!(
            format_task(at("10.05.24 10:00"), &task, "#"),
            @"Incident review 10.05.24 10:00 #urgent #work"
        );
    }

    #[test]
    fn test_format_task_without_tags() {
        let task = Task::new("Nap");
        assert_eq!(format_task(at("10.05.24 14:00"), &task, "#"), "Nap 10.05.24 14:00");
    }

    #[test]
    fn test_format_menu_items() {
        let task = Task::with_tags("Groceries", ["home"]).unwrap();
        let live = MenuItem {
            position: 1,
            instant: at("11.05.24 08:00"),
            task: Some(&task),
        };
        let stale = MenuItem {
            position: 2,
            instant: at("12.05.24 08:00"),
            task: None,
        };
        assert_snapshot!(format_menu_item(&live, "@"), @"1 Groceries 11.05.24 08:00 @home");
        assert_snapshot!(format_menu_item(&stale, "#"), @"2 (gone) 12.05.24 08:00");
    }

    #[test]
    fn test_menu_item_json() {
        let task = Task::with_tags("Groceries", ["home"]).unwrap();
        let item = MenuItem {
            position: 1,
            instant: at("11.05.24 08:00"),
            task: Some(&task),
        };
        let json = serde_json::to_string(&menu_item_to_json(&item)).unwrap();
        assert_eq!(
            json,
            r#"{"position":1,"instant":"11.05.24 08:00","title":"Groceries","tags":["home"]}"#
        );

        let stale = MenuItem {
            task: None,
            ..item
        };
        let json = serde_json::to_string(&menu_item_to_json(&stale)).unwrap();
        assert_eq!(
            json,
            r#"{"position":1,"instant":"11.05.24 08:00","tags":[],"stale":true}"#
        );
    }
}
