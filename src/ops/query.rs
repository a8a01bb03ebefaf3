use std::ops::Bound;

use regex::Regex;

use crate::model::instant::{Day, Instant};
use crate::ops::merge;
use crate::ops::store::TaskStore;
use crate::parse::{Expr, ExprError, parse_expr};

/// Which days a query looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every future task
    Future,
    /// A single day, 00:00 through 23:59
    Day(Day),
    /// From the first day 00:00 through the last day 23:59
    Range(Day, Day),
}

/// Time window of a query, before the clock is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub lower: Option<Instant>,
    pub upper: Option<Instant>,
}

impl Window {
    pub fn from_scope(scope: Scope) -> Self {
        match scope {
            Scope::Future => Window {
                lower: None,
                upper: None,
            },
            Scope::Day(day) => Window {
                lower: Some(day.start()),
                upper: Some(day.end()),
            },
            Scope::Range(first, last) => Window {
                lower: Some(first.start()),
                upper: Some(last.end()),
            },
        }
    }

    /// Range bounds of the non-past part of the window, or `None` when that
    /// part is empty (inverted window, or window entirely in the past).
    pub fn future_bounds(&self, clock: Instant) -> Option<(Bound<Instant>, Bound<Instant>)> {
        if let Some(upper) = self.upper {
            if upper <= clock {
                return None;
            }
            if self.lower.is_some_and(|lower| lower > upper) {
                return None;
            }
        }
        let lower = match self.lower {
            Some(lower) if lower > clock => Bound::Included(lower),
            _ => Bound::Excluded(clock),
        };
        let upper = self.upper.map_or(Bound::Unbounded, Bound::Included);
        Some((lower, upper))
    }
}

/// A parsed query: scope, optional tag expression, optional title filter
#[derive(Debug, Clone)]
pub struct Query {
    pub scope: Scope,
    pub expr: Option<Expr>,
    pub title: Option<Regex>,
}

impl Query {
    pub fn new(scope: Scope) -> Self {
        Query {
            scope,
            expr: None,
            title: None,
        }
    }

    /// Build a query from expression text; blank text matches everything
    pub fn parse(scope: Scope, expression: &str) -> Result<Self, ExprError> {
        Ok(Query {
            scope,
            expr: parse_expr(expression)?,
            title: None,
        })
    }

    pub fn with_title(mut self, pattern: Regex) -> Self {
        self.title = Some(pattern);
        self
    }
}

/// Run a query against the store: ascending instants of non-past tasks in
/// the window that satisfy the expression and title filter.
pub fn evaluate(store: &TaskStore, clock: Instant, query: &Query) -> Vec<Instant> {
    let Some(bounds) = Window::from_scope(query.scope).future_bounds(clock) else {
        return Vec::new();
    };
    let matched = match &query.expr {
        None => store.instants(bounds),
        Some(expr) => Evaluator::new(store, bounds).eval(expr),
    };
    match &query.title {
        None => matched,
        Some(re) => matched
            .into_iter()
            .filter(|at| store.get(*at).is_some_and(|task| re.is_match(&task.title)))
            .collect(),
    }
}

/// Bottom-up fold of an expression into sorted instant sets, every leaf
/// already bounded to the window.
struct Evaluator<'a> {
    store: &'a TaskStore,
    bounds: (Bound<Instant>, Bound<Instant>),
    universe: Option<Vec<Instant>>,
}

impl<'a> Evaluator<'a> {
    fn new(store: &'a TaskStore, bounds: (Bound<Instant>, Bound<Instant>)) -> Self {
        Evaluator {
            store,
            bounds,
            universe: None,
        }
    }

    fn eval(&mut self, expr: &Expr) -> Vec<Instant> {
        match expr {
            Expr::Tag(tag) => self.store.tagged(tag, self.bounds),
            Expr::Group(inner) => self.eval(inner),
            Expr::And(lhs, rhs) => {
                let lhs = self.eval(lhs);
                if lhs.is_empty() {
                    return lhs;
                }
                merge::intersect(&lhs, &self.eval(rhs))
            }
            Expr::Or(lhs, rhs) => {
                let lhs = self.eval(lhs);
                merge::union(&lhs, &self.eval(rhs))
            }
            Expr::Not(inner) => {
                let excluded = self.eval(inner);
                merge::difference(self.universe(), &excluded)
            }
        }
    }

    /// Every task instant in the window, computed once per query
    fn universe(&mut self) -> &[Instant] {
        let (store, bounds) = (self.store, self.bounds);
        self.universe.get_or_insert_with(|| store.instants(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Task;
    use proptest::prelude::*;

    fn at(s: &str) -> Instant {
        s.parse().unwrap()
    }

    fn day(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn sample_store() -> TaskStore {
        let mut store = TaskStore::new();
        store.insert(at("10.05.24 09:00"), Task::with_tags("Standup", ["work"]).unwrap());
        store.insert(
            at("10.05.24 10:00"),
            Task::with_tags("Incident review", ["work", "urgent"]).unwrap(),
        );
        store.insert(at("11.05.24 08:00"), Task::with_tags("Groceries", ["home"]).unwrap());
        store
    }

    fn run(store: &TaskStore, clock: &str, scope: Scope, expr: &str) -> Vec<Instant> {
        evaluate(store, at(clock), &Query::parse(scope, expr).unwrap())
    }

    #[test]
    fn test_day_and() {
        let store = sample_store();
        let hits = run(&store, "01.05.24 00:00", Scope::Day(day("10.05.24")), "work AND urgent");
        assert_eq!(hits, vec![at("10.05.24 10:00")]);
    }

    #[test]
    fn test_range_or() {
        let store = sample_store();
        let scope = Scope::Range(day("10.05.24"), day("11.05.24"));
        let hits = run(&store, "01.05.24 00:00", scope, "work OR home");
        assert_eq!(
            hits,
            vec![at("10.05.24 09:00"), at("10.05.24 10:00"), at("11.05.24 08:00")]
        );
    }

    #[test]
    fn test_range_not() {
        let store = sample_store();
        let scope = Scope::Range(day("10.05.24"), day("11.05.24"));
        let hits = run(&store, "01.05.24 00:00", scope, "NOT urgent");
        assert_eq!(hits, vec![at("10.05.24 09:00"), at("11.05.24 08:00")]);
    }

    #[test]
    fn test_not_of_group() {
        let store = sample_store();
        let hits = run(&store, "01.05.24 00:00", Scope::Future, "NOT (urgent OR home)");
        assert_eq!(hits, vec![at("10.05.24 09:00")]);
    }

    #[test]
    fn test_empty_expression_matches_all_future() {
        let store = sample_store();
        let hits = run(&store, "10.05.24 09:00", Scope::Future, "");
        assert_eq!(hits, vec![at("10.05.24 10:00"), at("11.05.24 08:00")]);
    }

    #[test]
    fn test_past_tasks_excluded() {
        let store = sample_store();
        let hits = run(&store, "10.05.24 10:00", Scope::Day(day("10.05.24")), "work");
        assert!(hits.is_empty());
        let hits = run(&store, "10.05.24 09:30", Scope::Day(day("10.05.24")), "NOT home");
        assert_eq!(hits, vec![at("10.05.24 10:00")]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let store = sample_store();
        let scope = Scope::Range(day("11.05.24"), day("10.05.24"));
        assert!(run(&store, "01.05.24 00:00", scope, "").is_empty());
        assert!(run(&store, "01.05.24 00:00", scope, "NOT work").is_empty());
    }

    #[test]
    fn test_unknown_tag_is_empty() {
        let store = sample_store();
        assert!(run(&store, "01.05.24 00:00", Scope::Future, "nope").is_empty());
        assert_eq!(
            run(&store, "01.05.24 00:00", Scope::Future, "nope OR home"),
            vec![at("11.05.24 08:00")]
        );
    }

    #[test]
    fn test_title_filter_after_expression() {
        let store = sample_store();
        let query = Query::parse(Scope::Future, "work")
            .unwrap()
            .with_title(Regex::new("(?i)incident").unwrap());
        assert_eq!(
            evaluate(&store, at("01.05.24 00:00"), &query),
            vec![at("10.05.24 10:00")]
        );
    }

    #[test]
    fn test_future_bounds() {
        let clock = at("10.05.24 12:00");
        let window = Window::from_scope(Scope::Day(day("10.05.24")));
        assert_eq!(
            window.future_bounds(clock),
            Some((Bound::Excluded(clock), Bound::Included(at("10.05.24 23:59"))))
        );
        let window = Window::from_scope(Scope::Day(day("09.05.24")));
        assert_eq!(window.future_bounds(clock), None);
        let window = Window::from_scope(Scope::Day(day("11.05.24")));
        assert_eq!(
            window.future_bounds(clock),
            Some((
                Bound::Included(at("11.05.24 00:00")),
                Bound::Included(at("11.05.24 23:59"))
            ))
        );
    }

    // --- Soundness and completeness against a brute-force scan ---

    const TAGS: [&str; 4] = ["a", "b", "c", "d"];

    fn arb_expr() -> impl Strategy<Value = Expr> {
        let leaf = prop::sample::select(TAGS.to_vec()).prop_map(|t| Expr::Tag(t.to_string()));
        leaf.prop_recursive(4, 24, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|e| Expr::Not(Box::new(e))),
                inner.clone().prop_map(|e| Expr::Group(Box::new(e))),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::And(Box::new(l), Box::new(r))),
                (inner.clone(), inner).prop_map(|(l, r)| Expr::Or(Box::new(l), Box::new(r))),
            ]
        })
    }

    fn arb_store() -> impl Strategy<Value = TaskStore> {
        prop::collection::btree_map(
            (1u32..=6, 0u8..24),
            prop::collection::vec(prop::sample::select(TAGS.to_vec()), 0..3),
            0..30,
        )
        .prop_map(|entries| {
            let mut store = TaskStore::new();
            for ((d, h), tags) in entries {
                let at = Instant::new(
                    Day::from_ymd(2024, 5, d).unwrap(),
                    crate::model::instant::TimeOfDay::new(h, 0).unwrap(),
                );
                store.insert(at, Task::with_tags(format!("task {d} {h}"), tags).unwrap());
            }
            store
        })
    }

    proptest! {
        #[test]
        fn prop_query_is_sound_and_complete(
            store in arb_store(),
            expr in arb_expr(),
            clock_day in 1u32..=6,
            first in 1u32..=6,
            last in 1u32..=6,
        ) {
            let clock = Day::from_ymd(2024, 5, clock_day).unwrap().start();
            let (first, last) = (
                Day::from_ymd(2024, 5, first).unwrap(),
                Day::from_ymd(2024, 5, last).unwrap(),
            );
            let mut query = Query::new(Scope::Range(first, last));
            query.expr = Some(expr.clone());

            let expected: Vec<Instant> = store
                .range(..)
                .filter(|(at, task)| {
                    *at > clock && *at >= first.start() && *at <= last.end() && expr.matches(task)
                })
                .map(|(at, _)| at)
                .collect();
            prop_assert_eq!(evaluate(&store, clock, &query), expected);
        }
    }
}
