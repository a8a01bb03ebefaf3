use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error type for parsing days, times and instants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstantParseError {
    #[error("invalid day '{0}': expected dd.mm.yy")]
    InvalidDay(String),
    #[error("invalid time '{0}': expected hh:mm")]
    InvalidTime(String),
    #[error("invalid instant '{0}': expected dd.mm.yy hh:mm")]
    InvalidInstant(String),
    #[error("year {0} cannot be written as dd.mm.yy (1969-2068)")]
    YearOutOfRange(i32),
}

/// Years a two-digit `yy` reads back as: 69-99 are 19xx, 00-68 are 20xx
pub const YEARS: std::ops::RangeInclusive<i32> = 1969..=2068;

/// A calendar day, written `dd.mm.yy`. Defaults to 01.01.70.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    /// `None` for an impossible date or a year outside [`YEARS`]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Day> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|date| Day::try_from(date).ok())
    }

    /// First instant of this day (00:00)
    pub fn start(self) -> Instant {
        Instant::new(self, TimeOfDay::MIDNIGHT)
    }

    /// Last instant of this day (23:59)
    pub fn end(self) -> Instant {
        Instant::new(self, TimeOfDay::LAST_MINUTE)
    }
}

impl TryFrom<NaiveDate> for Day {
    type Error = InstantParseError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        if !YEARS.contains(&date.year()) {
            return Err(InstantParseError::YearOutOfRange(date.year()));
        }
        Ok(Day(date))
    }
}

impl FromStr for Day {
    type Err = InstantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InstantParseError::InvalidDay(s.to_string());
        // chrono accepts unpadded fields; the text form must be exactly dd.mm.yy
        if !fixed_layout(s, &[2, 5], b'.') {
            return Err(err());
        }
        NaiveDate::parse_from_str(s, "%d.%m.%y")
            .map(Day)
            .map_err(|_| err())
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d.%m.%y"))
    }
}

/// A time of day at minute resolution, written `hh:mm`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };
    pub const LAST_MINUTE: TimeOfDay = TimeOfDay {
        hour: 23,
        minute: 59,
    };

    pub fn new(hour: u8, minute: u8) -> Option<TimeOfDay> {
        (hour < 24 && minute < 60).then_some(TimeOfDay { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl FromStr for TimeOfDay {
    type Err = InstantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InstantParseError::InvalidTime(s.to_string());
        if !fixed_layout(s, &[2], b':') {
            return Err(err());
        }
        let hour = s[0..2].parse().map_err(|_| err())?;
        let minute = s[3..5].parse().map_err(|_| err())?;
        TimeOfDay::new(hour, minute).ok_or_else(err)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A point in time: the unique key of a task.
///
/// Ordering is day-major, then time of day (field order matters for the
/// derived `Ord`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    pub day: Day,
    pub time: TimeOfDay,
}

impl Instant {
    pub fn new(day: Day, time: TimeOfDay) -> Self {
        Instant { day, time }
    }

    /// Same time of day, on another day
    pub fn with_day(self, day: Day) -> Self {
        Instant { day, ..self }
    }

    /// Same day, at another time
    pub fn with_time(self, time: TimeOfDay) -> Self {
        Instant { time, ..self }
    }
}

impl FromStr for Instant {
    type Err = InstantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, time) = s
            .split_once(' ')
            .ok_or_else(|| InstantParseError::InvalidInstant(s.to_string()))?;
        Ok(Instant::new(day.parse()?, time.parse()?))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.time)
    }
}

impl Serialize for Instant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Instant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Check that `s` is ASCII digits except for `sep` at each of `seps`,
/// with two digits after the last separator.
fn fixed_layout(s: &str, seps: &[usize], sep: u8) -> bool {
    let bytes = s.as_bytes();
    let len = seps.last().map_or(0, |last| last + 3);
    bytes.len() == len
        && bytes.iter().enumerate().all(|(i, &b)| {
            if seps.contains(&i) {
                b == sep
            } else {
                b.is_ascii_digit()
            }
        })
}
