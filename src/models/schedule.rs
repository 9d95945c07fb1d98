use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::enums::RecurrenceRule;
use crate::error::ScheduleError;

/// How long a scheduled item stays in effect after its start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActiveSpan {
    /// Continuous use: no end date, no fixed duration.
    Continuous,
    /// Active up to and including this date.
    Until(NaiveDate),
    /// Active for this many days: `[start, start + days)`.
    ForDays(u32),
}

/// Set of weekdays an item is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    /// Builds a mask from stored weekday indices (Sunday = 0 .. Saturday = 6).
    pub fn from_indices(indices: &[u8]) -> Result<Self, ScheduleError> {
        let mut bits = 0u8;
        for &idx in indices {
            if idx > 6 {
                return Err(ScheduleError::InvalidWeekday(idx));
            }
            bits |= 1 << idx;
        }
        Ok(Self(bits))
    }

    pub fn from_weekdays(days: &[Weekday]) -> Self {
        Self(
            days.iter()
                .fold(0u8, |bits, d| bits | 1 << d.num_days_from_sunday()),
        )
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Every weekday moved one day later (Saturday wraps to Sunday).
    pub fn shifted_one_day(&self) -> Self {
        Self(((self.0 << 1) | (self.0 >> 6)) & 0x7F)
    }
}

/// A task or medication dose schedule, as read by the calculator.
///
/// For `RecurrenceRule::Once` the end of an `ActiveSpan::Until` span is also
/// the single target date; use [`ScheduledItem::once`] to keep the two equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub time_of_day: NaiveTime,
    pub start_date: NaiveDate,
    pub span: ActiveSpan,
    pub rule: RecurrenceRule,
    pub weekdays: Option<WeekdayMask>,
}

impl ScheduledItem {
    /// One-off item occurring only on `target`.
    pub fn once(registered: NaiveDate, target: NaiveDate, time_of_day: NaiveTime) -> Self {
        Self {
            time_of_day,
            start_date: registered.min(target),
            span: ActiveSpan::Until(target),
            rule: RecurrenceRule::Once,
            weekdays: None,
        }
    }

    pub fn recurring(
        rule: RecurrenceRule,
        start_date: NaiveDate,
        time_of_day: NaiveTime,
        span: ActiveSpan,
    ) -> Self {
        Self {
            time_of_day,
            start_date,
            span,
            rule,
            weekdays: None,
        }
    }

    pub fn with_weekdays(mut self, mask: WeekdayMask) -> Self {
        self.weekdays = if mask.is_empty() { None } else { Some(mask) };
        self
    }

    /// The single date a `Once` item occurs on. `None` for repeating rules.
    pub fn target_date(&self) -> Option<NaiveDate> {
        match (self.rule, self.span) {
            (RecurrenceRule::Once, ActiveSpan::Until(end)) => Some(end),
            (RecurrenceRule::Once, _) => Some(self.start_date),
            _ => None,
        }
    }

    /// The same schedule one calendar day later. Start date, end date and
    /// weekday mask move together; a duration keeps its length.
    pub fn shifted_one_day(&self) -> Option<Self> {
        let span = match self.span {
            ActiveSpan::Until(end) => ActiveSpan::Until(end.succ_opt()?),
            other => other,
        };
        Some(Self {
            start_date: self.start_date.succ_opt()?,
            span,
            weekdays: self.weekdays.map(|mask| mask.shifted_one_day()),
            ..self.clone()
        })
    }

    /// Inclusive last date the item can occur on, if bounded.
    pub fn last_date(&self) -> Option<NaiveDate> {
        if let Some(target) = self.target_date() {
            return Some(target);
        }
        match self.span {
            ActiveSpan::Continuous => None,
            ActiveSpan::Until(end) => Some(end),
            ActiveSpan::ForDays(0) => self.start_date.pred_opt(),
            ActiveSpan::ForDays(days) => self
                .start_date
                .checked_add_days(chrono::Days::new(u64::from(days) - 1)),
        }
    }
}

/// Why a schedule has nothing left to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOccurrence {
    /// A one-off item whose instant has already passed.
    OncePassed,
    /// A repeating item whose next instant would fall after its end date.
    PastEndDate,
    /// The search gave up before finding an instant the item's cadence and
    /// weekday mask allow.
    BeyondHorizon,
}

/// Result of a next-occurrence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Occurrence {
    At(NaiveDateTime),
    None(NoOccurrence),
}

impl Occurrence {
    pub fn at(&self) -> Option<NaiveDateTime> {
        match self {
            Self::At(when) => Some(*when),
            Self::None(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::None(_))
    }
}
