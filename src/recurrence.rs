//! Recurrence calculator — next occurrence, active-on-date, and daily dose times.
//!
//! Pure functions over `chrono` naive types. Times are wall-clock times in the
//! caller's zone; the calculator never looks at a clock of its own.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::config::SEARCH_HORIZON_DAYS;
use crate::error::ScheduleError;
use crate::models::enums::{DoseInterval, RecurrenceRule};
use crate::models::schedule::{ActiveSpan, NoOccurrence, Occurrence, ScheduledItem};

// ═══════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════

/// Parses a stored time of day, `HH:MM:SS` or `HH:MM`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| ScheduleError::InvalidTime(raw.into()))
}

/// Parses a strict `HH:MM` time of day.
pub fn parse_hour_minute(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let s = raw.trim();
    if s.len() != 5 {
        return Err(ScheduleError::InvalidTime(raw.into()));
    }
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ScheduleError::InvalidTime(raw.into()))
}

/// Parses a stored `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(raw.into()))
}

// ═══════════════════════════════════════════
// Calendar arithmetic
// ═══════════════════════════════════════════

/// Adds calendar months, clamping to the last day of the resulting month
/// (Jan 31 + 1 month = Feb 28 or 29).
pub fn add_months_clamped(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 31,
    }
}

/// The day-of-month a monthly item anchored on `anchor_day` falls on in the
/// month of `date`.
fn monthly_day_in(date: NaiveDate, anchor_day: u32) -> u32 {
    anchor_day.min(days_in_month(date.year(), date.month()))
}

fn advance(candidate: NaiveDateTime, rule: RecurrenceRule) -> Option<NaiveDateTime> {
    match rule {
        RecurrenceRule::Once => None,
        RecurrenceRule::Daily => candidate.checked_add_days(Days::new(1)),
        RecurrenceRule::Weekly => candidate.checked_add_days(Days::new(7)),
        RecurrenceRule::Monthly => {
            add_months_clamped(candidate.date(), 1).map(|d| d.and_time(candidate.time()))
        }
    }
}

// ═══════════════════════════════════════════
// Next occurrence
// ═══════════════════════════════════════════

/// Next instant at or after `now` at which an item scheduled at
/// `time_of_day` with `rule` occurs.
///
/// The candidate is today's date at `time_of_day` (for `Once`, the target
/// date `end_date` when given). A candidate already in the past is advanced
/// by one step of the rule; `Once` never advances. A candidate dated after
/// `end_date` yields [`NoOccurrence::PastEndDate`].
pub fn next_occurrence(
    now: NaiveDateTime,
    time_of_day: NaiveTime,
    rule: RecurrenceRule,
    end_date: Option<NaiveDate>,
) -> Occurrence {
    let day = match (rule, end_date) {
        (RecurrenceRule::Once, Some(target)) => target,
        _ => now.date(),
    };
    let mut candidate = day.and_time(time_of_day);

    if candidate < now {
        match advance(candidate, rule) {
            Some(next) => candidate = next,
            None if rule == RecurrenceRule::Once => {
                return Occurrence::None(NoOccurrence::OncePassed)
            }
            None => return Occurrence::None(NoOccurrence::PastEndDate),
        }
    }

    match end_date {
        Some(end) if candidate.date() > end => Occurrence::None(NoOccurrence::PastEndDate),
        _ => Occurrence::At(candidate),
    }
}

/// [`next_occurrence`] over the stored column formats.
pub fn next_occurrence_str(
    now: NaiveDateTime,
    time_of_day: &str,
    rule: &str,
    end_date: Option<&str>,
) -> Result<Occurrence, ScheduleError> {
    let time = parse_time_of_day(time_of_day)?;
    let rule: RecurrenceRule = rule.parse()?;
    let end = end_date
        .filter(|s| !s.trim().is_empty())
        .map(parse_date)
        .transpose()?;
    Ok(next_occurrence(now, time, rule, end))
}

/// Next occurrence of `item` at or after `now`, anchored on the item's start
/// date: weekly items keep the start weekday, monthly items keep the start
/// day-of-month (clamped), and weekday masks and spans are honoured.
///
/// The walk covers [`SEARCH_HORIZON_DAYS`]; a cadence that finds nothing in
/// that window yields [`NoOccurrence::BeyondHorizon`].
pub fn next_occurrence_for(item: &ScheduledItem, now: NaiveDateTime) -> Occurrence {
    if let Some(target) = item.target_date() {
        let candidate = target.and_time(item.time_of_day);
        return if candidate >= now && is_active_on(target, item) {
            Occurrence::At(candidate)
        } else {
            Occurrence::None(NoOccurrence::OncePassed)
        };
    }

    let mut day = now.date().max(item.start_date);
    let last = item.last_date();

    for _ in 0..SEARCH_HORIZON_DAYS {
        if last.is_some_and(|end| day > end) {
            return Occurrence::None(NoOccurrence::PastEndDate);
        }
        let candidate = day.and_time(item.time_of_day);
        if candidate >= now && occurs_on(day, item) {
            return Occurrence::At(candidate);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => return Occurrence::None(NoOccurrence::PastEndDate),
        }
    }

    Occurrence::None(NoOccurrence::BeyondHorizon)
}

// ═══════════════════════════════════════════
// Active-on-date
// ═══════════════════════════════════════════

/// Whether `item` is in effect on `target`.
///
/// Before the start date nothing is active. A continuous item stays active
/// from its start on; an end date is inclusive; a duration of N days covers
/// `[start, start + N)`. A weekday mask additionally restricts the weekday.
/// A `Once` item is active only on its target date.
pub fn is_active_on(target: NaiveDate, item: &ScheduledItem) -> bool {
    if target < item.start_date {
        return false;
    }

    if let Some(once_on) = item.target_date() {
        return target == once_on && weekday_allowed(target, item);
    }

    let within_span = match item.span {
        ActiveSpan::Continuous => true,
        ActiveSpan::Until(end) => target <= end,
        ActiveSpan::ForDays(days) => (target - item.start_date).num_days() < i64::from(days),
    };

    within_span && weekday_allowed(target, item)
}

fn weekday_allowed(target: NaiveDate, item: &ScheduledItem) -> bool {
    item.weekdays
        .map_or(true, |mask| mask.contains(target.weekday()))
}

/// Whether `item` produces an occurrence on `date`: active on that date and
/// on the rule's cadence from the start date.
pub fn occurs_on(date: NaiveDate, item: &ScheduledItem) -> bool {
    if !is_active_on(date, item) {
        return false;
    }
    match item.rule {
        RecurrenceRule::Once | RecurrenceRule::Daily => true,
        RecurrenceRule::Weekly => {
            item.weekdays.is_some() || date.weekday() == item.start_date.weekday()
        }
        RecurrenceRule::Monthly => date.day() == monthly_day_in(date, item.start_date.day()),
    }
}

// ═══════════════════════════════════════════
// Daily dose times
// ═══════════════════════════════════════════

/// Evenly spaced times across one day, starting at `start` and wrapping past
/// midnight, in generation order.
pub fn daily_times(start: NaiveTime, interval: DoseInterval) -> Vec<NaiveTime> {
    let step = chrono::Duration::hours(i64::from(interval.hours()));
    (0..interval.doses_per_day())
        .map(|i| {
            let (time, _wrapped) = start.overflowing_add_signed(step * i as i32);
            time
        })
        .collect()
}

/// `HH:MM` strings for [`daily_times`], validating both inputs.
pub fn generate_daily_times(start: &str, interval_hours: u32) -> Result<Vec<String>, ScheduleError> {
    let interval = DoseInterval::try_from(interval_hours)?;
    let start = parse_hour_minute(start)?;
    Ok(daily_times(start, interval)
        .into_iter()
        .map(|t| format!("{:02}:{:02}", t.hour(), t.minute()))
        .collect())
}
