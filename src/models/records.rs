use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::{DoseInterval, RecurrenceRule};
use super::schedule::{ActiveSpan, Occurrence, ScheduledItem, WeekdayMask};
use crate::error::ScheduleError;
use crate::recurrence::{self, parse_date, parse_time_of_day};

/// Empty strings in optional date columns mean "not set".
fn optional_date(raw: &Option<String>) -> Result<Option<NaiveDate>, ScheduleError> {
    raw.as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_date)
        .transpose()
}

/// A task row as supplied by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    /// HH:MM:SS
    #[serde(rename = "horario_tarefa")]
    pub time_of_day: String,
    /// End date for repeating tasks, target date for one-off tasks.
    #[serde(rename = "repete_ate", default)]
    pub repeat_until: Option<String>,
    #[serde(rename = "tipo_recorrencia")]
    pub recurrence: String,
    #[serde(rename = "data_criacao", default)]
    pub created_on: Option<String>,
}

impl TaskRecord {
    pub fn rule(&self) -> Result<RecurrenceRule, ScheduleError> {
        self.recurrence.parse()
    }

    /// Next occurrence of this task at or after `now`.
    ///
    /// Rows with a creation date keep that date's cadence; rows without one
    /// fall back to the today-based candidate.
    pub fn next_occurrence(&self, now: NaiveDateTime) -> Result<Occurrence, ScheduleError> {
        if optional_date(&self.created_on)?.is_some() {
            let item = self.to_scheduled_item(now.date())?;
            return Ok(recurrence::next_occurrence_for(&item, now));
        }
        recurrence::next_occurrence_str(
            now,
            &self.time_of_day,
            &self.recurrence,
            self.repeat_until.as_deref(),
        )
    }

    /// Validated schedule. Rows without a creation date are anchored on
    /// `fallback_start`.
    pub fn to_scheduled_item(&self, fallback_start: NaiveDate) -> Result<ScheduledItem, ScheduleError> {
        let rule = self.rule()?;
        let time = parse_time_of_day(&self.time_of_day)?;
        let until = optional_date(&self.repeat_until)?;
        let start = optional_date(&self.created_on)?.unwrap_or(fallback_start);

        Ok(match rule {
            RecurrenceRule::Once => ScheduledItem::once(start, until.unwrap_or(start), time),
            _ => ScheduledItem::recurring(
                rule,
                start,
                time,
                until.map_or(ActiveSpan::Continuous, ActiveSpan::Until),
            ),
        })
    }
}

fn default_recurrence() -> String {
    RecurrenceRule::Daily.as_str().to_string()
}

/// A medication row as supplied by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    /// First dose of the day, HH:MM or HH:MM:SS.
    #[serde(rename = "horario_inicial")]
    pub first_dose: String,
    #[serde(rename = "intervalo_horas", default)]
    pub interval_hours: Option<u32>,
    #[serde(rename = "tipo_recorrencia", default = "default_recurrence")]
    pub recurrence: String,
    #[serde(rename = "data_inicio")]
    pub start_date: String,
    #[serde(rename = "data_fim", default)]
    pub end_date: Option<String>,
    #[serde(rename = "duracao_dias", default)]
    pub duration_days: Option<u32>,
    #[serde(rename = "uso_continuo", default)]
    pub continuous_use: bool,
    /// Weekday indices, Sunday = 0.
    #[serde(rename = "dias_semana", default)]
    pub weekdays: Option<Vec<u8>>,
}

impl MedicationRecord {
    pub fn interval(&self) -> Result<Option<DoseInterval>, ScheduleError> {
        self.interval_hours.map(DoseInterval::try_from).transpose()
    }

    /// Span precedence: continuous use, then end date, then duration.
    pub fn span(&self) -> Result<ActiveSpan, ScheduleError> {
        if self.continuous_use {
            return Ok(ActiveSpan::Continuous);
        }
        if let Some(end) = optional_date(&self.end_date)? {
            return Ok(ActiveSpan::Until(end));
        }
        Ok(self
            .duration_days
            .map_or(ActiveSpan::Continuous, ActiveSpan::ForDays))
    }

    /// Schedule of the first dose of each day.
    pub fn to_scheduled_item(&self) -> Result<ScheduledItem, ScheduleError> {
        let rule: RecurrenceRule = self.recurrence.parse()?;
        let time = parse_time_of_day(&self.first_dose)?;
        let start = parse_date(&self.start_date)?;
        let span = self.span()?;

        let item = match (rule, span) {
            (RecurrenceRule::Once, ActiveSpan::Until(target)) => ScheduledItem::once(start, target, time),
            (RecurrenceRule::Once, _) => ScheduledItem::once(start, start, time),
            _ => ScheduledItem::recurring(rule, start, time, span),
        };

        match &self.weekdays {
            Some(days) => Ok(item.with_weekdays(WeekdayMask::from_indices(days)?)),
            None => Ok(item),
        }
    }

    /// Dose times within one day, in generation order.
    pub fn dose_times(&self) -> Result<Vec<NaiveTime>, ScheduleError> {
        let first = parse_time_of_day(&self.first_dose)?;
        Ok(match self.interval()? {
            Some(interval) => recurrence::daily_times(first, interval),
            None => vec![first],
        })
    }

    /// One schedule per dose time of the day. Doses that wrap past midnight
    /// belong to the next calendar day of each dosing day, so their schedule
    /// starts and ends one day later.
    pub fn dose_schedules(&self) -> Result<Vec<ScheduledItem>, ScheduleError> {
        let base = self.to_scheduled_item()?;
        self.dose_times()?
            .into_iter()
            .map(|time_of_day| {
                let item = ScheduledItem {
                    time_of_day,
                    ..base.clone()
                };
                if time_of_day >= base.time_of_day {
                    return Ok(item);
                }
                item.shifted_one_day()
                    .ok_or_else(|| ScheduleError::InvalidDate(self.start_date.clone()))
            })
            .collect()
    }
}
