//! Agenda — next task and next dose across many rows, display labels,
//! and the list of everything due on a given day.
//!
//! Rows that fail validation are logged and left out of the result so one
//! corrupt record never takes down the whole response.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::records::{MedicationRecord, TaskRecord};
use crate::models::schedule::Occurrence;
use crate::recurrence::{next_occurrence_for, occurs_on};

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Task,
    Medication,
}

/// The soonest upcoming item, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upcoming {
    pub kind: ItemKind,
    pub item_id: i64,
    pub title: String,
    pub at: NaiveDateTime,
    /// e.g. "Hoje, às 14:00"
    pub label: String,
}

/// One entry of a day's agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub kind: ItemKind,
    pub item_id: i64,
    pub title: String,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate<'a> {
    kind: ItemKind,
    item_id: i64,
    title: &'a str,
    at: NaiveDateTime,
}

fn soonest<'a>(candidates: impl Iterator<Item = Candidate<'a>>) -> Option<Candidate<'a>> {
    candidates.min_by(|a, b| a.at.cmp(&b.at).then_with(|| a.title.cmp(b.title)))
}

fn into_upcoming(candidate: Candidate<'_>, now: NaiveDateTime) -> Upcoming {
    Upcoming {
        kind: candidate.kind,
        item_id: candidate.item_id,
        title: candidate.title.to_string(),
        at: candidate.at,
        label: format_when(now, candidate.at),
    }
}

// ═══════════════════════════════════════════
// Soonest-across-items reduction
// ═══════════════════════════════════════════

/// Soonest task occurrence at or after `now`.
pub fn next_task(tasks: &[TaskRecord], now: NaiveDateTime) -> Option<Upcoming> {
    let candidates = tasks.iter().filter_map(|task| match task.next_occurrence(now) {
        Ok(Occurrence::At(at)) => {
            tracing::debug!(task_id = task.id, %at, "Task occurrence computed");
            Some(Candidate {
                kind: ItemKind::Task,
                item_id: task.id,
                title: &task.title,
                at,
            })
        }
        Ok(Occurrence::None(reason)) => {
            tracing::debug!(task_id = task.id, ?reason, "Task has no further occurrence");
            None
        }
        Err(e) => {
            tracing::warn!(task_id = task.id, error = %e, "Skipping malformed task row");
            None
        }
    });

    soonest(candidates).map(|c| into_upcoming(c, now))
}

/// Soonest medication dose at or after `now`, over every dose time of
/// every medication.
pub fn next_dose(medications: &[MedicationRecord], now: NaiveDateTime) -> Option<Upcoming> {
    let candidates = medications.iter().flat_map(|med| {
        let schedules = med.dose_schedules().unwrap_or_else(|e| {
            tracing::warn!(medication_id = med.id, error = %e, "Skipping malformed medication row");
            Vec::new()
        });
        schedules.into_iter().filter_map(move |item| {
            next_occurrence_for(&item, now).at().map(|at| Candidate {
                kind: ItemKind::Medication,
                item_id: med.id,
                title: &med.name,
                at,
            })
        })
    });

    soonest(candidates).map(|c| into_upcoming(c, now))
}

// ═══════════════════════════════════════════
// Display
// ═══════════════════════════════════════════

/// Human label for an occurrence relative to `now`:
/// "Hoje, às 14:00", "Amanhã, às 09:30", or "25/12/2024, às 08:00".
pub fn format_when(now: NaiveDateTime, at: NaiveDateTime) -> String {
    let clock = at.format("%H:%M");
    match (at.date() - now.date()).num_days() {
        0 => format!("Hoje, às {clock}"),
        1 => format!("Amanhã, às {clock}"),
        _ => format!("{}, às {clock}", at.format("%d/%m/%Y")),
    }
}

// ═══════════════════════════════════════════
// Daily agenda
// ═══════════════════════════════════════════

/// Every task and dose instant falling on `date`, in chronological order.
///
/// Tasks without a creation date are anchored on `undated_anchor`, the same
/// reference day [`next_task`] builds its candidate on (today, for a report).
pub fn daily_agenda(
    date: NaiveDate,
    undated_anchor: NaiveDate,
    tasks: &[TaskRecord],
    medications: &[MedicationRecord],
) -> Vec<AgendaEntry> {
    let mut entries = Vec::new();

    for task in tasks {
        match task.to_scheduled_item(undated_anchor) {
            Ok(item) if occurs_on(date, &item) => entries.push(AgendaEntry {
                kind: ItemKind::Task,
                item_id: task.id,
                title: task.title.clone(),
                at: date.and_time(item.time_of_day),
            }),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(task_id = task.id, error = %e, "Skipping malformed task row");
            }
        }
    }

    for med in medications {
        match med.dose_schedules() {
            Ok(schedules) => {
                entries.extend(schedules.into_iter().filter(|item| occurs_on(date, item)).map(
                    |item| AgendaEntry {
                        kind: ItemKind::Medication,
                        item_id: med.id,
                        title: med.name.clone(),
                        at: date.and_time(item.time_of_day),
                    },
                ));
            }
            Err(e) => {
                tracing::warn!(medication_id = med.id, error = %e, "Skipping malformed medication row");
            }
        }
    }

    entries.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| a.title.cmp(&b.title)));
    tracing::debug!(%date, count = entries.len(), "Daily agenda assembled");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        date(y, mo, d).and_time(NaiveTime::from_hms_opt(h, mi, 0).unwrap())
    }

    fn task(id: i64, title: &str, time: &str, rule: &str, until: Option<&str>) -> TaskRecord {
        TaskRecord {
            id,
            title: title.into(),
            time_of_day: time.into(),
            repeat_until: until.map(String::from),
            recurrence: rule.into(),
            created_on: None,
        }
    }

    fn med(id: i64, name: &str, first: &str, interval: Option<u32>) -> MedicationRecord {
        MedicationRecord {
            id,
            name: name.into(),
            first_dose: first.into(),
            interval_hours: interval,
            recurrence: "Diária".into(),
            start_date: "2024-01-01".into(),
            end_date: None,
            duration_days: None,
            continuous_use: true,
            weekdays: None,
        }
    }

    // ── format_when ──────────────────────────

    #[test]
    fn label_for_later_today() {
        let now = at(2024, 5, 10, 8, 0);
        assert_eq!(format_when(now, at(2024, 5, 10, 14, 0)), "Hoje, às 14:00");
    }

    #[test]
    fn label_for_tomorrow() {
        let now = at(2024, 5, 10, 23, 0);
        assert_eq!(format_when(now, at(2024, 5, 11, 9, 30)), "Amanhã, às 09:30");
    }

    #[test]
    fn label_for_later_dates() {
        let now = at(2024, 12, 20, 8, 0);
        assert_eq!(
            format_when(now, at(2024, 12, 25, 8, 0)),
            "25/12/2024, às 08:00"
        );
    }

    // ── next_task ────────────────────────────

    #[test]
    fn next_task_picks_global_minimum() {
        let now = at(2024, 5, 10, 15, 0);
        let tasks = vec![
            task(1, "Fisioterapia", "09:00:00", "Semanal", None),
            task(2, "Banho", "18:00:00", "Diária", None),
            task(3, "Consulta", "10:00:00", "Única", Some("2024-05-11")),
        ];
        let next = next_task(&tasks, now).unwrap();
        assert_eq!(next.item_id, 2);
        assert_eq!(next.at, at(2024, 5, 10, 18, 0));
        assert_eq!(next.label, "Hoje, às 18:00");
        assert_eq!(next.kind, ItemKind::Task);
    }

    #[test]
    fn next_task_ignores_exhausted_items() {
        let now = at(2024, 5, 10, 15, 0);
        let tasks = vec![
            task(1, "Exame", "09:00:00", "Única", Some("2024-05-10")),
            task(2, "Curativo", "09:00:00", "Diária", Some("2024-05-10")),
        ];
        assert_eq!(next_task(&tasks, now), None);
    }

    #[test]
    fn next_task_skips_malformed_rows() {
        let now = at(2024, 5, 10, 15, 0);
        let tasks = vec![
            task(1, "Corrompida", "xx:yy", "Diária", None),
            task(2, "Sem regra", "16:00:00", "Anual", None),
            task(3, "Caminhada", "17:00:00", "Diária", None),
        ];
        let next = next_task(&tasks, now).unwrap();
        assert_eq!(next.item_id, 3);
    }

    #[test]
    fn next_task_on_empty_input_is_none() {
        assert_eq!(next_task(&[], at(2024, 5, 10, 15, 0)), None);
    }

    #[test]
    fn ties_break_by_title() {
        let now = at(2024, 5, 10, 8, 0);
        let tasks = vec![
            task(1, "Medir pressão", "09:00:00", "Diária", None),
            task(2, "Hidratar", "09:00:00", "Diária", None),
        ];
        assert_eq!(next_task(&tasks, now).unwrap().item_id, 2);
    }

    // ── next_dose ────────────────────────────

    #[test]
    fn next_dose_considers_every_dose_time() {
        let now = at(2024, 5, 10, 17, 0);
        let meds = vec![
            med(1, "Amoxicilina", "08:00", Some(8)),
            med(2, "Losartana", "07:00", None),
        ];
        // Amoxicilina doses at 08:00, 16:00, 00:00: next is midnight
        let next = next_dose(&meds, now).unwrap();
        assert_eq!(next.item_id, 1);
        assert_eq!(next.at, at(2024, 5, 11, 0, 0));
        assert_eq!(next.label, "Amanhã, às 00:00");
    }

    #[test]
    fn next_dose_skips_malformed_rows() {
        let now = at(2024, 5, 10, 6, 0);
        let meds = vec![
            med(1, "Dipirona", "06:30", Some(7)),
            med(2, "Losartana", "07:00", None),
        ];
        let next = next_dose(&meds, now).unwrap();
        assert_eq!(next.item_id, 2);
        assert_eq!(next.at, at(2024, 5, 10, 7, 0));
    }

    #[test]
    fn next_dose_respects_finished_treatment() {
        let now = at(2024, 5, 10, 6, 0);
        let mut finished = med(1, "Prednisona", "08:00", None);
        finished.continuous_use = false;
        finished.duration_days = Some(5);
        assert_eq!(next_dose(&[finished], now), None);
    }

    // ── daily_agenda ─────────────────────────

    #[test]
    fn daily_agenda_is_sorted() {
        let day = date(2024, 5, 10);
        let tasks = vec![
            task(1, "Banho", "18:00:00", "Diária", None),
            task(2, "Consulta", "10:00:00", "Única", Some("2024-05-10")),
            task(3, "Outra consulta", "10:00:00", "Única", Some("2024-05-11")),
        ];
        let meds = vec![med(5, "Amoxicilina", "08:00", Some(8))];

        let agenda = daily_agenda(day, day, &tasks, &meds);
        let summary: Vec<(i64, NaiveDateTime)> =
            agenda.iter().map(|e| (e.item_id, e.at)).collect();
        assert_eq!(
            summary,
            vec![
                (5, at(2024, 5, 10, 0, 0)),
                (5, at(2024, 5, 10, 8, 0)),
                (2, at(2024, 5, 10, 10, 0)),
                (5, at(2024, 5, 10, 16, 0)),
                (1, at(2024, 5, 10, 18, 0)),
            ]
        );
    }

    #[test]
    fn daily_agenda_honours_weekday_mask() {
        // 2024-05-10 is a Friday
        let mut weekly = med(1, "Metotrexato", "09:00", None);
        weekly.weekdays = Some(vec![1]);
        assert!(daily_agenda(date(2024, 5, 10), date(2024, 5, 10), &[], &[weekly.clone()]).is_empty());
        assert_eq!(daily_agenda(date(2024, 5, 13), date(2024, 5, 10), &[], &[weekly]).len(), 1);
    }

    #[test]
    fn daily_agenda_skips_malformed_rows() {
        let tasks = vec![
            task(1, "Quebrada", "09:00:00", "Quinzenal", None),
            task(2, "Caminhada", "07:00:00", "Diária", None),
        ];
        let agenda = daily_agenda(date(2024, 5, 10), date(2024, 5, 10), &tasks, &[]);
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].title, "Caminhada");
    }

    #[test]
    fn undated_weekly_task_appears_once_a_week() {
        let tasks = vec![task(1, "Fisioterapia", "09:00:00", "Semanal", None)];
        let anchor = date(2024, 5, 10);
        let days_with_task = (10..=16)
            .filter(|d| !daily_agenda(date(2024, 5, *d), anchor, &tasks, &[]).is_empty())
            .count();
        assert_eq!(days_with_task, 1);
    }

    #[test]
    fn undated_monthly_task_appears_once_a_month() {
        let tasks = vec![task(1, "Troca de sonda", "09:00:00", "Mensal", None)];
        let anchor = date(2024, 5, 10);
        let days_with_task: Vec<u32> = (1..=31)
            .filter(|d| !daily_agenda(date(2024, 5, *d), anchor, &tasks, &[]).is_empty())
            .collect();
        assert_eq!(days_with_task, vec![10]);
    }

    #[test]
    fn dated_weekly_task_agrees_between_next_task_and_agenda() {
        // created on Monday 2024-05-06, report on Friday 2024-05-10
        let mut weekly = task(1, "Fisioterapia", "09:00:00", "Semanal", None);
        weekly.created_on = Some("2024-05-06".into());
        let tasks = vec![weekly];
        let now = at(2024, 5, 10, 8, 0);

        let next = next_task(&tasks, now).unwrap();
        assert_eq!(next.at, at(2024, 5, 13, 9, 0));
        assert_eq!(next.label, "13/05/2024, às 09:00");
        assert!(daily_agenda(now.date(), now.date(), &tasks, &[]).is_empty());
        assert_eq!(daily_agenda(date(2024, 5, 13), now.date(), &tasks, &[]).len(), 1);
    }

    fn eight_hourly_course() -> MedicationRecord {
        let mut course = med(1, "Amoxicilina", "08:00", Some(8));
        course.continuous_use = false;
        course.duration_days = Some(7);
        course
    }

    #[test]
    fn course_does_not_dose_before_first_dose() {
        let course = vec![eight_hourly_course()];
        let next = next_dose(&course, at(2024, 1, 1, 0, 0)).unwrap();
        assert_eq!(next.at, at(2024, 1, 1, 8, 0));

        let first_day: Vec<NaiveDateTime> = daily_agenda(date(2024, 1, 1), date(2024, 1, 1), &[], &course)
            .into_iter()
            .map(|e| e.at)
            .collect();
        assert_eq!(first_day, vec![at(2024, 1, 1, 8, 0), at(2024, 1, 1, 16, 0)]);
    }

    #[test]
    fn course_keeps_its_last_overnight_dose() {
        let course = vec![eight_hourly_course()];
        let last_day: Vec<NaiveDateTime> = daily_agenda(date(2024, 1, 8), date(2024, 1, 8), &[], &course)
            .into_iter()
            .map(|e| e.at)
            .collect();
        assert_eq!(last_day, vec![at(2024, 1, 8, 0, 0)]);
        assert!(daily_agenda(date(2024, 1, 9), date(2024, 1, 9), &[], &course).is_empty());
        assert_eq!(
            next_dose(&course, at(2024, 1, 7, 17, 0)).unwrap().at,
            at(2024, 1, 8, 0, 0)
        );
    }

    #[test]
    fn upcoming_serializes_kind_snake_case() {
        let now = at(2024, 5, 10, 8, 0);
        let tasks = vec![task(1, "Banho", "09:00:00", "Diária", None)];
        let json = serde_json::to_string(&next_task(&tasks, now).unwrap()).unwrap();
        assert!(json.contains("\"kind\":\"task\""));
        assert!(json.contains("Hoje, às 09:00"));
    }
}
