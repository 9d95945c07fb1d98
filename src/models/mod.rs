pub mod enums;
pub mod records;
pub mod schedule;

pub use enums::{DoseInterval, RecurrenceRule};
pub use records::{MedicationRecord, TaskRecord};
pub use schedule::{ActiveSpan, NoOccurrence, Occurrence, ScheduledItem, WeekdayMask};
