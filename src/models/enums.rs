use crate::error::ScheduleError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The stored string is also the serde representation.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ScheduleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ScheduleError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// How often a task or medication repeats (`tipo_recorrencia`).
    RecurrenceRule {
        Once => "Única",
        Daily => "Diária",
        Weekly => "Semanal",
        Monthly => "Mensal",
    }
);

impl RecurrenceRule {
    pub fn repeats(&self) -> bool {
        !matches!(self, Self::Once)
    }
}

/// Spacing between doses within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DoseInterval {
    Every4h,
    Every6h,
    Every8h,
    Every12h,
}

impl DoseInterval {
    pub fn hours(&self) -> u32 {
        match self {
            Self::Every4h => 4,
            Self::Every6h => 6,
            Self::Every8h => 8,
            Self::Every12h => 12,
        }
    }

    /// Number of doses that fit in a day.
    pub fn doses_per_day(&self) -> u32 {
        24 / self.hours()
    }
}

impl TryFrom<u32> for DoseInterval {
    type Error = ScheduleError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        match hours {
            4 => Ok(Self::Every4h),
            6 => Ok(Self::Every6h),
            8 => Ok(Self::Every8h),
            12 => Ok(Self::Every12h),
            other => Err(ScheduleError::InvalidInterval(other)),
        }
    }
}

impl From<DoseInterval> for u32 {
    fn from(interval: DoseInterval) -> Self {
        interval.hours()
    }
}
