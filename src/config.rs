/// Application-level constants
pub const APP_NAME: &str = "Cuidar";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dosing intervals (hours) a medication schedule may use.
pub const ALLOWED_INTERVAL_HOURS: [u32; 4] = [4, 6, 8, 12];

/// How far ahead the anchored occurrence search walks before giving up.
/// One leap year plus a month covers every monthly and weekday-masked cadence.
pub const SEARCH_HORIZON_DAYS: u32 = 366 + 31;

/// Environment variable overriding the default log filter.
pub const LOG_ENV_VAR: &str = "CUIDAR_LOG";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "cuidar=info,cuidar_lib=info".to_string())
}
