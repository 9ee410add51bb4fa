//! Time formatting helpers

use chrono::{DateTime, Local, Utc};

/// Local wall-clock label (`HH:MM`) as shown next to a notification
pub fn clock_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}
