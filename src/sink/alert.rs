//! Best-effort alert side effects
//!
//! Alerts fire on every new notification. Failures are reported to the sink,
//! which logs and discards them.

use std::io::Write;

use crate::error::AlertError;
use crate::types::Notification;

/// Audible and visible alert hooks
pub trait Alerter: Send + Sync {
    /// Play the short notification sound
    fn play_sound(&self) -> Result<(), AlertError>;

    /// Show an OS-level alert for `notification`
    fn show_alert(&self, notification: &Notification) -> Result<(), AlertError>;
}

/// Alerter that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlerter;

impl Alerter for SilentAlerter {
    fn play_sound(&self) -> Result<(), AlertError> {
        Ok(())
    }

    fn show_alert(&self, _notification: &Notification) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Alerter for terminal sessions: rings the bell and prints a line to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlerter;

impl Alerter for TerminalAlerter {
    fn play_sound(&self) -> Result<(), AlertError> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }

    fn show_alert(&self, notification: &Notification) -> Result<(), AlertError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "🔔 {}: {}", notification.title, notification.body)?;
        Ok(())
    }
}
