//! Audible notification for alert transitions

use std::io::Write;

/// Plays the warning and alert tones.
///
/// Calls are fire-and-forget from the tracker's point of view: errors are
/// logged by the caller and never propagated.
pub trait SoundNotifier: Send + Sync {
    /// Tone for a transition into Warning
    fn play_warning(&self) -> Result<(), SoundError>;

    /// Tone for a transition into Critical
    fn play_alert(&self) -> Result<(), SoundError>;
}

/// Rings the terminal bell on stderr: once for a warning, twice for an alert
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl TerminalBell {
    /// Create a bell notifier
    pub fn new() -> Self {
        Self
    }

    fn ring(&self, times: usize) -> Result<(), SoundError> {
        let mut stderr = std::io::stderr().lock();
        for _ in 0..times {
            stderr.write_all(b"\x07")?;
        }
        stderr.flush()?;
        Ok(())
    }
}

impl SoundNotifier for TerminalBell {
    fn play_warning(&self) -> Result<(), SoundError> {
        self.ring(1)
    }

    fn play_alert(&self) -> Result<(), SoundError> {
        self.ring(2)
    }
}

/// Silent notifier that only records the tone in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl SoundNotifier for LogNotifier {
    fn play_warning(&self) -> Result<(), SoundError> {
        tracing::info!("Warning tone");
        Ok(())
    }

    fn play_alert(&self) -> Result<(), SoundError> {
        tracing::info!("Alert tone");
        Ok(())
    }
}

/// Sound playback errors
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("Audio output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio device unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier.play_warning().is_ok());
        assert!(notifier.play_alert().is_ok());
    }

    #[test]
    fn test_terminal_bell_writes() {
        // stderr is always writable under the test harness
        let bell = TerminalBell::new();
        assert!(bell.play_warning().is_ok());
    }
}
