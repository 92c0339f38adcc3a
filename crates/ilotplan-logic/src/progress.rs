//! Advisory progress notifications.
//!
//! Sinks are called synchronously between stages and never influence the
//! layout. Closures taking a [`ProgressEvent`] work as sinks directly.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Grid,
    Zones,
    Seeding,
    Optimization,
    Densification,
    Corridors,
    Done,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Grid => "grid",
            Stage::Zones => "zones",
            Stage::Seeding => "seeding",
            Stage::Optimization => "optimization",
            Stage::Densification => "densification",
            Stage::Corridors => "corridors",
            Stage::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// 0–100.
    pub progress: u8,
    pub message: String,
}

pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

/// Keeps every event, in order.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    pub events: Vec<ProgressEvent>,
}

impl ProgressSink for ProgressLog {
    fn report(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }
}

/// Log the event and forward it.
pub(crate) fn emit(sink: &mut dyn ProgressSink, stage: Stage, progress: u8, message: String) {
    log::debug!("[{:>3}%] {}: {}", progress, stage.name(), message);
    sink.report(ProgressEvent {
        stage,
        progress: progress.min(100),
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: ProgressEvent| seen.push(e.stage);
            emit(&mut sink, Stage::Grid, 5, "grid".into());
            emit(&mut sink, Stage::Done, 100, "done".into());
        }
        assert_eq!(seen, vec![Stage::Grid, Stage::Done]);
    }

    #[test]
    fn test_progress_clamped() {
        let mut log = ProgressLog::default();
        emit(&mut log, Stage::Done, 250, String::new());
        assert_eq!(log.events[0].progress, 100);
    }
}
