//! Phase-change notification port.
//!
//! The engine calls [`Notifier::notify`] once per natural phase completion,
//! passing the phase that just began. How (or whether) anything reaches the
//! user is up to the implementation.

use std::sync::{Arc, Mutex};

use crate::timer::Phase;

pub trait Notifier {
    fn notify(&self, phase: Phase);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, phase: Phase) {
        (**self).notify(phase)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, phase: Phase) {
        (**self).notify(phase)
    }
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _phase: Phase) {}
}

/// Writes each notification as a `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, phase: Phase) {
        tracing::info!(
            phase = phase.as_str(),
            sound = phase.sound(),
            "{}: {}",
            phase.name(),
            phase.notification_body()
        );
    }
}

/// Keeps every notified phase in order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Phase>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().map(|v| v.len()).unwrap_or(0)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, phase: Phase) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_notifier_emits_info_record() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            LogNotifier.notify(Phase::LongBreak);
        });

        let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("INFO"), "{out}");
        assert!(out.contains("Long Break: Cycle complete. Step away."), "{out}");
        assert!(out.contains("phase=\"long_break\""), "{out}");
        assert!(out.contains("sound=\"Hero\""), "{out}");
    }

    #[test]
    fn recording_clones_share_log() {
        let a = RecordingNotifier::new();
        let b = a.clone();
        b.notify(Phase::ShortBreak);
        a.notify(Phase::Focus);
        assert_eq!(a.phases(), vec![Phase::ShortBreak, Phase::Focus]);
        assert_eq!(b.count(), 2);
    }

    #[test]
    fn arc_forwards() {
        let rec = RecordingNotifier::new();
        let shared: Arc<dyn Notifier + Send + Sync> = Arc::new(rec.clone());
        shared.notify(Phase::LongBreak);
        assert_eq!(rec.phases(), vec![Phase::LongBreak]);
    }
}
