//! Typing session lifecycle: start, countdown, emission, stop.
//!
//! A session is one run of emitting a fixed text at a fixed cadence. The
//! controller owns at most one worker at a time; the worker polls a
//! cancellation token at character boundaries, so stopping takes effect
//! within one per-character delay. Each worker reports progress and exactly
//! one terminal event through the controller's event sender.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::emitter::SinkFactory;
use crate::error::{Result, TyperError};

/// Immutable timing snapshot taken at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionTiming {
    /// Pause before the first character.
    pub start_delay: Duration,
    /// Pause after each emitted character.
    pub char_delay: Duration,
}

impl SessionTiming {
    pub fn new(start_delay: Duration, char_delay: Duration) -> Self {
        Self {
            start_delay,
            char_delay,
        }
    }

    /// Timing with no start delay and no per-character pause.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl From<&Config> for SessionTiming {
    fn from(config: &Config) -> Self {
        Self::new(config.start_delay(), config.char_delay())
    }
}

/// Events reported by the typing worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Countdown tick before typing starts; one per remaining second.
    Countdown { seconds_left: u64 },
    /// The first character is about to be emitted.
    Started,
    /// A character was emitted.
    Progress { emitted: usize, total: usize },
    /// The session ended. Sent exactly once per session.
    Finished(SessionEnd),
}

/// Terminal outcome of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Every character of the text was emitted.
    Completed { emitted: usize },
    /// Stopped early; `emitted` characters went out before the stop.
    Cancelled { emitted: usize },
    /// The sink could not be built or an emission failed.
    Failed { emitted: usize, reason: String },
}

/// Cancellation token shared between controller and worker.
///
/// The worker polls it at character boundaries and once per countdown
/// second; cancellation latency is bounded by one per-character delay.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

struct ActiveSession {
    cancel: CancelToken,
    worker: JoinHandle<()>,
}

/// Owns the single active typing session, if any.
///
/// Workers run on the tokio blocking pool; the controller itself is used
/// from the UI thread and never blocks (except [`SessionController::reap`],
/// which joins a worker that has already signalled its terminal event).
pub struct SessionController {
    runtime: Handle,
    sink_factory: Arc<SinkFactory>,
    events: Arc<dyn Fn(SessionEvent) + Send + Sync>,
    active: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(
        runtime: Handle,
        sink_factory: SinkFactory,
        events: impl Fn(SessionEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            runtime,
            sink_factory: Arc::new(sink_factory),
            events: Arc::new(events),
            active: None,
        }
    }

    /// Whether a worker is currently alive.
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|session| !session.worker.is_finished())
    }

    /// Start a new session with a snapshot of `text` and `timing`.
    ///
    /// Returns `Ok(false)` without side effects when a session is already
    /// active, and `Err(EmptyText)` when there is nothing to type.
    pub fn start(&mut self, text: &str, timing: SessionTiming) -> Result<bool> {
        if self.is_active() {
            debug!("start ignored, a session is already active");
            return Ok(false);
        }
        if text.is_empty() {
            return Err(TyperError::EmptyText);
        }

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let factory = Arc::clone(&self.sink_factory);
        let events = Arc::clone(&self.events);
        let text = text.to_string();

        debug!(
            chars = text.chars().count(),
            start_delay_ms = timing.start_delay.as_millis() as u64,
            char_delay_ms = timing.char_delay.as_millis() as u64,
            "starting typing session"
        );

        let worker = self.runtime.spawn_blocking(move || {
            run_worker(&text, timing, &worker_cancel, &factory, events.as_ref());
        });

        self.active = Some(ActiveSession { cancel, worker });
        Ok(true)
    }

    /// Request cancellation of the active session, if any.
    ///
    /// Does not wait for the worker; it observes the token at its next
    /// character boundary and sends `Finished(Cancelled)` on its own.
    pub fn stop(&mut self) -> bool {
        match &self.active {
            Some(session) if !session.worker.is_finished() => {
                debug!("stop requested");
                session.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Release the worker handle after its terminal event was observed.
    ///
    /// Must only be called once `Finished` has been received; the join is
    /// then immediate and guarantees the controller reads as idle before
    /// the next start request.
    pub fn reap(&mut self) {
        if let Some(session) = self.active.take() {
            if !session.worker.is_finished() {
                let _ = self.runtime.block_on(session.worker);
            }
        }
    }
}

/// The worker body: countdown, then one character per loop iteration.
///
/// Sends exactly one `Finished` event on every path out.
fn run_worker(
    text: &str,
    timing: SessionTiming,
    cancel: &CancelToken,
    factory: &SinkFactory,
    events: &(dyn Fn(SessionEvent) + Send + Sync),
) {
    let mut remaining = timing.start_delay.as_secs();
    while remaining > 0 {
        if cancel.is_cancelled() {
            events(SessionEvent::Finished(SessionEnd::Cancelled { emitted: 0 }));
            return;
        }
        events(SessionEvent::Countdown {
            seconds_left: remaining,
        });
        thread::sleep(Duration::from_secs(1));
        remaining -= 1;
    }

    if cancel.is_cancelled() {
        events(SessionEvent::Finished(SessionEnd::Cancelled { emitted: 0 }));
        return;
    }

    let mut sink = match factory() {
        Ok(sink) => sink,
        Err(e) => {
            warn!(error = %e, "could not build keystroke sink");
            events(SessionEvent::Finished(SessionEnd::Failed {
                emitted: 0,
                reason: e.to_string(),
            }));
            return;
        }
    };

    events(SessionEvent::Started);

    let total = text.chars().count();
    let mut emitted = 0usize;

    for ch in text.chars() {
        if cancel.is_cancelled() {
            debug!(emitted, total, "session cancelled at character boundary");
            events(SessionEvent::Finished(SessionEnd::Cancelled { emitted }));
            return;
        }

        if let Err(e) = sink.emit(ch) {
            warn!(error = %e, emitted, "keystroke emission failed");
            events(SessionEvent::Finished(SessionEnd::Failed {
                emitted,
                reason: e.to_string(),
            }));
            return;
        }

        emitted += 1;
        events(SessionEvent::Progress { emitted, total });

        if !timing.char_delay.is_zero() && emitted < total {
            thread::sleep(timing.char_delay);
        }
    }

    debug!(emitted, "session completed");
    events(SessionEvent::Finished(SessionEnd::Completed { emitted }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{recording_factory, KeystrokeSink, RecordingSink};
    use std::sync::Mutex;

    fn collector() -> (
        Arc<Mutex<Vec<SessionEvent>>>,
        impl Fn(SessionEvent) + Send + Sync,
    ) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        (events, move |ev| sink.lock().unwrap().push(ev))
    }

    fn finished_events(events: &[SessionEvent]) -> Vec<&SessionEvent> {
        events
            .iter()
            .filter(|ev| matches!(ev, SessionEvent::Finished(_)))
            .collect()
    }

    /// Sink that cancels the shared token after a fixed number of emits.
    struct CancellingSink {
        inner: RecordingSink,
        cancel: CancelToken,
        cancel_after: usize,
        emitted: usize,
    }

    impl KeystrokeSink for CancellingSink {
        fn emit(&mut self, ch: char) -> crate::error::Result<()> {
            self.inner.emit(ch)?;
            self.emitted += 1;
            if self.emitted == self.cancel_after {
                self.cancel.cancel();
            }
            Ok(())
        }
    }

    /// Sink that fails on the nth emit.
    struct FailingSink {
        inner: RecordingSink,
        fail_on: usize,
        emitted: usize,
    }

    impl KeystrokeSink for FailingSink {
        fn emit(&mut self, ch: char) -> crate::error::Result<()> {
            if self.emitted + 1 == self.fail_on {
                return Err(TyperError::emitter("synthetic failure"));
            }
            self.inner.emit(ch)?;
            self.emitted += 1;
            Ok(())
        }
    }

    #[test]
    fn worker_emits_every_character_in_order() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let factory = recording_factory(Arc::clone(&buffer));
        let (events, send) = collector();

        run_worker(
            "hi",
            SessionTiming::immediate(),
            &CancelToken::new(),
            &factory,
            &send,
        );

        let typed: String = buffer.lock().unwrap().iter().collect();
        assert_eq!(typed, "hi");

        let events = events.lock().unwrap();
        assert_eq!(events[0], SessionEvent::Started);
        assert_eq!(
            *events.last().unwrap(),
            SessionEvent::Finished(SessionEnd::Completed { emitted: 2 })
        );
        assert_eq!(finished_events(&events).len(), 1);
    }

    #[test]
    fn precancelled_worker_emits_nothing() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let factory = recording_factory(Arc::clone(&buffer));
        let (events, send) = collector();

        let cancel = CancelToken::new();
        cancel.cancel();
        run_worker("hello", SessionTiming::immediate(), &cancel, &factory, &send);

        assert!(buffer.lock().unwrap().is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::Finished(SessionEnd::Cancelled { emitted: 0 })]
        );
    }

    #[test]
    fn precancelled_countdown_never_reaches_typing() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let factory = recording_factory(Arc::clone(&buffer));
        let (events, send) = collector();

        let cancel = CancelToken::new();
        cancel.cancel();
        let timing = SessionTiming::new(Duration::from_secs(5), Duration::ZERO);
        run_worker("hello", timing, &cancel, &factory, &send);

        // The token is checked before the first countdown tick, so this
        // returns immediately rather than sleeping out the start delay.
        assert!(buffer.lock().unwrap().is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::Finished(SessionEnd::Cancelled { emitted: 0 })]
        );
    }

    #[test]
    fn countdown_announces_each_remaining_second() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let factory = recording_factory(Arc::clone(&buffer));
        let (events, send) = collector();

        let timing = SessionTiming::new(Duration::from_secs(1), Duration::ZERO);
        run_worker("x", timing, &CancelToken::new(), &factory, &send);

        let events = events.lock().unwrap();
        assert_eq!(events[0], SessionEvent::Countdown { seconds_left: 1 });
        assert_eq!(events[1], SessionEvent::Started);
    }

    #[test]
    fn cancel_mid_session_stops_at_character_boundary() {
        let cancel = CancelToken::new();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink_cancel = cancel.clone();
        let sink_buffer = Arc::clone(&buffer);
        let factory: SinkFactory = Box::new(move || {
            Ok(Box::new(CancellingSink {
                inner: RecordingSink::with_buffer(Arc::clone(&sink_buffer)),
                cancel: sink_cancel.clone(),
                cancel_after: 2,
                emitted: 0,
            }))
        });
        let (events, send) = collector();

        run_worker("abcd", SessionTiming::immediate(), &cancel, &factory, &send);

        let typed: String = buffer.lock().unwrap().iter().collect();
        assert_eq!(typed, "ab");
        assert_eq!(
            *events.lock().unwrap().last().unwrap(),
            SessionEvent::Finished(SessionEnd::Cancelled { emitted: 2 })
        );
    }

    #[test]
    fn emission_failure_ends_the_session() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink_buffer = Arc::clone(&buffer);
        let factory: SinkFactory = Box::new(move || {
            Ok(Box::new(FailingSink {
                inner: RecordingSink::with_buffer(Arc::clone(&sink_buffer)),
                fail_on: 3,
                emitted: 0,
            }))
        });
        let (events, send) = collector();

        run_worker("abcd", SessionTiming::immediate(), &CancelToken::new(), &factory, &send);

        let typed: String = buffer.lock().unwrap().iter().collect();
        assert_eq!(typed, "ab");

        let events = events.lock().unwrap();
        match events.last().unwrap() {
            SessionEvent::Finished(SessionEnd::Failed { emitted, reason }) => {
                assert_eq!(*emitted, 2);
                assert!(reason.contains("synthetic failure"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn sink_factory_failure_reports_failed_without_started() {
        let factory: SinkFactory =
            Box::new(|| Err(TyperError::emitter("no display server")));
        let (events, send) = collector();

        run_worker("abc", SessionTiming::immediate(), &CancelToken::new(), &factory, &send);

        let events = events.lock().unwrap();
        assert!(!events.contains(&SessionEvent::Started));
        match events.last().unwrap() {
            SessionEvent::Finished(SessionEnd::Failed { emitted: 0, reason }) => {
                assert!(reason.contains("no display server"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn progress_counts_up_to_total() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let factory = recording_factory(Arc::clone(&buffer));
        let (events, send) = collector();

        run_worker("abc", SessionTiming::immediate(), &CancelToken::new(), &factory, &send);

        let events = events.lock().unwrap();
        let progress: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                SessionEvent::Progress { emitted, total } => Some((*emitted, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
