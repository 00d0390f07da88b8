/// Trailing-edge debouncer driven by adapter-supplied timestamps.
///
/// Each [`push`](Self::push) replaces the pending value and restarts the idle timer; timers are
/// never stacked. The adapter calls [`poll`](Self::poll) from its frame/timer tick.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(T, u64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    /// Schedules `value`, dropping any value still waiting.
    pub fn push(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms.saturating_add(self.delay_ms)));
    }

    /// Returns the pending value once the idle gap has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now_ms >= *due => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Returns the pending value immediately (e.g. on Enter).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
