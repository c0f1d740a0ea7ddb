//! Render coalescing and fill-request supersession.
//!
//! Parameter edits arrive faster than full pipeline runs complete.
//! [`RenderScheduler`] keeps at most one render in flight and one
//! pending parameter set: intermediate states are dropped
//! (latest-wins), but the last submitted state is always rendered.
//!
//! [`FillTracker`] handles the generative-fill side: one outstanding
//! request at a time, and a newer request supersedes the old one, so
//! a stale completion can be recognized and discarded.

/// Latest-wins scheduler for pipeline renders.
#[derive(Debug)]
pub struct RenderScheduler<T> {
    pending: Option<T>,
    in_flight: Option<u64>,
    generation: u64,
}

impl<T> Default for RenderScheduler<T> {
    fn default() -> Self {
        Self {
            pending: None,
            in_flight: None,
            generation: 0,
        }
    }
}

impl<T> RenderScheduler<T> {
    /// An idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit the latest parameters.
    ///
    /// Returns a ticket to render immediately when idle; otherwise
    /// the parameters are parked, replacing any previously parked
    /// ones, and will be handed out by [`complete`](Self::complete).
    pub fn submit(&mut self, params: T) -> Option<RenderTicket<T>> {
        if self.in_flight.is_some() {
            self.pending = Some(params);
            return None;
        }
        Some(self.begin(params))
    }

    /// Report that the render for `generation` finished.
    ///
    /// Returns the next ticket if parameters arrived while rendering.
    /// Stale generations (from a render that was already superseded)
    /// only yield work when they are the one actually in flight.
    pub fn complete(&mut self, generation: u64) -> Option<RenderTicket<T>> {
        if self.in_flight != Some(generation) {
            return None;
        }
        self.in_flight = None;
        let next = self.pending.take()?;
        Some(self.begin(next))
    }

    /// Whether `generation` is the render currently in flight.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.in_flight == Some(generation)
    }

    /// Whether a render is currently in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn begin(&mut self, params: T) -> RenderTicket<T> {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        RenderTicket {
            generation: self.generation,
            params,
        }
    }
}

/// A render the caller should perform now.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderTicket<T> {
    /// Pass back to [`RenderScheduler::complete`] when done.
    pub generation: u64,
    /// The parameters to render.
    pub params: T,
}

/// Tracks the single outstanding generative-fill request.
#[derive(Debug, Default)]
pub struct FillTracker {
    generation: u64,
    outstanding: Option<u64>,
}

impl FillTracker {
    /// No request outstanding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fill request, superseding any outstanding one.
    /// Returns the generation to present on completion.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.outstanding = Some(self.generation);
        self.generation
    }

    /// Report a completed request. Returns `true` when the completion
    /// is current; a superseded completion returns `false` and must
    /// be discarded by the caller.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.outstanding == Some(generation) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn idle_scheduler_renders_immediately() {
        let mut scheduler = RenderScheduler::new();
        let ticket = scheduler.submit("a").unwrap();
        assert_eq!(ticket.params, "a");
        assert!(scheduler.is_busy());
    }

    #[test]
    fn intermediate_states_are_dropped_but_last_renders() {
        let mut scheduler = RenderScheduler::new();
        let first = scheduler.submit("a").unwrap();
        assert!(scheduler.submit("b").is_none());
        assert!(scheduler.submit("c").is_none());

        let next = scheduler.complete(first.generation).unwrap();
        assert_eq!(next.params, "c", "only the latest pending renders");
        assert!(scheduler.complete(next.generation).is_none());
        assert!(!scheduler.is_busy());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut scheduler = RenderScheduler::new();
        let first = scheduler.submit("a").unwrap();
        scheduler.submit("b");
        let second = scheduler.complete(first.generation).unwrap();
        // The first generation is no longer in flight.
        assert!(scheduler.complete(first.generation).is_none());
        assert!(scheduler.is_current(second.generation));
    }

    #[test]
    fn fill_supersession_discards_old_completion() {
        let mut tracker = FillTracker::new();
        let old = tracker.begin();
        let new = tracker.begin();
        assert!(!tracker.finish(old), "superseded request is stale");
        assert!(tracker.finish(new));
        assert!(!tracker.is_outstanding());
    }
}
