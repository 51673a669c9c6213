//! Countdown status display: a single live notice, reconciled against an
//! optional host display surface.
//!
//! Timing never depends on the display. A missing or hidden sink degrades
//! to a silent countdown; the sequencer and planner behave identically.

use crate::fixed::{TICK_RATE, Ticks};
use serde::{Deserialize, Serialize};

/// How long the "sequence stopped" notice stays live (5 s).
pub const STOPPED_NOTICE_TICKS: Ticks = 5 * TICK_RATE;

pub(crate) const INITIATED_TEXT: &str = "Self destruct sequence initiated.";
pub(crate) const STOPPED_TEXT: &str = "Self destruct sequence stopped.";

pub(crate) fn countdown_text(remaining_seconds: u64) -> String {
    format!("Self destruct sequence initiated: {remaining_seconds}")
}

// ---------------------------------------------------------------------------
// StatusMessage
// ---------------------------------------------------------------------------

/// A short-lived status notice. At most one is live per engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    /// Tick at which the message was posted or last replaced.
    pub posted_at: Ticks,
    /// How long the message stays live, in ticks.
    pub duration: Ticks,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, posted_at: Ticks, duration: Ticks) -> Self {
        Self {
            text: text.into(),
            posted_at,
            duration,
        }
    }

    /// Whether the message's display duration has elapsed.
    pub fn is_expired(&self, now: Ticks) -> bool {
        now >= self.posted_at.saturating_add(self.duration)
    }
}

// ---------------------------------------------------------------------------
// StatusSink
// ---------------------------------------------------------------------------

/// Host-facing display surface for countdown notices. Implemented by host
/// glue; the engine holds at most one and works the same without it.
pub trait StatusSink: std::fmt::Debug {
    /// Whether the surface can currently show messages (e.g. UI not hidden).
    fn is_available(&self) -> bool;

    /// Show a new message or refresh the current one.
    fn show(&mut self, message: &StatusMessage);

    /// Remove the current message before its duration elapses.
    fn retire(&mut self);
}

// ---------------------------------------------------------------------------
// CountdownDisplay
// ---------------------------------------------------------------------------

/// The single live message slot.
///
/// `refresh_countdown` reproduces the full message lifecycle: refresh while
/// the surface is visible, early retire when it is hidden mid-countdown, and
/// re-post when it becomes visible again.
#[derive(Debug, Default)]
pub struct CountdownDisplay {
    slot: Option<StatusMessage>,
}

impl CountdownDisplay {
    /// The currently live message, if any.
    pub fn live(&self) -> Option<&StatusMessage> {
        self.slot.as_ref()
    }

    /// Post the initial armed notice, live for the full countdown.
    pub fn post_initiated(
        &mut self,
        now: Ticks,
        delay_ticks: Ticks,
        show_countdown: bool,
        sink: Option<&mut (dyn StatusSink + '_)>,
    ) {
        let Some(sink) = sink else { return };
        if !show_countdown || !sink.is_available() {
            return;
        }
        let msg = StatusMessage::new(INITIATED_TEXT, now, delay_ticks);
        sink.show(&msg);
        self.slot = Some(msg);
    }

    /// Reconcile the live slot with a countdown status poll.
    pub fn refresh_countdown(
        &mut self,
        now: Ticks,
        remaining_seconds: u64,
        remaining_ticks: Ticks,
        show_countdown: bool,
        sink: Option<&mut (dyn StatusSink + '_)>,
    ) {
        let visible = show_countdown && sink.as_ref().is_some_and(|s| s.is_available());
        if visible {
            if let Some(msg) = self.slot.as_mut() {
                msg.text = countdown_text(remaining_seconds);
                if let Some(sink) = sink {
                    sink.show(msg);
                }
            } else {
                // Surface (re)appeared mid-countdown: post with the time left.
                let msg = StatusMessage::new(countdown_text(remaining_seconds), now, remaining_ticks);
                if let Some(sink) = sink {
                    sink.show(&msg);
                }
                self.slot = Some(msg);
            }
        } else if self.slot.take().is_some() {
            // Surface hidden or countdown display switched off: drop early.
            if let Some(sink) = sink {
                sink.retire();
            }
        }
    }

    /// Replace a live countdown message with the stopped notice. If nothing
    /// is live there is nothing to replace.
    pub fn post_stopped(&mut self, now: Ticks, sink: Option<&mut (dyn StatusSink + '_)>) {
        if self.slot.is_none() {
            return;
        }
        let msg = StatusMessage::new(STOPPED_TEXT, now, STOPPED_NOTICE_TICKS);
        if let Some(sink) = sink {
            if sink.is_available() {
                sink.show(&msg);
            }
        }
        self.slot = Some(msg);
    }

    /// Drop the live message once its display duration has elapsed.
    pub fn expire(&mut self, now: Ticks, sink: Option<&mut (dyn StatusSink + '_)>) {
        if self.slot.as_ref().is_some_and(|m| m.is_expired(now)) {
            self.slot = None;
            if let Some(sink) = sink {
                sink.retire();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeSink {
        hidden: bool,
        shown: Vec<String>,
        retired: u32,
    }

    impl StatusSink for FakeSink {
        fn is_available(&self) -> bool {
            !self.hidden
        }
        fn show(&mut self, message: &StatusMessage) {
            self.shown.push(message.text.clone());
        }
        fn retire(&mut self) {
            self.retired += 1;
        }
    }

    #[test]
    fn post_and_refresh_updates_text_in_place() {
        let mut display = CountdownDisplay::default();
        let mut sink = FakeSink::default();

        display.post_initiated(0, 100, true, Some(&mut sink));
        assert_eq!(display.live().unwrap().text, INITIATED_TEXT);

        display.refresh_countdown(0, 10, 100, true, Some(&mut sink));
        assert_eq!(display.live().unwrap().text, countdown_text(10));
        // Refresh replaces the text, not the message: posted_at is unchanged.
        assert_eq!(display.live().unwrap().posted_at, 0);
        assert_eq!(sink.shown.len(), 2);
    }

    #[test]
    fn no_post_when_countdown_display_is_off() {
        let mut display = CountdownDisplay::default();
        let mut sink = FakeSink::default();

        display.post_initiated(0, 100, false, Some(&mut sink));
        assert!(display.live().is_none());
        assert!(sink.shown.is_empty());
    }

    #[test]
    fn no_post_without_sink() {
        let mut display = CountdownDisplay::default();
        display.post_initiated(0, 100, true, None);
        assert!(display.live().is_none());
    }

    #[test]
    fn hidden_surface_retires_early_then_reposts() {
        let mut display = CountdownDisplay::default();
        let mut sink = FakeSink::default();
        display.post_initiated(0, 100, true, Some(&mut sink));

        sink.hidden = true;
        display.refresh_countdown(20, 8, 80, true, Some(&mut sink));
        assert!(display.live().is_none());
        assert_eq!(sink.retired, 1);

        sink.hidden = false;
        display.refresh_countdown(40, 6, 60, true, Some(&mut sink));
        let msg = display.live().unwrap();
        assert_eq!(msg.text, countdown_text(6));
        assert_eq!(msg.posted_at, 40);
        assert_eq!(msg.duration, 60);
    }

    #[test]
    fn stopped_notice_replaces_live_message_only() {
        let mut display = CountdownDisplay::default();
        let mut sink = FakeSink::default();

        // Nothing live: nothing to replace.
        display.post_stopped(10, Some(&mut sink));
        assert!(display.live().is_none());

        display.post_initiated(0, 100, true, Some(&mut sink));
        display.post_stopped(10, Some(&mut sink));
        let msg = display.live().unwrap();
        assert_eq!(msg.text, STOPPED_TEXT);
        assert_eq!(msg.duration, STOPPED_NOTICE_TICKS);
        assert_eq!(msg.posted_at, 10);
    }

    #[test]
    fn messages_expire_by_duration() {
        let mut display = CountdownDisplay::default();
        let mut sink = FakeSink::default();
        display.post_initiated(0, 10, true, Some(&mut sink));

        display.expire(9, Some(&mut sink));
        assert!(display.live().is_some());
        display.expire(10, Some(&mut sink));
        assert!(display.live().is_none());
        assert_eq!(sink.retired, 1);
    }
}
