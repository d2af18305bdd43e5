//! Deadline bookkeeping for the scheduler.
//!
//! Pure state: it is told what happened and when, and answers which timers
//! are due. The worker thread supplies the clock.

use crate::config::ScheduleConfig;
use std::time::{Duration, Instant};

/// Which timer fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Fixed-period automatic snapshot.
    Interval,
    /// Quiet period after the last edit elapsed; run the delta check.
    Delta,
    /// Write draft content to settings.
    DraftSave,
    /// Write policy text to settings.
    PolicySave,
}

/// The four single-shot timers.
#[derive(Debug)]
pub struct TimerSet {
    interval: Duration,
    quiet_period: Duration,
    autosave_delay: Duration,

    interval_at: Option<Instant>,
    delta_at: Option<Instant>,
    draft_at: Option<Instant>,
    policy_at: Option<Instant>,
}

impl TimerSet {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            interval: config.interval,
            quiet_period: config.quiet_period,
            autosave_delay: config.autosave_delay,
            interval_at: None,
            delta_at: None,
            draft_at: None,
            policy_at: None,
        }
    }

    /// Arm the interval timer for a document loaded at startup. Nothing
    /// was edited, so no save or delta check is scheduled.
    pub fn resume(&mut self, now: Instant, has_content: bool) {
        if has_content {
            self.interval_at = Some(now + self.interval);
        }
    }

    /// Record a content edit.
    ///
    /// Re-arms the quiet timer and the draft save. The interval timer is
    /// armed when content becomes non-empty and is not reset by later edits;
    /// empty content disarms both snapshot timers.
    pub fn content_changed(&mut self, now: Instant, has_content: bool) {
        self.draft_at = Some(now + self.autosave_delay);

        if has_content {
            self.delta_at = Some(now + self.quiet_period);
            if self.interval_at.is_none() {
                self.interval_at = Some(now + self.interval);
            }
        } else {
            self.delta_at = None;
            self.interval_at = None;
        }
    }

    /// Record a policy edit.
    pub fn policy_changed(&mut self, now: Instant) {
        self.policy_at = Some(now + self.autosave_delay);
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.interval_at, self.delta_at, self.draft_at, self.policy_at]
            .into_iter()
            .flatten()
            .min()
    }

    /// Take every timer due at `now`. The interval timer re-arms one period
    /// from `now`; the others stay disarmed until the next edit.
    pub fn fire_due(&mut self, now: Instant) -> Vec<Trigger> {
        let mut fired = Vec::new();

        if self.draft_at.is_some_and(|at| at <= now) {
            self.draft_at = None;
            fired.push(Trigger::DraftSave);
        }
        if self.policy_at.is_some_and(|at| at <= now) {
            self.policy_at = None;
            fired.push(Trigger::PolicySave);
        }
        if self.delta_at.is_some_and(|at| at <= now) {
            self.delta_at = None;
            fired.push(Trigger::Delta);
        }
        if self.interval_at.is_some_and(|at| at <= now) {
            self.interval_at = Some(now + self.interval);
            fired.push(Trigger::Interval);
        }

        fired
    }

    /// Take the pending autosaves regardless of their deadlines.
    pub fn take_pending_saves(&mut self) -> Vec<Trigger> {
        let mut pending = Vec::new();
        if self.draft_at.take().is_some() {
            pending.push(Trigger::DraftSave);
        }
        if self.policy_at.take().is_some() {
            pending.push(Trigger::PolicySave);
        }
        pending
    }

    pub fn is_armed(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::Interval => self.interval_at.is_some(),
            Trigger::Delta => self.delta_at.is_some(),
            Trigger::DraftSave => self.draft_at.is_some(),
            Trigger::PolicySave => self.policy_at.is_some(),
        }
    }

    /// Disarm everything.
    pub fn cancel_all(&mut self) {
        self.interval_at = None;
        self.delta_at = None;
        self.draft_at = None;
        self.policy_at = None;
    }
}
