//! Background thread driving the snapshot and autosave timers.

use super::policy::DeltaPolicy;
use super::timers::{TimerSet, Trigger};
use crate::config::ScheduleConfig;
use crate::history::SnapshotHistory;
use crate::settings::{SettingKey, SettingsStore};
use crate::types::SnapshotKind;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

/// Max buffered events before new ones are dropped.
const EVENT_BUFFER: usize = 256;

/// What the worker did. Delivered best-effort to [`Scheduler::events`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// An automatic snapshot was stored.
    SnapshotTaken { trigger: &'static str },
    /// A trigger ran but the store created nothing (below threshold,
    /// unchanged, blank, or no baseline yet).
    SnapshotSkipped { trigger: &'static str },
    /// Draft content was written to settings.
    DraftSaved,
    /// Policy text was written to settings.
    PolicySaved,
}

enum Command {
    Content(String),
    Policy(String),
    Flush(Sender<()>),
    Shutdown,
}

/// Handle to the scheduler thread.
///
/// Dropping the handle shuts the thread down; no timer fires afterwards.
pub struct Scheduler {
    commands: Sender<Command>,
    events: Receiver<SchedulerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the worker. `initial_content` is the document as loaded from
    /// settings; if it is non-empty the interval timer starts armed.
    pub fn start(
        history: Arc<SnapshotHistory>,
        settings: Arc<SettingsStore>,
        config: ScheduleConfig,
        initial_content: String,
        initial_policy: String,
    ) -> std::io::Result<Self> {
        let (commands, command_rx) = unbounded();
        let (event_tx, events) = bounded(EVENT_BUFFER);

        let worker = Worker {
            history,
            settings,
            policy: DeltaPolicy::from_config(&config),
            timers: TimerSet::new(&config),
            content: initial_content,
            policy_text: initial_policy,
            events: event_tx,
        };

        let thread = thread::Builder::new()
            .name("redpen-scheduler".into())
            .spawn(move || worker.run(command_rx))?;

        Ok(Self {
            commands,
            events,
            thread: Some(thread),
        })
    }

    /// Report a content edit.
    pub fn content_changed(&self, content: &str) {
        self.send(Command::Content(content.to_string()));
    }

    /// Report a policy edit.
    pub fn policy_changed(&self, policy: &str) {
        self.send(Command::Policy(policy.to_string()));
    }

    /// Write pending draft/policy autosaves now and wait for them.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.commands.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Receiver for worker events.
    pub fn events(&self) -> &Receiver<SchedulerEvent> {
        &self.events
    }

    /// Stop the worker. Pending autosaves are written first; snapshot timers
    /// are cancelled. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(Command::Shutdown);
            if thread.join().is_err() {
                warn!("scheduler thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("scheduler stopped, dropping command");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    history: Arc<SnapshotHistory>,
    settings: Arc<SettingsStore>,
    policy: DeltaPolicy,
    timers: TimerSet,
    content: String,
    policy_text: String,
    events: Sender<SchedulerEvent>,
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        self.timers.resume(Instant::now(), !self.content.is_empty());

        loop {
            let command = match self.timers.next_deadline() {
                Some(deadline) => match commands.recv_deadline(deadline) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                },
            };

            match command {
                Some(Command::Content(content)) => {
                    self.content = content;
                    self.timers
                        .content_changed(Instant::now(), !self.content.is_empty());
                }
                Some(Command::Policy(policy)) => {
                    self.policy_text = policy;
                    self.timers.policy_changed(Instant::now());
                }
                Some(Command::Flush(ack)) => {
                    self.flush_saves();
                    let _ = ack.send(());
                }
                Some(Command::Shutdown) => break,
                None => {}
            }

            for trigger in self.timers.fire_due(Instant::now()) {
                self.run_trigger(trigger);
            }
        }

        self.flush_saves();
        self.timers.cancel_all();
        debug!("scheduler stopped");
    }

    fn flush_saves(&mut self) {
        for trigger in self.timers.take_pending_saves() {
            self.run_trigger(trigger);
        }
    }

    fn run_trigger(&self, trigger: Trigger) {
        match trigger {
            Trigger::Interval => {
                let saved = self.history.capture(&self.content, SnapshotKind::Auto);
                self.report_snapshot("interval", saved);
            }
            Trigger::Delta => {
                let policy = self.policy;
                let content = &self.content;
                let saved = self
                    .history
                    .capture_if(content, SnapshotKind::Auto, |baseline| match baseline {
                        Some(baseline) => policy.exceeds_between(baseline, content),
                        None => false,
                    });
                self.report_snapshot("delta", saved);
            }
            Trigger::DraftSave => {
                if self.settings.set(SettingKey::Content.as_str(), &self.content) {
                    self.emit(SchedulerEvent::DraftSaved);
                }
            }
            Trigger::PolicySave => {
                if self.settings.set(SettingKey::Policy.as_str(), &self.policy_text) {
                    self.emit(SchedulerEvent::PolicySaved);
                }
            }
        }
    }

    fn report_snapshot(&self, trigger: &'static str, saved: bool) {
        if saved {
            debug!(trigger, "automatic snapshot taken");
            self.emit(SchedulerEvent::SnapshotTaken { trigger });
        } else {
            self.emit(SchedulerEvent::SnapshotSkipped { trigger });
        }
    }

    fn emit(&self, event: SchedulerEvent) {
        // Nobody listening, or listener too slow: drop it.
        let _ = self.events.try_send(event);
    }
}
