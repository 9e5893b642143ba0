//! The task document: one text buffer, its task list, and the operations a
//! presentation layer calls.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use tracing::debug;

use crate::model::config::SyncConfig;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::ops::task_ops::{self, TaskError};
use crate::parse::parse_tasks;
use crate::sync::machine::{Step, SyncEvent, SyncMachine};
use crate::sync::message::HostMessage;

/// Where outbound updates for the host go
pub trait Outbox {
    fn post(&mut self, msg: HostMessage);
}

impl Outbox for Vec<HostMessage> {
    fn post(&mut self, msg: HostMessage) {
        self.push(msg);
    }
}

impl Outbox for mpsc::Sender<HostMessage> {
    fn post(&mut self, msg: HostMessage) {
        if self.send(msg).is_err() {
            debug!("host receiver closed, outbound update discarded");
        }
    }
}

/// Tasks parsed from one revision of the text
#[derive(Debug)]
struct ParsedTasks {
    revision: u64,
    tasks: Arc<[Task]>,
}

/// A text document with checkbox tasks, kept in sync with a host.
#[derive(Debug)]
pub struct TaskDocument<O: Outbox> {
    sync: SyncMachine,
    outbox: O,
    cache: Option<ParsedTasks>,
}

impl<O: Outbox> TaskDocument<O> {
    pub fn new(initial: &str, config: &SyncConfig, outbox: O) -> Self {
        TaskDocument {
            sync: SyncMachine::new(initial, config.debounce()),
            outbox,
            cache: None,
        }
    }

    pub fn text(&self) -> &str {
        self.sync.text()
    }

    /// Tasks of the current text. Reparsed only when the text has changed
    /// since the last call.
    pub fn tasks(&mut self) -> Arc<[Task]> {
        let revision = self.sync.revision();
        if let Some(parsed) = &self.cache
            && parsed.revision == revision
        {
            return Arc::clone(&parsed.tasks);
        }
        let tasks: Arc<[Task]> = parse_tasks(self.sync.text()).into();
        self.cache = Some(ParsedTasks {
            revision,
            tasks: Arc::clone(&tasks),
        });
        tasks
    }

    pub fn is_typing(&self) -> bool {
        self.sync.is_typing()
    }

    pub fn sync(&self) -> &SyncMachine {
        &self.sync
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn into_outbox(self) -> O {
        self.outbox
    }

    // -----------------------------------------------------------------------
    // Structured edits
    // -----------------------------------------------------------------------

    /// Append a todo after the last task. Returns the new task's id.
    pub fn add_task(&mut self, task_text: &str) -> TaskId {
        let added = task_ops::add_task(self.sync.text(), task_text);
        self.commit(added.text);
        added.id
    }

    /// Returns whether the document changed.
    pub fn delete_task(&mut self, task_id: &TaskId) -> bool {
        let result = task_ops::delete_task(self.sync.text(), task_id);
        self.apply("delete", result)
    }

    pub fn rename_task(&mut self, task_id: &TaskId, new_text: &str) -> bool {
        let result = task_ops::rename_task(self.sync.text(), task_id, new_text);
        self.apply("rename", result)
    }

    pub fn set_task_status(&mut self, task_id: &TaskId, status: TaskStatus) -> bool {
        let result = task_ops::set_status(self.sync.text(), task_id, status);
        self.apply("set status", result)
    }

    pub fn cycle_task_status(&mut self, task_id: &TaskId) -> bool {
        let result = task_ops::cycle_status(self.sync.text(), task_id);
        self.apply("cycle status", result)
    }

    // -----------------------------------------------------------------------
    // Raw text and host traffic
    // -----------------------------------------------------------------------

    /// The user's editor buffer changed. Sent to the host once typing pauses.
    pub fn on_text_changed_by_user(&mut self, raw: &str, now: Instant) {
        let step = self.sync.handle(SyncEvent::LocalEdit(raw.to_string()), now);
        self.dispatch(step);
    }

    /// The host's text changed. Returns whether it was applied.
    pub fn on_external_update(&mut self, text: &str) -> bool {
        let step = self
            .sync
            .handle(SyncEvent::Inbound(HostMessage::update(text)), Instant::now());
        let applied = step == Step::Applied;
        self.dispatch(step);
        applied
    }

    /// Flush pending keystrokes if the debounce has run out. Returns whether
    /// an update was sent.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.sync.poll(now) {
            Some(step) => self.dispatch(step),
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sync.next_deadline()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn apply(&mut self, op: &str, result: Result<String, TaskError>) -> bool {
        match result {
            Ok(text) => self.commit(text),
            Err(e) => {
                debug!(op, error = %e, "edit skipped");
                false
            }
        }
    }

    fn commit(&mut self, text: String) -> bool {
        if text == self.sync.text() {
            debug!("edit left the text unchanged");
            return false;
        }
        let step = self.sync.handle(SyncEvent::ProgrammaticEdit(text), Instant::now());
        self.dispatch(step);
        true
    }

    fn dispatch(&mut self, step: Step) -> bool {
        match step.outbound() {
            Some(msg) => {
                self.outbox.post(msg);
                true
            }
            None => false,
        }
    }
}
