//! A task document running on its own thread.
//!
//! All operations are commands on one mailbox, so keystrokes, structured
//! edits, host updates and the debounce timer are handled strictly one at a
//! time. The debounce is the mailbox's receive timeout.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info};

use crate::document::TaskDocument;
use crate::model::config::SyncConfig;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::sync::message::HostMessage;

/// Error returned when the session thread is no longer running
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session has shut down")]
pub struct SessionClosed;

/// Point-in-time view of the session's document
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub text: String,
    pub tasks: Arc<[Task]>,
    pub typing: bool,
}

enum Command {
    UserInput(String),
    External(String),
    Add {
        text: String,
        reply: Sender<TaskId>,
    },
    Delete {
        id: TaskId,
        reply: Sender<bool>,
    },
    Rename {
        id: TaskId,
        text: String,
        reply: Sender<bool>,
    },
    SetStatus {
        id: TaskId,
        status: TaskStatus,
        reply: Sender<bool>,
    },
    Cycle {
        id: TaskId,
        reply: Sender<bool>,
    },
    Snapshot {
        reply: Sender<Snapshot>,
    },
    Shutdown,
}

/// Handle to a running session. Dropping it stops the session, flushing
/// any keystrokes still waiting on the debounce.
pub struct SessionHandle {
    tx: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

/// Start a session on `initial` text. Outbound updates for the host arrive
/// on the returned receiver.
pub fn spawn(
    initial: &str,
    config: &SyncConfig,
) -> std::io::Result<(SessionHandle, Receiver<HostMessage>)> {
    let (tx, rx) = mpsc::channel();
    let (out_tx, out_rx) = mpsc::channel();
    let doc = TaskDocument::new(initial, config, out_tx);

    let thread = thread::Builder::new()
        .name("taskit-session".into())
        .spawn(move || run(doc, rx))?;

    Ok((
        SessionHandle {
            tx,
            thread: Some(thread),
        },
        out_rx,
    ))
}

impl SessionHandle {
    /// The user's editor buffer now reads `text`.
    pub fn user_input(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::UserInput(text.into()))
    }

    /// The host's document now reads `text`.
    pub fn external_update(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::External(text.into()))
    }

    pub fn add_task(&self, text: impl Into<String>) -> Result<TaskId, SessionClosed> {
        let text = text.into();
        self.request(|reply| Command::Add { text, reply })
    }

    pub fn delete_task(&self, id: &TaskId) -> Result<bool, SessionClosed> {
        let id = id.clone();
        self.request(|reply| Command::Delete { id, reply })
    }

    pub fn rename_task(&self, id: &TaskId, text: impl Into<String>) -> Result<bool, SessionClosed> {
        let id = id.clone();
        let text = text.into();
        self.request(|reply| Command::Rename { id, text, reply })
    }

    pub fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<bool, SessionClosed> {
        let id = id.clone();
        self.request(|reply| Command::SetStatus { id, status, reply })
    }

    pub fn cycle_task_status(&self, id: &TaskId) -> Result<bool, SessionClosed> {
        let id = id.clone();
        self.request(|reply| Command::Cycle { id, reply })
    }

    pub fn snapshot(&self) -> Result<Snapshot, SessionClosed> {
        self.request(|reply| Command::Snapshot { reply })
    }

    /// Stop the session and wait for its thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            debug!("session thread panicked");
        }
    }

    fn send(&self, cmd: Command) -> Result<(), SessionClosed> {
        self.tx.send(cmd).map_err(|_| SessionClosed)
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T, SessionClosed> {
        let (reply, rx) = mpsc::channel();
        self.send(make(reply))?;
        rx.recv().map_err(|_| SessionClosed)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut doc: TaskDocument<Sender<HostMessage>>, rx: Receiver<Command>) {
    info!("session started");
    loop {
        let cmd = match doc.next_deadline() {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(cmd) => cmd,
                    Err(RecvTimeoutError::Timeout) => {
                        doc.poll(Instant::now());
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => break,
            },
        };

        if !handle(&mut doc, cmd) {
            break;
        }
    }

    // Keystrokes still waiting on the debounce are sent rather than lost
    if let Some(deadline) = doc.next_deadline() {
        doc.poll(deadline);
    }
    info!("session stopped");
}

/// Apply one command. Returns false on shutdown.
fn handle(doc: &mut TaskDocument<Sender<HostMessage>>, cmd: Command) -> bool {
    // A dropped reply receiver just means the caller stopped waiting
    match cmd {
        Command::UserInput(text) => doc.on_text_changed_by_user(&text, Instant::now()),
        Command::External(text) => {
            doc.on_external_update(&text);
        }
        Command::Add { text, reply } => {
            let _ = reply.send(doc.add_task(&text));
        }
        Command::Delete { id, reply } => {
            let _ = reply.send(doc.delete_task(&id));
        }
        Command::Rename { id, text, reply } => {
            let _ = reply.send(doc.rename_task(&id, &text));
        }
        Command::SetStatus { id, status, reply } => {
            let _ = reply.send(doc.set_task_status(&id, status));
        }
        Command::Cycle { id, reply } => {
            let _ = reply.send(doc.cycle_task_status(&id));
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(Snapshot {
                text: doc.text().to_string(),
                tasks: doc.tasks(),
                typing: doc.is_typing(),
            });
        }
        Command::Shutdown => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn config(debounce_ms: u64) -> SyncConfig {
        SyncConfig { debounce_ms }
    }

    #[test]
    fn keystrokes_reach_host_once_after_pause() {
        let (session, outbound) = spawn("", &config(300)).unwrap();
        session.user_input("[ ] a").unwrap();
        session.user_input("[ ] ab").unwrap();

        let snap = session.snapshot().unwrap();
        assert_eq!(snap.text, "[ ] ab");
        assert_eq!(snap.tasks.len(), 1);

        let msg = outbound.recv_timeout(WAIT).unwrap();
        assert_eq!(msg, HostMessage::update("[ ] ab"));
        assert!(outbound.recv_timeout(Duration::from_millis(300)).is_err());
        assert!(!session.snapshot().unwrap().typing);
    }

    #[test]
    fn structured_edits_are_sent_without_delay() {
        let (session, outbound) = spawn("[ ] a\n", &config(60_000)).unwrap();
        let id = session.add_task("b").unwrap();
        assert_eq!(
            outbound.recv_timeout(WAIT).unwrap(),
            HostMessage::update("[ ] a\n[ ] b\n")
        );

        assert!(session.cycle_task_status(&id).unwrap());
        assert_eq!(outbound.recv_timeout(WAIT).unwrap().text(), "[ ] a\n[*] b\n");

        // Ids do not include the status, so `id` still names the task
        assert!(!session.set_task_status(&id, TaskStatus::Doing).unwrap());
        assert!(session.set_task_status(&id, TaskStatus::Done).unwrap());
        assert!(session.rename_task(&id, "bee").unwrap());
        let renamed = session.snapshot().unwrap().tasks[1].id.clone();
        assert!(session.delete_task(&renamed).unwrap());
        assert_eq!(session.snapshot().unwrap().text, "[ ] a\n");
    }

    #[test]
    fn host_update_waits_for_typing_to_stop() {
        let (session, outbound) = spawn("a", &config(500)).unwrap();
        session.user_input("ab").unwrap();
        session.external_update("from host").unwrap();
        assert_eq!(session.snapshot().unwrap().text, "ab");

        assert_eq!(outbound.recv_timeout(WAIT).unwrap().text(), "ab");
        session.external_update("ab").unwrap();
        assert_eq!(session.snapshot().unwrap().text, "ab");
        session.external_update("from host").unwrap();
        assert_eq!(session.snapshot().unwrap().text, "from host");
    }

    #[test]
    fn shutdown_flushes_pending_keystrokes() {
        let (session, outbound) = spawn("", &config(60_000)).unwrap();
        session.user_input("[ ] late").unwrap();
        session.shutdown();
        assert_eq!(outbound.recv_timeout(WAIT).unwrap().text(), "[ ] late");
    }
}
