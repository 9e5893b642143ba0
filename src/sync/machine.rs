//! Reconciles local keystrokes, structured edits and host updates.
//!
//! The machine owns the document text. Everything that can change it arrives
//! as a [`SyncEvent`] through [`SyncMachine::handle`], together with the
//! current time, so the debounce behaves the same under test as it does in a
//! live session.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::parse::normalize_line_endings;
use crate::sync::message::HostMessage;

/// Identifies one armed debounce timer. Only the most recent token is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Raw text from the user's editor buffer, one per keystroke
    LocalEdit(String),
    /// Output of a structured edit (add, delete, rename, status)
    ProgrammaticEdit(String),
    /// Text pushed by the host document
    Inbound(HostMessage),
    /// A debounce timer ran out
    TimerFired(TimerToken),
}

/// Why an inbound update was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The text is what we last sent out ourselves
    Echo,
    /// The user is in the middle of typing
    Typing,
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A keystroke was taken in and the flush timer (re)armed
    Scheduled { token: TimerToken, deadline: Instant },
    /// The text must be sent to the host
    Propagate(HostMessage),
    /// An inbound update replaced the text
    Applied,
    /// An inbound update was ignored
    Dropped(DropReason),
    /// The flush timer fired with nothing new to send
    Settled,
    /// The timer that fired had already been replaced or cancelled
    Stale,
}

impl Step {
    /// The outbound message, if this step produced one
    pub fn outbound(self) -> Option<HostMessage> {
        match self {
            Step::Propagate(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingFlush {
    token: TimerToken,
    deadline: Instant,
}

/// Owner of the document text and the echo/typing guards.
#[derive(Debug)]
pub struct SyncMachine {
    current: String,
    /// Watermark: the last text sent to (or accepted from) the host
    last_propagated: String,
    typing: bool,
    /// At most one flush is armed at a time
    pending: Option<PendingFlush>,
    debounce: Duration,
    /// Bumped whenever `current` changes
    revision: u64,
    next_token: u64,
}

impl SyncMachine {
    /// Start from the host's text, which counts as already propagated.
    pub fn new(initial: &str, debounce: Duration) -> Self {
        let initial = normalize_line_endings(initial).into_owned();
        SyncMachine {
            last_propagated: initial.clone(),
            current: initial,
            typing: false,
            pending: None,
            debounce,
            revision: 0,
            next_token: 0,
        }
    }

    pub fn handle(&mut self, event: SyncEvent, now: Instant) -> Step {
        match event {
            SyncEvent::LocalEdit(text) => self.local_edit(text, now),
            SyncEvent::ProgrammaticEdit(text) => self.programmatic_edit(text),
            SyncEvent::Inbound(msg) => self.inbound(msg),
            SyncEvent::TimerFired(token) => self.timer_fired(token),
        }
    }

    /// Fire the pending flush if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Step> {
        let pending = self.pending?;
        if pending.deadline <= now {
            Some(self.timer_fired(pending.token))
        } else {
            None
        }
    }

    /// When the pending flush is due, if one is armed
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn text(&self) -> &str {
        &self.current
    }

    pub fn last_propagated(&self) -> &str {
        &self.last_propagated
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn local_edit(&mut self, text: String, now: Instant) -> Step {
        self.typing = true;
        self.replace_current(text);

        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let deadline = now + self.debounce;
        self.pending = Some(PendingFlush { token, deadline });
        trace!(?token, "flush scheduled");
        Step::Scheduled { token, deadline }
    }

    fn programmatic_edit(&mut self, text: String) -> Step {
        self.typing = false;
        if self.pending.take().is_some() {
            trace!("pending flush superseded by structured edit");
        }
        self.replace_current(text);
        self.last_propagated = self.current.clone();
        Step::Propagate(HostMessage::update(self.current.clone()))
    }

    fn inbound(&mut self, msg: HostMessage) -> Step {
        let text = normalize_line_endings(msg.text()).into_owned();
        if self.typing {
            debug!("inbound update dropped while typing");
            return Step::Dropped(DropReason::Typing);
        }
        if text == self.last_propagated {
            debug!("inbound update is our own echo");
            return Step::Dropped(DropReason::Echo);
        }
        self.replace_current(text);
        self.last_propagated = self.current.clone();
        Step::Applied
    }

    fn timer_fired(&mut self, token: TimerToken) -> Step {
        match self.pending {
            Some(p) if p.token == token => {}
            _ => {
                trace!(?token, "stale flush timer ignored");
                return Step::Stale;
            }
        }
        self.pending = None;
        self.typing = false;

        if self.current == self.last_propagated {
            return Step::Settled;
        }
        self.last_propagated = self.current.clone();
        Step::Propagate(HostMessage::update(self.current.clone()))
    }

    fn replace_current(&mut self, text: String) {
        let text = if text.contains('\r') {
            normalize_line_endings(&text).into_owned()
        } else {
            text
        };
        if text != self.current {
            self.current = text;
            self.revision += 1;
        }
    }
}
