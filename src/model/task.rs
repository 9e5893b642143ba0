use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Number of grapheme clusters of the text slug kept in a task id
const ID_SLUG_LEN: usize = 10;

/// Task checkbox status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    /// The character written inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            TaskStatus::Todo => ' ',
            TaskStatus::Doing => '*',
            TaskStatus::Done => 'x',
        }
    }

    /// Parse a checkbox character into a status. Both `x` and `X` mean done.
    pub fn from_checkbox_char(c: char) -> Option<TaskStatus> {
        match c {
            ' ' => Some(TaskStatus::Todo),
            '*' => Some(TaskStatus::Doing),
            'x' | 'X' => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// The full checkbox, e.g. `[*]`
    pub fn checkbox(self) -> String {
        format!("[{}]", self.checkbox_char())
    }

    /// Next status in the cycle: todo → doing → done → todo
    pub fn cycled(self) -> TaskStatus {
        match self {
            TaskStatus::Todo => TaskStatus::Doing,
            TaskStatus::Doing => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}' (expected todo, doing or done)")]
pub struct StatusParseError(pub String);

impl FromStr for TaskStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == " " {
            return Ok(TaskStatus::Todo);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "doing" | "*" => Ok(TaskStatus::Doing),
            "done" | "x" => Ok(TaskStatus::Done),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Positional task identifier: `task-{line}-{slug}`.
///
/// Derived from the line index and the start of the task text, so it is only
/// stable while neither changes. Inserting or deleting a line above a task
/// gives it a new id on the next parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn derive(line: usize, text: &str) -> TaskId {
        let slug = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        let prefix: String = slug.graphemes(true).take(ID_SLUG_LEN).collect();
        TaskId(format!("task-{}-{}", line, prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// A task derived from one checkbox line of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Text after the checkbox, trimmed
    pub text: String,
    pub status: TaskStatus,
    /// Same as `status == Done`, kept for consumers that only know done/not done
    pub completed: bool,
    /// Line index in the document this task was parsed from (0-indexed)
    pub line: usize,
}

impl Task {
    pub fn new(line: usize, text: &str, status: TaskStatus) -> Self {
        let text = text.trim();
        Task {
            id: TaskId::derive(line, text),
            text: text.to_string(),
            status,
            completed: status == TaskStatus::Done,
            line,
        }
    }
}
