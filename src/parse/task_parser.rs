use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::task::{Task, TaskStatus};

/// A whole task line: `(indent)(- )?[c] text`
static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(-\s)?\[([ *xX])\]\s*(.+)$").expect("task line pattern is valid")
});

/// The checkbox prefix of a task line, without the text
static CHECKBOX_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(-\s)?\[([ *xX])\]\s*").expect("checkbox prefix pattern is valid")
});

/// The first checkbox bracket group anywhere on a line
static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[ *xX]\]").expect("checkbox pattern is valid"));

/// Leading part of a task line, as matched by the checkbox prefix pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxPrefix<'a> {
    pub indent: &'a str,
    /// The list marker (`- `) if present
    pub dash: &'a str,
    pub checkbox: char,
}

/// Collapse `\r\n` and lone `\r` into `\n`. Borrows when nothing changes.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Split normalized text into lines. A trailing newline yields a final empty
/// line, so `join_lines(split_lines(t)) == t`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(|l| l.to_string()).collect()
}

pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

/// Parse every task line of `text`, in document order.
pub fn parse_tasks(text: &str) -> Vec<Task> {
    let text = normalize_line_endings(text);
    text.split('\n')
        .enumerate()
        .filter_map(|(idx, line)| parse_task_line(line, idx))
        .collect()
}

/// Parse a single line. Returns `None` for anything that is not a task line.
pub fn parse_task_line(line: &str, idx: usize) -> Option<Task> {
    let caps = TASK_LINE.captures(line)?;
    let checkbox = caps.get(3)?.as_str().chars().next()?;
    let status = TaskStatus::from_checkbox_char(checkbox)?;
    let text = caps.get(4)?.as_str();
    Some(Task::new(idx, text, status))
}

/// Match the checkbox prefix at the start of `line`.
pub fn checkbox_prefix(line: &str) -> Option<CheckboxPrefix<'_>> {
    let caps = CHECKBOX_PREFIX.captures(line)?;
    Some(CheckboxPrefix {
        indent: caps.get(1).map_or("", |m| m.as_str()),
        dash: caps.get(2).map_or("", |m| m.as_str()),
        checkbox: caps.get(3)?.as_str().chars().next()?,
    })
}

/// Replace the first checkbox bracket group on `line`.
/// Returns `None` if the line has no checkbox.
pub fn replace_checkbox(line: &str, status: TaskStatus) -> Option<String> {
    let m = CHECKBOX.find(line)?;
    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..m.start()]);
    out.push_str(&status.checkbox());
    out.push_str(&line[m.end()..]);
    Some(out)
}
