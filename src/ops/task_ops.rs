use crate::model::task::{Task, TaskId, TaskStatus};
use crate::parse::task_parser::{checkbox_prefix, replace_checkbox};
use crate::parse::{join_lines, normalize_line_endings, parse_tasks, split_lines};

/// Error type for line-level task edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("line {0} has no checkbox")]
    NoCheckbox(usize),
}

/// Result of inserting a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    /// Full document text after the insert
    pub text: String,
    /// Line the new task landed on
    pub line: usize,
    /// Id the new task has in `text`
    pub id: TaskId,
}

// ---------------------------------------------------------------------------
// Insert / remove
// ---------------------------------------------------------------------------

/// Insert `[ ] task_text` directly after the last task line.
///
/// Without any task lines the new line becomes the last line of the document,
/// keeping a trailing newline if there was one.
pub fn add_task(text: &str, task_text: &str) -> Added {
    let text = normalize_line_endings(text);
    let task_text = single_line(task_text);
    let new_line = format!("{} {}", TaskStatus::Todo.checkbox(), task_text);
    let id = |line| TaskId::derive(line, &task_text);

    if text.is_empty() {
        return Added {
            text: new_line,
            line: 0,
            id: id(0),
        };
    }

    let mut lines = split_lines(&text);
    let insert_at = match parse_tasks(&text).last() {
        Some(last) => last.line + 1,
        // The final empty segment is the trailing newline, not a line
        None if text.ends_with('\n') => lines.len() - 1,
        None => lines.len(),
    };
    lines.insert(insert_at, new_line);

    Added {
        text: join_lines(&lines),
        line: insert_at,
        id: id(insert_at),
    }
}

/// Remove the target task's line.
pub fn delete_task(text: &str, task_id: &TaskId) -> Result<String, TaskError> {
    let text = normalize_line_endings(text);
    let tasks = parse_tasks(&text);
    let task = locate(&tasks, task_id)?;
    let mut lines = split_lines(&text);
    lines.remove(task.line);
    Ok(join_lines(&lines))
}

// ---------------------------------------------------------------------------
// Rewrite in place
// ---------------------------------------------------------------------------

/// Replace the target task's text, keeping its indent, list marker and
/// checkbox character.
pub fn rename_task(text: &str, task_id: &TaskId, new_text: &str) -> Result<String, TaskError> {
    let text = normalize_line_endings(text);
    let tasks = parse_tasks(&text);
    let task = locate(&tasks, task_id)?;
    let mut lines = split_lines(&text);

    let new_line = {
        let prefix = checkbox_prefix(&lines[task.line]).ok_or(TaskError::NoCheckbox(task.line))?;
        format!(
            "{}{}[{}] {}",
            prefix.indent,
            prefix.dash,
            prefix.checkbox,
            single_line(new_text)
        )
    };
    lines[task.line] = new_line;
    Ok(join_lines(&lines))
}

/// Rewrite the target's checkbox to `status`. Only the first checkbox on the
/// line is touched.
pub fn set_status(text: &str, task_id: &TaskId, status: TaskStatus) -> Result<String, TaskError> {
    let text = normalize_line_endings(text);
    let tasks = parse_tasks(&text);
    let task = locate(&tasks, task_id)?;
    rewrite_checkbox(&text, task.line, status)
}

/// Cycle state: todo → doing → done → todo
pub fn cycle_status(text: &str, task_id: &TaskId) -> Result<String, TaskError> {
    let text = normalize_line_endings(text);
    let tasks = parse_tasks(&text);
    let task = locate(&tasks, task_id)?;
    rewrite_checkbox(&text, task.line, task.status.cycled())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], task_id: &TaskId) -> Option<&'a Task> {
    tasks.iter().find(|t| &t.id == task_id)
}

fn locate<'a>(tasks: &'a [Task], task_id: &TaskId) -> Result<&'a Task, TaskError> {
    find_task(tasks, task_id).ok_or_else(|| TaskError::NotFound(task_id.clone()))
}

fn rewrite_checkbox(text: &str, line: usize, status: TaskStatus) -> Result<String, TaskError> {
    let mut lines = split_lines(text);
    lines[line] = replace_checkbox(&lines[line], status).ok_or(TaskError::NoCheckbox(line))?;
    Ok(join_lines(&lines))
}

/// Task text must stay on one line; line breaks become spaces.
fn single_line(s: &str) -> String {
    normalize_line_endings(s).replace('\n', " ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
