use serde::Serialize;

use crate::model::task::{Task, TaskStatus};
use crate::util::unicode::{display_width, pad_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub text: String,
    pub status: TaskStatus,
    pub completed: bool,
    pub line: usize,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub file: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct AddedJson {
    pub id: String,
    pub line: usize,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub id: String,
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.to_string(),
        text: task.text.clone(),
        status: task.status,
        completed: task.completed,
        line: task.line,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `[c] id  text`, with the id padded to `id_width` display cells
pub fn format_task_line(task: &Task, id_width: usize) -> String {
    format!(
        "{} {}  {}",
        task.status.checkbox(),
        pad_to_width(task.id.as_str(), id_width),
        task.text
    )
}

/// One line per task, ids aligned in a column
pub fn format_task_table<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<String> {
    let tasks: Vec<&Task> = tasks.into_iter().collect();
    let id_width = tasks
        .iter()
        .map(|t| display_width(t.id.as_str()))
        .max()
        .unwrap_or(0);
    tasks
        .into_iter()
        .map(|t| format_task_line(t, id_width))
        .collect()
}
