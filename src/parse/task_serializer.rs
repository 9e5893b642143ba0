use crate::model::task::Task;

/// Render tasks back to canonical checkbox lines, one per task.
///
/// Free text from the source document is not part of the task list, so this
/// is not an inverse of `parse_tasks`; parsing its output does give back the
/// same texts and statuses.
pub fn serialize_tasks(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&serialize_task(task));
        out.push('\n');
    }
    out
}

pub fn serialize_task(task: &Task) -> String {
    format!("{} {}", task.status.checkbox(), task.text)
}
