mod watch;
pub use watch::cmd_watch;

use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::document::TaskDocument;
use crate::io::document_io::{read_document, save_document};
use crate::model::config::Config;
use crate::model::task::{Task, TaskId};
use crate::parse::serialize_tasks;
use crate::sync::message::HostMessage;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: &Config) -> HandlerResult {
    let json = cli.json;
    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(args, config, json),

        // Write commands
        Commands::Add(args) => cmd_add(args, config, json),
        Commands::Rename(args) => cmd_rename(args, config, json),
        Commands::Delete(args) => cmd_delete(args, config, json),
        Commands::Status(args) => cmd_status(args, config, json),

        // Session
        Commands::Watch(args) => cmd_watch(args, config, json),
    }
}

impl Commands {
    /// The task document the command operates on
    pub fn file(&self) -> &Path {
        match self {
            Commands::List(a) => &a.file,
            Commands::Add(a) => &a.file,
            Commands::Rename(a) => &a.file,
            Commands::Delete(a) => &a.file,
            Commands::Status(a) => &a.file,
            Commands::Watch(a) => &a.file,
        }
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, config: &Config, json: bool) -> HandlerResult {
    let mut doc = open(&args.file, config)?;
    let tasks: Vec<Task> = doc
        .tasks()
        .iter()
        .filter(|t| args.status.is_none_or(|s| t.status == s))
        .cloned()
        .collect();

    if json {
        let out = TaskListJson {
            file: args.file.display().to_string(),
            tasks: tasks.iter().map(task_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if args.plain {
        print!("{}", serialize_tasks(&tasks));
    } else {
        for line in format_task_table(&tasks) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, config: &Config, json: bool) -> HandlerResult {
    let mut doc = open(&args.file, config)?;
    let id = doc.add_task(&args.text);
    let line = doc
        .tasks()
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.line)
        .ok_or_else(|| format!("added task not found: {}", id))?;
    save(&args.file, doc)?;

    if json {
        let out = AddedJson {
            id: id.to_string(),
            line,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_rename(args: RenameArgs, config: &Config, json: bool) -> HandlerResult {
    let id = TaskId::from(args.id);
    let mut doc = open(&args.file, config)?;
    let line = doc.tasks().iter().find(|t| t.id == id).map(|t| t.line);
    let changed = doc.rename_task(&id, &args.text);
    let new_id = line.and_then(|l| {
        doc.tasks()
            .iter()
            .find(|t| t.line == l)
            .map(|t| t.id.clone())
    });
    finish_edit(&args.file, doc, &id, changed, json)?;

    // The id embeds the text, so a rename gives the task a new one
    if changed
        && !json
        && let Some(new_id) = new_id
    {
        println!("{}", new_id);
    }
    Ok(())
}

fn cmd_delete(args: DeleteArgs, config: &Config, json: bool) -> HandlerResult {
    let id = TaskId::from(args.id);
    let mut doc = open(&args.file, config)?;
    let changed = doc.delete_task(&id);
    finish_edit(&args.file, doc, &id, changed, json)
}

fn cmd_status(args: StatusArgs, config: &Config, json: bool) -> HandlerResult {
    let id = TaskId::from(args.id);
    let mut doc = open(&args.file, config)?;
    let changed = match args.status {
        Some(status) => doc.set_task_status(&id, status),
        None => doc.cycle_task_status(&id),
    };
    let status = doc
        .tasks()
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.status);
    finish_edit(&args.file, doc, &id, changed, json)?;

    if changed
        && !json
        && let Some(status) = status
    {
        println!("{} → {}", id, status);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type OneShot = TaskDocument<Vec<HostMessage>>;

fn open(file: &Path, config: &Config) -> Result<OneShot, Box<dyn std::error::Error>> {
    let text = read_document(file)?;
    Ok(TaskDocument::new(&text, &config.sync, Vec::new()))
}

/// Write the last outbound update, if the edit produced one.
fn save(file: &Path, doc: OneShot) -> HandlerResult {
    if let Some(msg) = doc.into_outbox().pop() {
        save_document(file, msg.text())?;
    }
    Ok(())
}

fn finish_edit(file: &Path, mut doc: OneShot, id: &TaskId, changed: bool, json: bool) -> HandlerResult {
    if !changed {
        eprintln!("no change: {}", no_change_reason(&mut doc, id));
    }
    save(file, doc)?;

    if json {
        let out = ChangeJson {
            id: id.to_string(),
            changed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

fn no_change_reason(doc: &mut OneShot, id: &TaskId) -> String {
    if doc.tasks().iter().any(|t| &t.id == id) {
        format!("task {} already reads that way", id)
    } else {
        format!("no task with id {}", id)
    }
}
