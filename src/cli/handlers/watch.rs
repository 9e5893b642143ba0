use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cli::commands::WatchArgs;
use crate::cli::output::{TaskListJson, format_task_table, task_to_json};
use crate::io::document_io::{read_document, save_document};
use crate::io::watcher::{DocumentWatcher, FileEvent};
use crate::model::config::Config;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::sync::message::HostMessage;
use crate::sync::session::{self, SessionHandle};

/// How long the loop waits for a stdin command before checking the file again
const TICK: Duration = Duration::from_millis(100);

/// One line typed into `taskit watch`
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchCommand {
    Add(String),
    Rename(TaskId, String),
    Delete(TaskId),
    Status(TaskId, Option<TaskStatus>),
    /// Replace the whole buffer, as an editor would on a keystroke
    Type(String),
    List,
    Quit,
}

pub fn cmd_watch(
    args: WatchArgs,
    config: &Config,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sync = config.sync.clone();
    if let Some(ms) = args.debounce_ms {
        sync.debounce_ms = ms;
    }

    let initial = read_document(&args.file)?;
    let (session, outbound) = session::spawn(&initial, &sync)?;
    let watcher = DocumentWatcher::start(&args.file)?;
    let commands = spawn_stdin_reader()?;
    info!(file = %args.file.display(), debounce_ms = sync.debounce_ms, "watching");

    let mut shown = session.snapshot()?;
    print_tasks(&args.file, &shown.tasks, json)?;

    loop {
        write_outbound(&args.file, &outbound);

        let events = watcher.poll();
        if let Some(FileEvent::Changed(path)) = events.last() {
            debug!(path = %path.display(), events = events.len(), "document changed on disk");
            session.external_update(read_document(&args.file)?)?;
        }

        match commands.recv_timeout(TICK) {
            Ok(line) => match parse_command(&line) {
                Ok(WatchCommand::Quit) => break,
                Ok(WatchCommand::List) => print_tasks(&args.file, &shown.tasks, json)?,
                Ok(cmd) => run_command(&session, cmd)?,
                Err(e) => eprintln!("error: {}", e),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let snapshot = session.snapshot()?;
        if snapshot.text != shown.text && !snapshot.typing {
            print_tasks(&args.file, &snapshot.tasks, json)?;
            shown = snapshot;
        }
    }

    // Shutdown flushes pending keystrokes; the channel closes once it's done
    session.shutdown();
    for msg in outbound.iter() {
        write_message(&args.file, msg);
    }
    info!(file = %args.file.display(), "stopped watching");
    Ok(())
}

fn run_command(session: &SessionHandle, cmd: WatchCommand) -> Result<(), Box<dyn std::error::Error>> {
    let changed = match cmd {
        WatchCommand::Add(text) => {
            let id = session.add_task(text)?;
            println!("{}", id);
            true
        }
        WatchCommand::Rename(id, text) => session.rename_task(&id, text)?,
        WatchCommand::Delete(id) => session.delete_task(&id)?,
        WatchCommand::Status(id, Some(status)) => session.set_task_status(&id, status)?,
        WatchCommand::Status(id, None) => session.cycle_task_status(&id)?,
        WatchCommand::Type(text) => {
            session.user_input(text)?;
            true
        }
        WatchCommand::List | WatchCommand::Quit => true,
    };
    if !changed {
        eprintln!("no change");
    }
    Ok(())
}

fn write_outbound(file: &Path, outbound: &Receiver<HostMessage>) {
    for msg in outbound.try_iter() {
        write_message(file, msg);
    }
}

fn write_message(file: &Path, msg: HostMessage) {
    if let Err(e) = save_document(file, msg.text()) {
        warn!(error = %e, "could not save document");
    }
}

fn print_tasks(file: &Path, tasks: &[Task], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let out = TaskListJson {
            file: file.display().to_string(),
            tasks: tasks.iter().map(task_to_json).collect(),
        };
        // One document per line so a reader can follow the stream
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("--");
        for line in format_task_table(tasks) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("taskit-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

fn parse_command(line: &str) -> Result<WatchCommand, String> {
    let line = line.trim_start();
    let (word, raw) = line.split_once(' ').unwrap_or((line, ""));
    let rest = raw.trim_start();

    match word {
        "add" => non_empty(rest, "add TEXT").map(|t| WatchCommand::Add(t.to_string())),
        "rename" => {
            let (id, text) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: rename ID TEXT")?;
            Ok(WatchCommand::Rename(id.into(), text.trim().to_string()))
        }
        "delete" => non_empty(rest, "delete ID").map(|id| WatchCommand::Delete(id.trim().into())),
        "status" => {
            let mut parts = rest.split_whitespace();
            let id = parts.next().ok_or("usage: status ID [STATUS]")?;
            let status = parts
                .next()
                .map(str::parse::<TaskStatus>)
                .transpose()
                .map_err(|e| e.to_string())?;
            Ok(WatchCommand::Status(id.into(), status))
        }
        // Leading whitespace is part of the buffer
        "type" => Ok(WatchCommand::Type(unescape(raw))),
        "list" => Ok(WatchCommand::List),
        "quit" | "exit" => Ok(WatchCommand::Quit),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command: {}", other)),
    }
}

fn non_empty<'a>(s: &'a str, usage: &str) -> Result<&'a str, String> {
    if s.trim().is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(s)
    }
}

/// `\n` becomes a newline and `\\` a backslash; other escapes are kept as is.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_add_and_rename() {
        assert_eq!(
            parse_command("add buy milk"),
            Ok(WatchCommand::Add("buy milk".into()))
        );
        assert_eq!(
            parse_command("rename task-0-a  oat milk "),
            Ok(WatchCommand::Rename("task-0-a".into(), "oat milk".into()))
        );
        assert!(parse_command("rename task-0-a").is_err());
        assert!(parse_command("add   ").is_err());
    }

    #[test]
    fn parses_status_with_and_without_value() {
        assert_eq!(
            parse_command("status task-0-a"),
            Ok(WatchCommand::Status("task-0-a".into(), None))
        );
        assert_eq!(
            parse_command("status task-0-a done"),
            Ok(WatchCommand::Status("task-0-a".into(), Some(TaskStatus::Done)))
        );
        assert!(parse_command("status task-0-a later").is_err());
    }

    #[test]
    fn parses_type_with_escapes() {
        assert_eq!(
            parse_command(r"type [ ] a\n[x] b\n"),
            Ok(WatchCommand::Type("[ ] a\n[x] b\n".into()))
        );
    }

    #[test]
    fn type_keeps_indentation() {
        assert_eq!(
            parse_command(r"type   [ ] nested"),
            Ok(WatchCommand::Type("  [ ] nested".into()))
        );
    }

    #[test]
    fn parses_bare_words() {
        assert_eq!(parse_command("list"), Ok(WatchCommand::List));
        assert_eq!(parse_command("quit"), Ok(WatchCommand::Quit));
        assert_eq!(parse_command("delete task-2-c"), Ok(WatchCommand::Delete("task-2-c".into())));
        assert!(parse_command("").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn unescape_keeps_unknown_escapes() {
        assert_eq!(unescape(r"a\tb\\n"), r"a\tb\n");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
