//! Behaviour of a task document as seen by a host: structured edits,
//! keystrokes, and updates coming back from the host.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use taskit::document::TaskDocument;
use taskit::model::config::SyncConfig;
use taskit::model::task::{TaskId, TaskStatus};
use taskit::ops::task_ops;
use taskit::parse::parse_tasks;
use taskit::sync::message::HostMessage;

const SAMPLE: &str = "[ ] a\n[*] b\n[x] c\n";

fn doc(text: &str) -> TaskDocument<Vec<HostMessage>> {
    TaskDocument::new(text, &SyncConfig { debounce_ms: 200 }, Vec::new())
}

fn sent(doc: &TaskDocument<Vec<HostMessage>>) -> Vec<&str> {
    doc.outbox().iter().map(HostMessage::text).collect()
}

fn summary(text: &str) -> Vec<(String, TaskStatus, usize)> {
    parse_tasks(text)
        .into_iter()
        .map(|t| (t.text, t.status, t.line))
        .collect()
}

// ---------------------------------------------------------------------------
// Structured edits
// ---------------------------------------------------------------------------

#[test]
fn parse_is_deterministic() {
    let text = "intro\n  - [X] upper\n[ ]   spaced   out  \n[?] nope\n";
    assert_eq!(parse_tasks(text), parse_tasks(text));
}

#[test]
fn set_status_is_idempotent() {
    let id = TaskId::from("task-0-a");
    let once = task_ops::set_status(SAMPLE, &id, TaskStatus::Done).unwrap();
    let twice = task_ops::set_status(&once, &id, TaskStatus::Done).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn three_cycles_restore_every_status() {
    for task in parse_tasks(SAMPLE) {
        let mut text = SAMPLE.to_string();
        for _ in 0..3 {
            text = task_ops::cycle_status(&text, &task.id).unwrap();
        }
        assert_eq!(text, SAMPLE);
    }
}

#[test]
fn delete_undoes_add() {
    for original in [SAMPLE, "", "notes only\n", "[ ] a\ntrailing prose\n", "[ ] no newline"] {
        let added = task_ops::add_task(original, "x");
        let restored = task_ops::delete_task(&added.text, &added.id).unwrap();
        assert_eq!(restored, original);
    }
}

#[test]
fn cycle_delete_add_walkthrough() {
    let mut d = doc(SAMPLE);
    assert_eq!(
        summary(d.text()),
        vec![
            ("a".to_string(), TaskStatus::Todo, 0),
            ("b".to_string(), TaskStatus::Doing, 1),
            ("c".to_string(), TaskStatus::Done, 2),
        ]
    );

    let tasks = d.tasks();
    assert!(d.cycle_task_status(&tasks[0].id));
    assert_eq!(d.text(), "[*] a\n[*] b\n[x] c\n");

    assert!(d.delete_task(&tasks[2].id));
    assert_eq!(d.text(), "[*] a\n[*] b\n");

    // Goes in after the last task line; the document keeps ending in `\n`
    let id = d.add_task("d");
    assert_eq!(id.as_str(), "task-2-d");
    assert_eq!(d.text(), "[*] a\n[*] b\n[ ] d\n");

    // Every structured edit went out immediately
    assert_eq!(
        sent(&d),
        vec![
            "[*] a\n[*] b\n[x] c\n",
            "[*] a\n[*] b\n",
            "[*] a\n[*] b\n[ ] d\n"
        ]
    );
}

#[test]
fn ids_shift_when_an_earlier_line_goes() {
    let mut d = doc(SAMPLE);
    let before = d.tasks();
    assert!(d.delete_task(&before[0].id));

    let after = d.tasks();
    assert_eq!(after[0].id.as_str(), "task-0-b");
    // The old id of `b` no longer resolves
    assert!(!d.rename_task(&before[1].id, "bee"));
}

#[test]
fn stale_id_is_a_silent_no_op() {
    let mut d = doc(SAMPLE);
    let stale = TaskId::from("task-7-gone");
    assert!(!d.delete_task(&stale));
    assert!(!d.rename_task(&stale, "x"));
    assert!(!d.set_task_status(&stale, TaskStatus::Done));
    assert!(!d.cycle_task_status(&stale));
    assert_eq!(d.text(), SAMPLE);
    assert!(d.outbox().is_empty());
}

#[test]
fn edit_to_identical_text_is_not_sent() {
    let mut d = doc(SAMPLE);
    let done = d.tasks()[2].id.clone();
    assert!(!d.set_task_status(&done, TaskStatus::Done));
    assert!(d.outbox().is_empty());
}

// ---------------------------------------------------------------------------
// Host traffic
// ---------------------------------------------------------------------------

#[test]
fn echo_of_last_propagated_changes_nothing() {
    let mut d = doc(SAMPLE);
    let id = d.tasks()[0].id.clone();
    d.cycle_task_status(&id);
    let echoed = d.outbox()[0].text().to_string();
    let revision = d.sync().revision();

    assert!(!d.on_external_update(&echoed));
    assert_eq!(d.sync().revision(), revision);
    assert_eq!(d.outbox().len(), 1);
}

#[test]
fn echo_with_crlf_is_still_an_echo() {
    let mut d = doc(SAMPLE);
    assert!(!d.on_external_update("[ ] a\r\n[*] b\r\n[x] c\r\n"));
}

#[test]
fn genuine_external_update_is_applied() {
    let mut d = doc(SAMPLE);
    assert!(d.on_external_update("[x] a\n"));
    assert_eq!(d.text(), "[x] a\n");
    assert_eq!(d.tasks().len(), 1);
    // Accepting an update does not send it back
    assert!(d.outbox().is_empty());
}

#[test]
fn external_updates_dropped_while_typing() {
    let t0 = Instant::now();
    let mut d = doc(SAMPLE);
    d.on_text_changed_by_user("[ ] a\n[*] b\n[x] c\n[ ] d", t0);
    assert!(d.is_typing());

    assert!(!d.on_external_update("something else\n"));
    assert_eq!(d.text(), "[ ] a\n[*] b\n[x] c\n[ ] d");
}

#[test]
fn keystrokes_flush_once_after_debounce() {
    let t0 = Instant::now();
    let mut d = doc("");
    d.on_text_changed_by_user("[", t0);
    d.on_text_changed_by_user("[ ]", t0 + Duration::from_millis(100));
    d.on_text_changed_by_user("[ ] a", t0 + Duration::from_millis(150));

    // Tasks follow the buffer right away, the host waits
    assert_eq!(d.tasks().len(), 1);
    assert!(!d.poll(t0 + Duration::from_millis(300)));
    assert!(d.outbox().is_empty());

    assert!(d.poll(t0 + Duration::from_millis(350)));
    assert_eq!(sent(&d), vec!["[ ] a"]);
    assert!(!d.is_typing());

    // Nothing further is armed
    assert_eq!(d.next_deadline(), None);
    assert!(!d.poll(t0 + Duration::from_secs(10)));
}

#[test]
fn structured_edit_cancels_pending_flush() {
    let t0 = Instant::now();
    let mut d = doc(SAMPLE);
    d.on_text_changed_by_user("[ ] a\n[*] b\n[x] c\n[ ] typed\n", t0);
    let id = d.add_task("e");
    assert_eq!(id.as_str(), "task-4-e");

    assert_eq!(d.next_deadline(), None);
    assert!(!d.poll(t0 + Duration::from_secs(1)));
    assert_eq!(
        sent(&d),
        vec!["[ ] a\n[*] b\n[x] c\n[ ] typed\n[ ] e\n"]
    );
}

#[test]
fn typing_back_to_the_host_text_settles_without_sending() {
    let t0 = Instant::now();
    let mut d = doc(SAMPLE);
    d.on_text_changed_by_user("[ ] a\n", t0);
    d.on_text_changed_by_user(SAMPLE, t0 + Duration::from_millis(50));
    assert!(!d.poll(t0 + Duration::from_secs(1)));
    assert!(d.outbox().is_empty());
    assert!(!d.is_typing());
}
