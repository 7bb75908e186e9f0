use agrewind_runtime::{Config, Error, RevertRejected, ScanInterrupt, Workspace};
use agrewind_testing::{SessionLogBuilder, TestWorld};
use agrewind_types::RevertAction;

fn config(world: &TestWorld) -> Config {
    Config {
        log_root: Some(world.log_root().to_string_lossy().into_owned()),
        ledger_path: Some(world.ledger_path().to_string_lossy().into_owned()),
        snippet_length: 100,
    }
}

fn open(world: &TestWorld) -> Workspace {
    Workspace::open(config(world), world.project_dir()).unwrap()
}

#[test]
fn test_exactly_one_latest_session() {
    let world = TestWorld::new();
    for id in ["alpha", "beta", "gamma"] {
        world
            .write_session(id, &SessionLogBuilder::new(id).user(&format!("hello {id}")))
            .unwrap();
    }
    world.set_session_mtime("alpha", 1_700_000_100).unwrap();
    world.set_session_mtime("beta", 1_700_000_300).unwrap();
    world.set_session_mtime("gamma", 1_700_000_200).unwrap();

    let ws = open(&world);
    let sessions = ws.list_sessions(&ScanInterrupt::new()).unwrap();

    let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["beta", "gamma", "alpha"]);
    assert_eq!(sessions.iter().filter(|s| s.is_latest).count(), 1);
    assert!(sessions[0].is_latest);
    assert_eq!(sessions[0].first_message.as_deref(), Some("hello beta"));
}

#[test]
fn test_interrupted_scan_discards_results() {
    let world = TestWorld::new();
    world
        .write_session("s1", &SessionLogBuilder::new("s1").user("hi"))
        .unwrap();

    let ws = open(&world);
    let interrupt = ScanInterrupt::new();
    interrupt.trip();

    assert!(matches!(ws.list_sessions(&interrupt), Err(Error::Interrupted)));
}

#[test]
fn test_first_occurrence_edit_and_revert() {
    let world = TestWorld::new();
    world.write_project_file("greet.txt", "foo foo");
    let target = world.project_file("greet.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("rename the first foo")
                .edit(&target, "foo", "bar", false),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].before, "foo foo");
    assert_eq!(changes[0].after, "bar foo");
    assert!(changes[0].can_revert);

    // The agent's edit lands on disk.
    world.write_project_file("greet.txt", "bar foo");

    let outcome = ws.revert_change(changes[0].id()).unwrap();
    assert_eq!(outcome.action, RevertAction::Restored);
    assert_eq!(outcome.file_path, target);
    assert_eq!(world.read_project_file("greet.txt").as_deref(), Some("foo foo"));
}

#[test]
fn test_overwrite_revert_restores_exact_bytes() {
    let world = TestWorld::new();
    let original = "line one  \n\tindented\t\n\n\n";
    world.write_project_file("src/lib.rs", original);
    let target = world.project_file("src/lib.rs");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("rewrite lib")
                .write(&target, "replaced\n"),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();
    assert!(!changes[0].is_creation);
    world.write_project_file("src/lib.rs", "replaced\n");

    ws.revert_change(changes[0].id()).unwrap();
    assert_eq!(world.read_project_file("src/lib.rs").as_deref(), Some(original));
}

#[test]
fn test_creation_revert_deletes_and_is_idempotent() {
    let world = TestWorld::new();
    let target = world.project_file("notes/new.md");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("add notes")
                .write(&target, "# Notes\n"),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();
    assert!(changes[0].is_creation);
    assert!(changes[0].diff.starts_with("--- /dev/null\n"));

    world.write_project_file("notes/new.md", "# Notes\n");

    let outcome = ws.revert_change(changes[0].id()).unwrap();
    assert_eq!(outcome.action, RevertAction::Deleted);
    assert_eq!(world.read_project_file("notes/new.md"), None);

    let again = ws.revert_change(changes[0].id());
    assert!(matches!(
        again,
        Err(Error::Rejected(RevertRejected::AlreadyReverted(_)))
    ));
    assert_eq!(world.read_project_file("notes/new.md"), None);
}

#[test]
fn test_creation_already_absent_is_success() {
    let world = TestWorld::new();
    let target = world.project_file("gone.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1").user("make it").write(&target, "x"),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();

    let outcome = ws.revert_change(changes[0].id()).unwrap();
    assert_eq!(outcome.action, RevertAction::AlreadyAbsent);
    assert_eq!(ws.reverted_changes().unwrap().len(), 1);
}

#[test]
fn test_ledger_survives_restart() {
    let world = TestWorld::new();
    world.write_project_file("a.txt", "before\n");
    let target = world.project_file("a.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1").user("change a").write(&target, "after\n"),
        )
        .unwrap();

    let change_id = {
        let ws = open(&world);
        let changes = ws.get_session_changes("s1").unwrap();
        world.write_project_file("a.txt", "after\n");
        ws.revert_change(changes[0].id()).unwrap();
        changes[0].id().to_string()
    };

    let restarted = open(&world);
    let changes = restarted.get_session_changes("s1").unwrap();
    assert_eq!(changes[0].id(), change_id);
    assert!(!changes[0].can_revert);

    let records = restarted.reverted_changes().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].change_id, change_id);

    assert!(matches!(
        restarted.revert_change(&change_id),
        Err(Error::Rejected(RevertRejected::AlreadyReverted(_)))
    ));
}

#[test]
fn test_non_latest_session_changes_are_never_revertable() {
    let world = TestWorld::new();
    world.write_project_file("a.txt", "v1\n");
    let target = world.project_file("a.txt");
    world
        .write_session(
            "older",
            &SessionLogBuilder::new("older").user("first").write(&target, "v2\n"),
        )
        .unwrap();
    world
        .write_session(
            "newer",
            &SessionLogBuilder::new("newer").user("second").write(&target, "v3\n"),
        )
        .unwrap();
    world.set_session_mtime("older", 1_700_000_000).unwrap();
    world.set_session_mtime("newer", 1_700_000_500).unwrap();

    let ws = open(&world);
    let old_changes = ws.get_session_changes("older").unwrap();
    assert!(old_changes.iter().all(|c| !c.can_revert && !c.is_latest_session));

    assert!(matches!(
        ws.revert_change(old_changes[0].id()),
        Err(Error::Rejected(RevertRejected::NotLatestSession(_)))
    ));
    assert_eq!(world.read_project_file("a.txt").as_deref(), Some("v1\n"));

    let new_changes = ws.get_session_changes("newer").unwrap();
    assert!(new_changes[0].can_revert);
}

#[test]
fn test_old_session_change_rejected_without_prior_listing() {
    let world = TestWorld::new();
    let target = world.project_file("a.txt");
    world
        .write_session(
            "older",
            &SessionLogBuilder::new("older").user("first").write(&target, "x"),
        )
        .unwrap();
    world
        .write_session("newer", &SessionLogBuilder::new("newer").user("second"))
        .unwrap();
    world.set_session_mtime("older", 1_700_000_000).unwrap();
    world.set_session_mtime("newer", 1_700_000_500).unwrap();

    let change_id = {
        let earlier = open(&world);
        earlier.get_session_changes("older").unwrap()[0].id().to_string()
    };

    let ws = open(&world);
    assert!(matches!(
        ws.revert_change(&change_id),
        Err(Error::Rejected(RevertRejected::NotLatestSession(_)))
    ));
}

#[test]
fn test_malformed_lines_do_not_affect_neighbours() {
    let world = TestWorld::new();
    let a = world.project_file("a.txt");
    let b = world.project_file("b.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("two files please")
                .write(&a, "a")
                .raw("{\"type\":\"assistant\",\"message\":")
                .raw("not json at all")
                .write(&b, "b")
                .raw("{\"type\":\"user\",\"timestamp\":\"2025-01-"),
        )
        .unwrap();

    let ws = open(&world);
    let turns = ws.get_session_turns("s1").unwrap();
    assert_eq!(turns.turns.len(), 1);
    let paths: Vec<&str> = turns.turns[0]
        .changes
        .iter()
        .map(|c| c.change.file_path.as_str())
        .collect();
    assert_eq!(paths, vec![a.as_str(), b.as_str()]);
}

#[test]
fn test_session_turns_carry_attribution() {
    let world = TestWorld::new();
    let target = world.project_file("main.rs");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("scaffold main")
                .assistant_text("Creating main.rs")
                .write(&target, "fn main() {}\n")
                .tool_result()
                .user("now print something")
                .edit(&target, "{}", "{ println!(\"hi\"); }", false),
        )
        .unwrap();

    let ws = open(&world);
    let session_turns = ws.get_session_turns("s1").unwrap();
    assert!(session_turns.session.is_latest);
    assert_eq!(session_turns.turns.len(), 2);

    let first = &session_turns.turns[0];
    assert_eq!(first.user_message, "scaffold main");
    assert_eq!(first.assistant_message, "Creating main.rs");
    assert_eq!(first.changes[0].turn_id, first.id);

    let second = &session_turns.turns[1];
    assert_eq!(second.changes[0].user_message, "now print something");
    assert_eq!(second.changes[0].before, "fn main() {}\n");
    assert_eq!(second.changes[0].after, "fn main() { println!(\"hi\"); }\n");
    assert!(second.changes.iter().all(|c| c.can_revert && c.is_latest_session));
}

#[test]
fn test_changes_listed_newest_first() {
    let world = TestWorld::new();
    let a = world.project_file("a.txt");
    let b = world.project_file("b.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("go")
                .write(&a, "1")
                .write(&b, "2"),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();
    assert_eq!(changes[0].change.file_path, b);
    assert_eq!(changes[1].change.file_path, a);
}

#[test]
fn test_unrevertable_edit_is_rejected() {
    let world = TestWorld::new();
    world.write_project_file("a.txt", "abc");
    let target = world.project_file("a.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("edit")
                .edit(&target, "not there", "x", false),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();
    assert!(changes[0].error.is_some());
    assert!(!changes[0].can_revert);

    assert!(matches!(
        ws.revert_change(changes[0].id()),
        Err(Error::Rejected(RevertRejected::Unrevertable { .. }))
    ));
    assert_eq!(world.read_project_file("a.txt").as_deref(), Some("abc"));
}

#[test]
fn test_unknown_ids_are_not_found() {
    let world = TestWorld::new();
    world
        .write_session("s1", &SessionLogBuilder::new("s1").user("hi"))
        .unwrap();

    let ws = open(&world);
    assert!(matches!(
        ws.get_session_turns("missing"),
        Err(Error::SessionNotFound(_))
    ));
    assert!(matches!(
        ws.revert_change("s1-0-nope"),
        Err(Error::ChangeNotFound(_))
    ));
}

#[test]
fn test_concurrent_reverts_of_same_change() {
    let world = TestWorld::new();
    world.write_project_file("a.txt", "orig\n");
    let target = world.project_file("a.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1").user("go").write(&target, "new\n"),
        )
        .unwrap();

    let ws = open(&world);
    let change_id = ws.get_session_changes("s1").unwrap()[0].id().to_string();
    world.write_project_file("a.txt", "new\n");

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| ws.revert_change(&change_id)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Rejected(RevertRejected::AlreadyReverted(_)))))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(rejected, 1);
    assert_eq!(world.read_project_file("a.txt").as_deref(), Some("orig\n"));
    assert_eq!(ws.reverted_changes().unwrap().len(), 1);
}

#[test]
fn test_ledger_failure_rolls_back_file() {
    let world = TestWorld::new();
    world.write_project_file("greet.txt", "foo foo");
    let target = world.project_file("greet.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("edit")
                .edit(&target, "foo", "bar", false),
        )
        .unwrap();

    let ws = open(&world);
    let change_id = ws.get_session_changes("s1").unwrap()[0].id().to_string();
    world.write_project_file("greet.txt", "bar foo");

    let sabotage = rusqlite::Connection::open(world.ledger_path()).unwrap();
    sabotage
        .execute_batch("DROP TABLE reverted_changes;")
        .unwrap();
    drop(sabotage);

    assert!(matches!(ws.revert_change(&change_id), Err(Error::Ledger(_))));
    assert_eq!(world.read_project_file("greet.txt").as_deref(), Some("bar foo"));
    assert!(!ws.engine().is_reverted(&change_id));
}

#[test]
fn test_concurrent_reverts_on_same_file_are_serialized() {
    let world = TestWorld::new();
    world.write_project_file("a.txt", "orig\n");
    let target = world.project_file("a.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("go")
                .write(&target, "v1\n")
                .write(&target, "v2\n"),
        )
        .unwrap();

    let ws = open(&world);
    let ids: Vec<String> = ws
        .get_session_changes("s1")
        .unwrap()
        .iter()
        .map(|c| c.id().to_string())
        .collect();
    world.write_project_file("a.txt", "v2\n");

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| scope.spawn(|| ws.revert_change(id)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| r.is_ok()));
    let content = world.read_project_file("a.txt").unwrap();
    assert!(content == "orig\n" || content == "v1\n", "torn content: {content:?}");
    assert_eq!(ws.reverted_changes().unwrap().len(), 2);
    assert!(ids.iter().all(|id| ws.engine().is_reverted(id)));

    let entries = std::fs::read_dir(world.project_dir()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn test_ledger_failure_restores_bytes_on_disk_not_snapshot() {
    let world = TestWorld::new();
    world.write_project_file("doc.txt", "a x");
    let target = world.project_file("doc.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1")
                .user("edit twice")
                .edit(&target, "a", "b", false)
                .edit(&target, "x", "y", false),
        )
        .unwrap();

    let ws = open(&world);
    let changes = ws.get_session_changes("s1").unwrap();
    let first = changes[1].id().to_string();
    assert_eq!(changes[1].after, "b x");
    world.write_project_file("doc.txt", "b y");

    let sabotage = rusqlite::Connection::open(world.ledger_path()).unwrap();
    sabotage
        .execute_batch("DROP TABLE reverted_changes;")
        .unwrap();
    drop(sabotage);

    assert!(matches!(ws.revert_change(&first), Err(Error::Ledger(_))));
    assert_eq!(world.read_project_file("doc.txt").as_deref(), Some("b y"));
    assert!(!ws.engine().is_reverted(&first));
}

#[test]
fn test_ledger_failure_removes_file_that_was_absent() {
    let world = TestWorld::new();
    world.write_project_file("gone.txt", "old\n");
    let target = world.project_file("gone.txt");
    world
        .write_session(
            "s1",
            &SessionLogBuilder::new("s1").user("rewrite").write(&target, "new\n"),
        )
        .unwrap();

    let ws = open(&world);
    let change_id = ws.get_session_changes("s1").unwrap()[0].id().to_string();
    std::fs::remove_file(world.project_dir().join("gone.txt")).unwrap();

    let sabotage = rusqlite::Connection::open(world.ledger_path()).unwrap();
    sabotage
        .execute_batch("DROP TABLE reverted_changes;")
        .unwrap();
    drop(sabotage);

    assert!(matches!(ws.revert_change(&change_id), Err(Error::Ledger(_))));
    assert_eq!(world.read_project_file("gone.txt"), None);
}

#[cfg(target_os = "linux")]
#[test]
fn test_unreadable_log_does_not_hide_other_sessions() {
    let world = TestWorld::new();
    world
        .write_session("good", &SessionLogBuilder::new("good").user("still here"))
        .unwrap();
    world.set_session_mtime("good", 1_700_000_000).unwrap();
    std::os::unix::fs::symlink("/proc/self/mem", world.project_log_dir().join("bad.jsonl"))
        .unwrap();

    let ws = open(&world);
    let sessions = ws.list_sessions(&ScanInterrupt::new()).unwrap();

    let good = sessions.iter().find(|s| s.id == "good").unwrap();
    assert_eq!(good.first_message.as_deref(), Some("still here"));
    let bad = sessions.iter().find(|s| s.id == "bad").unwrap();
    assert_eq!(bad.first_message, None);
    assert_eq!(bad.change_count, 0);
    assert_eq!(sessions.iter().filter(|s| s.is_latest).count(), 1);
}
