use super::*;
use tempfile::tempdir;

fn log_file(dir: &std::path::Path) -> std::fs::File {
    std::fs::File::create(dir.join("run.log")).expect("create log")
}

#[test]
fn spawn_in_new_group_returns_a_live_pid() {
    let dir = tempdir().expect("tempdir");
    let log = log_file(dir.path());
    let pid = spawn_in_new_group(
        "/bin/sh",
        &["-c".to_string(), "sleep 1".to_string()],
        dir.path(),
        &[],
        &log,
    )
    .expect("spawn");
    assert!(is_process_alive(pid));
    kill_tree(pid);
}

#[test]
fn kill_tree_is_idempotent_on_an_already_dead_pid() {
    let dir = tempdir().expect("tempdir");
    let log = log_file(dir.path());
    let pid =
        spawn_in_new_group("/bin/sh", &["-c".to_string(), "true".to_string()], dir.path(), &[], &log)
            .expect("spawn");
    std::thread::sleep(Duration::from_millis(200));
    kill_tree(pid);
    kill_tree(pid);
}

#[test]
fn kill_tree_terminates_a_sleeping_child() {
    let dir = tempdir().expect("tempdir");
    let log = log_file(dir.path());
    let pid = spawn_in_new_group(
        "/bin/sh",
        &["-c".to_string(), "sleep 30".to_string()],
        dir.path(),
        &[],
        &log,
    )
    .expect("spawn");
    assert!(is_process_alive(pid));
    kill_tree(pid);
    std::thread::sleep(Duration::from_millis(200));
    assert!(!is_process_alive(pid));
}

#[test]
fn is_process_alive_is_false_for_an_implausible_pid() {
    // PID 1 exists on any Unix system but is never owned by us; a very
    // high, almost-certainly-unused PID should read as not alive.
    assert!(!is_process_alive(u32::MAX - 1));
}
