//! Black-box invariants that must hold regardless of whether an analysis
//! runs sequentially or through the worker pool.

use std::path::Path;
use std::time::Duration;

use dua_engine::{Coordinator, EngineConfig, EngineError, Navigator, SequentialSizer, Sizer};

fn layout(root: &Path) {
    std::fs::write(root.join("top.bin"), vec![0u8; 100]).unwrap();
    std::fs::create_dir(root.join("docs")).unwrap();
    std::fs::write(root.join("docs").join("readme.md"), vec![0u8; 40]).unwrap();
    std::fs::create_dir(root.join("docs").join("images")).unwrap();
    std::fs::write(root.join("docs").join("images").join("logo.png"), vec![0u8; 2_000]).unwrap();
    std::fs::create_dir(root.join("src")).unwrap();
    std::fs::write(root.join("src").join("main.rs"), vec![0u8; 500]).unwrap();
    std::fs::write(root.join("src").join("lib.rs"), vec![0u8; 300]).unwrap();
}

fn total_bytes() -> u64 {
    100 + 40 + 2_000 + 500 + 300
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        worker_count: 3,
        idle_poll_interval: Duration::from_millis(5),
        coordinator_tick: Duration::from_millis(5),
        share_expiration: Duration::from_millis(200),
        quit_grace: Duration::from_millis(500),
        busy_burst: 20,
    }
}

#[test]
fn sequential_and_parallel_agree_on_total_size() {
    let dir = tempfile::tempdir().unwrap();
    layout(dir.path());

    let mut sequential = SequentialSizer::new();
    sequential.set_root(dir.path()).unwrap();
    sequential.run().unwrap();

    let mut coordinator = Coordinator::new(fast_config());
    coordinator.set_root(dir.path()).unwrap();
    coordinator.run().unwrap();

    let seq_total = sequential.tree().node(sequential.tree().root).size;
    let par_total = coordinator.tree().node(coordinator.tree().root).size;

    assert_eq!(seq_total, total_bytes());
    assert_eq!(seq_total, par_total);
}

#[test]
fn size_equals_files_size_plus_children_sizes_at_every_level() {
    let dir = tempfile::tempdir().unwrap();
    layout(dir.path());

    let mut sizer = SequentialSizer::new();
    sizer.set_root(dir.path()).unwrap();
    sizer.run().unwrap();

    let tree = sizer.tree();
    let docs = tree.child(tree.root, "docs").unwrap();
    let images_size = tree.sorted_children(docs).iter().find(|(n, ..)| n == "images").unwrap().1;
    let docs_node = tree.node(docs);
    assert_eq!(docs_node.size, docs_node.files_size + images_size);
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_marks_ancestors_incomplete_without_failing_the_run() {
    if unsafe { geteuid() } == 0 {
        return;
    }
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    layout(dir.path());
    let locked = dir.path().join("src").join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::write(locked.join("secret"), vec![0u8; 10]).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    let mut sizer = SequentialSizer::new();
    sizer.set_root(dir.path()).unwrap();
    sizer.run().unwrap();

    assert!(sizer.tree().is_incomplete_recursive());
    let src = sizer.tree().child(sizer.tree().root, "src").unwrap();
    assert!(sizer.tree().is_incomplete_at(src));
    assert!(!sizer.tree().node(src).incomplete, "the flag on src itself stays local/false");

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn nonexistent_root_fails_fast_for_both_sizers() {
    let ghost = Path::new("/definitely/does/not/exist/anywhere");

    let mut sequential = SequentialSizer::new();
    assert!(matches!(sequential.set_root(ghost), Err(EngineError::RootNotFound(_))));

    let mut coordinator = Coordinator::new(fast_config());
    assert!(matches!(coordinator.set_root(ghost), Err(EngineError::RootNotFound(_))));
}

#[test]
fn navigator_walks_down_and_back_up_without_rescanning() {
    let dir = tempfile::tempdir().unwrap();
    layout(dir.path());

    let mut sizer = SequentialSizer::new();
    sizer.set_root(dir.path()).unwrap();
    sizer.run().unwrap();

    let mut nav = Navigator::new(sizer);
    assert_eq!(nav.current_dir_path(), dir.path());

    nav.cd(Some(Path::new("docs"))).unwrap();
    nav.cd(Some(Path::new("images"))).unwrap();
    assert_eq!(nav.current_dir_path(), dir.path().join("docs").join("images"));
    let (size, files_size, incomplete) = nav.current_summary();
    assert_eq!(size, 2_000);
    assert_eq!(files_size, 2_000);
    assert!(!incomplete);

    nav.cd(Some(Path::new(".."))).unwrap();
    nav.cd(Some(Path::new(".."))).unwrap();
    assert_eq!(nav.current_dir_path(), dir.path());
}

#[test]
fn navigator_cdi_picks_the_largest_child_first() {
    let dir = tempfile::tempdir().unwrap();
    layout(dir.path());

    let mut sizer = SequentialSizer::new();
    sizer.set_root(dir.path()).unwrap();
    sizer.run().unwrap();

    let mut nav = Navigator::new(sizer);
    // docs (2040 bytes) outweighs src (800) and top.bin isn't a directory.
    nav.cdi(Some(0)).unwrap();
    assert_eq!(nav.current_dir_path(), dir.path().join("docs"));
}

#[cfg(unix)]
extern "C" {
    fn geteuid() -> u32;
}
