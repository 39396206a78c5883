//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use cairn::clock::ManualClock;
use cairn::config::CatalogConfig;
use cairn::index::IndexStore;
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

/// Run the cairn binary in the specified directory
pub fn run_cairn_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cairn"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cairn binary")
}

/// A fixed starting instant for manual clocks.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// A store over `root` with default config and a manual clock.
pub fn store_with_clock(root: &Path) -> (IndexStore, ManualClock) {
    let clock = ManualClock::new(epoch());
    let store = IndexStore::with_clock(root, CatalogConfig::default(), Arc::new(clock.clone()));
    (store, clock)
}

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Front-matter record text with the given header lines.
pub fn record(id: &str, title: &str, extra_header: &[&str]) -> String {
    let mut text = format!("---\nid: {id}\ntitle: {title}\n");
    for line in extra_header {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("---\n\nBody text.\n");
    text
}

/// Write `<dir>/<id>.md` for an item type directory.
pub fn write_record(root: &Path, dir: &str, id: &str, extra_header: &[&str]) -> PathBuf {
    write_file(root, &format!("{dir}/{id}.md"), &record(id, &format!("Title {id}"), extra_header))
}

/// Bytes of the persisted index file.
pub fn index_bytes(store: &IndexStore) -> Vec<u8> {
    std::fs::read(store.index_path()).expect("index file should exist")
}
