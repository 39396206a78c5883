//! Property test: patching the index one record at a time, in any order and
//! whatever the file names, ends in the same entries and child lists as a
//! full rebuild.

use cairn::domain::{ItemId, ItemType};
use cairn::index::{Catalog, Index};
use proptest::prelude::*;
use tempfile::TempDir;

mod common;
use common::{record, store_with_clock, write_file};

/// One record to create: type, directory, id, header lines, file stem.
#[derive(Debug, Clone)]
struct Planned {
    item_type: ItemType,
    dir: &'static str,
    id: String,
    header: Vec<String>,
    stem: String,
}

/// File stem for a record: `<id>`, a slug after the id, or unrelated.
fn stem_for(id: &str, style: usize) -> String {
    match style {
        0 => id.to_string(),
        1 => format!("{id}-notes"),
        _ => format!("item-{id}"),
    }
}

fn catalog_strategy() -> impl Strategy<Value = Vec<Planned>> {
    (
        prop::collection::vec(prop::option::of(0..2usize), 1..4),
        prop::collection::vec((0..4usize, prop::option::of(0..5usize)), 0..5),
        prop::collection::vec((0..4usize, any::<bool>()), 0..3),
        prop::collection::vec(0..3usize, 16),
    )
        .prop_map(|(issues, tasks, prs, styles)| {
            let mut planned = vec![
                Planned {
                    item_type: ItemType::Project,
                    dir: "projects",
                    id: "P0".to_string(),
                    header: vec![],
                    stem: String::new(),
                },
                Planned {
                    item_type: ItemType::Epic,
                    dir: "epics",
                    id: "E0".to_string(),
                    header: vec!["projectId: P0".to_string()],
                    stem: String::new(),
                },
                Planned {
                    item_type: ItemType::Epic,
                    dir: "epics",
                    id: "E1".to_string(),
                    header: vec![],
                    stem: String::new(),
                },
            ];
            for (i, epic) in issues.iter().enumerate() {
                planned.push(Planned {
                    item_type: ItemType::Issue,
                    dir: "issues",
                    id: format!("I{i}"),
                    header: epic.iter().map(|e| format!("epicId: E{e}")).collect(),
                    stem: String::new(),
                });
            }
            // Issue and parent indices may point past the end: orphans.
            for (i, (issue, parent)) in tasks.iter().enumerate() {
                let mut header = vec![format!("issueId: I{issue}")];
                header.extend(parent.iter().map(|p| format!("parentTask: T{p}")));
                planned.push(Planned {
                    item_type: ItemType::Task,
                    dir: "tasks",
                    id: format!("T{i}"),
                    header,
                    stem: String::new(),
                });
            }
            for (i, (issue, with_epic)) in prs.iter().enumerate() {
                let mut header = vec![format!("issueId: I{issue}")];
                if *with_epic {
                    header.push("epicId: E1".to_string());
                }
                planned.push(Planned {
                    item_type: ItemType::Pr,
                    dir: "prs",
                    id: format!("PR{i}"),
                    header,
                    stem: String::new(),
                });
            }
            for (item, style) in planned.iter_mut().zip(styles) {
                item.stem = stem_for(&item.id, style);
            }
            planned
        })
}

fn shuffled_catalog() -> impl Strategy<Value = Vec<Planned>> {
    catalog_strategy().prop_flat_map(|planned| Just(planned).prop_shuffle())
}

fn same_entries(a: &Index, b: &Index) -> bool {
    ItemType::ALL.iter().all(|t| a.entries(*t) == b.entries(*t))
}

async fn incremental_then_rebuild(planned: &[Planned]) -> (Index, Index) {
    let temp = TempDir::new().unwrap();
    let (mut incremental, _clock) = store_with_clock(temp.path());
    // Start from an empty catalog so every record goes through the patch path.
    incremental.load().await.unwrap();

    for item in planned {
        let header: Vec<&str> = item.header.iter().map(String::as_str).collect();
        write_file(
            temp.path(),
            &format!("{}/{}.md", item.dir, item.stem),
            &record(&item.id, &format!("Title {}", item.id), &header),
        );
        incremental
            .update_item(item.item_type, &ItemId::new(&item.id))
            .await
            .unwrap();
    }
    let patched = (*incremental.load().await.unwrap().index).clone();

    let (mut full, _clock) = store_with_clock(temp.path());
    let rebuilt = (*full.rebuild_index().await.unwrap()).clone();

    (patched, rebuilt)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn incremental_updates_match_full_rebuild(planned in shuffled_catalog()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (patched, rebuilt) = runtime.block_on(incremental_then_rebuild(&planned));

        prop_assert_eq!(patched.len(), planned.len());
        prop_assert!(same_entries(&patched, &rebuilt), "patched: {:#?}\nrebuilt: {:#?}", patched, rebuilt);
    }
}
