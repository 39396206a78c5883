//! The catalog index.
//!
//! The index is a derived, queryable projection of every record file under a
//! catalog root. It is persisted as a single JSON document, cached in
//! process, and kept current either by full rebuilds or by single-record
//! patches.
//!
//! # Architecture
//!
//! - [`model`]: the persisted document ([`Index`], [`IndexEntry`])
//! - [`graph`]: derived parent/child lists
//! - [`dependencies`]: cycle, blocker and dangling-reference analysis
//! - [`cache`]: the TTL cache with digest revalidation
//! - [`store`]: [`IndexStore`], the file-backed [`Catalog`] implementation
//! - [`overview`]: catalog-wide statistics
//!
//! # Example
//!
//! ```no_run
//! use cairn::domain::{ItemId, ItemType};
//! use cairn::index::{Catalog, IndexStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = IndexStore::open(".").await?;
//!     store.update_item(ItemType::Issue, &ItemId::new("ISS-1")).await?;
//!     for entry in store.by_type(ItemType::Issue).await? {
//!         println!("{} {}", entry.id, entry.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod dependencies;
pub mod graph;
pub mod model;
pub mod overview;
pub mod store;

pub use catalog::{Catalog, LoadSource, Loaded, UpdateOutcome};
pub use dependencies::{BlockedItem, DanglingLink, blocked_items, dangling_links, dependency_cycles};
pub use model::{BuildInfo, BuildKind, Children, INDEX_VERSION, Index, IndexEntry, IndexStats, TypeCounts};
pub use overview::{Activity, Overview, RECENT_ACTIVITY_DAYS, TypeSummary};
pub use store::{CacheMetrics, IndexStore, PendingSave};
