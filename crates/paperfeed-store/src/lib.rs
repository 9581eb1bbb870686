//! paperfeed snapshot store
//!
//! Daily paper lists live on disk as JSON snapshots. The ingestion process
//! owns the *live* snapshot (`out/output.json`); this crate archives it once
//! per calendar day into `out/cache/YYYY-MM-DD_output.json` and serves reads
//! from either.
//!
//! # Example
//!
//! ```rust,no_run
//! use paperfeed_store::SnapshotCache;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = SnapshotCache::new("out/output.json", "out/cache");
//!     cache.ensure_today_cached().await?;
//!
//!     for entry in cache.list_dates().await? {
//!         println!("{} -> {}", entry.key, entry.display);
//!     }
//!     let snapshot = cache.load(None).await?;
//!     println!("{} papers", snapshot.len());
//!     Ok(())
//! }
//! ```

pub mod date_index;
pub mod error;
pub mod snapshot;

pub use date_index::{parse_date_param, DateEntry, DateIndex, DATE_FORMAT};
pub use error::{Result, StoreError};
pub use snapshot::{Snapshot, SnapshotCache, SnapshotSource};
