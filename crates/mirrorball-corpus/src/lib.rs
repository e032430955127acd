//! SQLite corpus store for the Mirrorball pipeline.
//!
//! The store holds the raw lyrics corpus and ground-truth labels, and every
//! table the pipeline stages produce. Each write replaces its table
//! wholesale in a single transaction.
//!
//! ```
//! use mirrorball_corpus::store::CorpusStore;
//! use mirrorball_features::{LyricsRecord, TrackKey};
//!
//! let mut store = CorpusStore::open_in_memory()?;
//! store.append_lyrics(&[LyricsRecord {
//!     key: TrackKey::new("mirrorball", "Folklore"),
//!     lyrics: Some("[Verse 1]\nI want you to know".to_owned()),
//!     is_new_era: false,
//!     scraped_at: chrono::Utc::now(),
//! }])?;
//! assert_eq!(store.load_lyrics()?.len(), 1);
//! # Ok::<(), mirrorball_corpus::CorpusError>(())
//! ```

pub use self::{error::CorpusError, result::ResultRow, store::CorpusStore};

pub mod error;
pub mod files;
pub mod refetch;
pub mod result;
pub mod schema;
pub mod store;
