//! ferritedb - a teaching storage kernel.
//!
//! # Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        ferritedb                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │          Versioned KV (trie/)                      │  │
//! │  │   Copy-on-write trie, Arc-shared immutable nodes   │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │          Buffer Pool (buffer/)                     │  │
//! │  │   BufferPoolManager + Frame + LRU-K eviction       │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                             ↓                            │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │          Storage Layer (storage/)                  │  │
//! │  │          DiskManager + Page                        │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The two subsystems are independent: the buffer pool caches fixed-size
//! disk pages in a bounded set of memory frames, while the trie is a purely
//! in-memory persistent map where every mutation returns a new version
//! sharing unchanged subtrees with its predecessors.
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and LRU-K eviction
//! - [`storage`] - Disk I/O and the raw page type
//! - [`trie`] - Copy-on-write trie
//!
//! # Quick Start
//! ```no_run
//! use ferritedb::storage::DiskManager;
//! use ferritedb::buffer::BufferPoolManager;
//!
//! // Create a new database file backed by a 10-frame pool
//! let dm = DiskManager::create("my_database.db").unwrap();
//! let bpm = BufferPoolManager::new(10, 2, dm);
//!
//! // Allocate a page and write into it
//! let mut guard = bpm.new_page().unwrap();
//! guard.as_mut_slice()[0] = 0xAB;
//! ```

pub mod buffer;
pub mod common;
pub mod storage;
pub mod trie;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::replacer::{AccessType, LruKReplacer};
pub use buffer::{BufferPoolManager, BufferPoolStats, Frame, StatsSnapshot};
pub use storage::page::Page;
pub use storage::DiskManager;
pub use trie::{Trie, TrieNode};
