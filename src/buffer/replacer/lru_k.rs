//! LRU-K replacement policy.
//!
//! LRU-K evicts the frame whose k-th most recent access lies furthest in the
//! past (largest "backward k-distance"). Frames with fewer than `k` recorded
//! accesses have infinite k-distance and are evicted first, oldest access
//! first, which is classical LRU among themselves. Compared to plain LRU this
//! keeps a single sequential scan from flushing frequently re-referenced
//! pages.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::FrameId;

use super::AccessType;

/// Per-frame bookkeeping: a bounded access history plus the evictable flag.
struct LruKNode {
    /// Timestamps of the most recent accesses, oldest first. At most `k`
    /// entries are retained, so `history.front()` is the k-th most recent
    /// access once the frame has been touched `k` times.
    history: VecDeque<u64>,

    /// Whether the frame may be chosen as a victim (pin count is zero).
    is_evictable: bool,
}

struct LruKState {
    node_store: HashMap<FrameId, LruKNode>,

    /// Logical clock, bumped on every recorded access.
    current_timestamp: u64,

    /// Number of evictable frames (cached so `size` is O(1)).
    curr_size: usize,
}

/// An LRU-K eviction policy over a fixed range of frame ids.
///
/// The replacer tracks accesses to frames `0..num_frames` and selects
/// eviction victims among the frames currently marked evictable.
///
/// # Thread Safety
/// Internally synchronized with its own mutex. The buffer pool already
/// serializes calls under its latch, but the replacer is a standalone
/// component and must remain correct in isolation.
pub struct LruKReplacer {
    state: Mutex<LruKState>,
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    /// Create a replacer tracking frames `0..num_frames` with history depth `k`.
    ///
    /// # Panics
    /// Panics if `k` is 0 (a zero-length history cannot order anything).
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "history depth k must be > 0");

        Self {
            state: Mutex::new(LruKState {
                node_store: HashMap::new(),
                current_timestamp: 0,
                curr_size: 0,
            }),
            num_frames,
            k,
        }
    }

    /// Record an access to a frame at the current timestamp.
    ///
    /// Creates the frame's node on first access. Only the `k` most recent
    /// timestamps are retained.
    ///
    /// # Panics
    /// Panics if `frame_id` is outside `0..num_frames` - the caller handed us
    /// a frame this pool does not have, which is a bug, not a runtime
    /// condition.
    pub fn record_access(&self, frame_id: FrameId, _access_type: AccessType) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();

        let ts = state.current_timestamp;
        let k = self.k;
        let node = state.node_store.entry(frame_id).or_insert_with(|| LruKNode {
            history: VecDeque::with_capacity(k),
            is_evictable: false,
        });

        node.history.push_back(ts);
        if node.history.len() > k {
            node.history.pop_front();
        }

        state.current_timestamp += 1;
    }

    /// Toggle whether a frame may be evicted.
    ///
    /// Frames the replacer has never seen are silently ignored.
    ///
    /// # Panics
    /// Panics if `frame_id` is outside `0..num_frames`.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();

        let Some(node) = state.node_store.get_mut(&frame_id) else {
            return;
        };

        if node.is_evictable != evictable {
            node.is_evictable = evictable;
            if evictable {
                state.curr_size += 1;
            } else {
                state.curr_size -= 1;
            }
        }
    }

    /// Drop all state for a frame.
    ///
    /// Called when a page is deleted from the buffer pool. Frames the
    /// replacer has never seen are silently ignored.
    ///
    /// # Panics
    /// Panics if `frame_id` is outside `0..num_frames`.
    pub fn remove(&self, frame_id: FrameId) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();

        if let Some(node) = state.node_store.remove(&frame_id) {
            if node.is_evictable {
                state.curr_size -= 1;
            }
        }
    }

    /// Select a victim frame, erase its state, and return it.
    ///
    /// Returns `None` when no frame is evictable. Frames with fewer than `k`
    /// recorded accesses (infinite k-distance) are preferred over frames with
    /// a full history; ties among them go to the oldest earliest access. With
    /// a full history the victim is the frame whose oldest retained timestamp
    /// is smallest, i.e. whose k-th most recent access is furthest in the
    /// past.
    pub fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock();

        if state.curr_size == 0 {
            return None;
        }

        // Candidate with fewer than k accesses, oldest first access wins.
        let mut inf_victim: Option<(FrameId, u64)> = None;
        // Candidate with a full history, oldest k-th-recent access wins.
        let mut finite_victim: Option<(FrameId, u64)> = None;

        for (&frame_id, node) in &state.node_store {
            if !node.is_evictable {
                continue;
            }

            // The clock is bumped per access, so `first` values are unique
            // across frames and a strict comparison is deterministic.
            let first = *node.history.front().expect("tracked frame has no history");
            if node.history.len() < self.k {
                if inf_victim.map_or(true, |(_, oldest)| first < oldest) {
                    inf_victim = Some((frame_id, first));
                }
            } else if finite_victim.map_or(true, |(_, oldest)| first < oldest) {
                finite_victim = Some((frame_id, first));
            }
        }

        let (victim, _) = inf_victim.or(finite_victim)?;

        state.node_store.remove(&victim);
        state.curr_size -= 1;

        Some(victim)
    }

    /// Number of currently evictable frames.
    pub fn size(&self) -> usize {
        self.state.lock().curr_size
    }

    #[inline]
    fn check_frame_id(&self, frame_id: FrameId) {
        assert!(
            frame_id.0 < self.num_frames,
            "frame id {} out of range for replacer of {} frames",
            frame_id.0,
            self.num_frames
        );
    }
}
