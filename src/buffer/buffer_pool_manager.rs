//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Automatic dirty page write-back
//! - LRU-K victim selection

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::buffer::replacer::{AccessType, LruKReplacer};
use crate::buffer::{BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// State guarded by the pool latch.
///
/// Everything that must stay mutually consistent - the page table, the free
/// list, and the replacer - lives behind one mutex, so no interleaving can
/// observe a frame that is both free and mapped, or pinned yet evictable.
struct PoolState {
    /// Maps page IDs to frame IDs.
    page_table: HashMap<PageId, FrameId>,

    /// Stack of free frame IDs (LIFO for cache locality).
    free_list: Vec<FrameId>,

    /// Eviction policy for selecting victim frames.
    replacer: LruKReplacer,
}

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌───────────────────────────────┐  ┌───────────────────┐   │
/// │  │ latch: Mutex<PoolState>       │  │ frames: Vec<Frame>│   │
/// │  │  page_table: PageId → FrameId │─▶│ [F0] [F1] [F2] …  │   │
/// │  │  free_list:  Vec<FrameId>     │  └───────────────────┘   │
/// │  │  replacer:   LruKReplacer     │  ┌───────────────────┐   │
/// │  └───────────────────────────────┘  │ disk_manager      │   │
/// │  ┌──────────────┐ ┌──────────────┐  │    Mutex          │   │
/// │  │ next_page_id │ │    stats     │  └───────────────────┘   │
/// │  └──────────────┘ └──────────────┘                          │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `latch`: one mutex serializes every pool operation for its full
///   duration, disk I/O included. Hoisting I/O out of the critical section
///   is possible but not done here.
/// - `frames`: no outer lock - fixed size, each Frame has internal locks.
///   The per-frame data latch is what guards actually hold; the pool latch
///   is released before a guard is handed to the caller, so user reads and
///   writes never run under it.
/// - `next_page_id` / `stats`: atomics.
///
/// Lock ordering: a thread holding a frame's data latch never takes the pool
/// latch (guards release the data latch first, then unpin). The eviction and
/// flush paths take frame data latches while holding the pool latch, which is
/// safe because those latches are uncontended for any unpinned frame.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, 2, dm);
///
/// // Allocate a new page
/// let mut guard = bpm.new_page()?;
/// guard.as_mut_slice()[0] = 0xAB;
/// // guard drops: page marked dirty, unpinned
///
/// // Fetch existing page for reading
/// let guard = bpm.fetch_page_read(PageId::new(0))?;
/// let data = guard.as_slice();
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// The pool latch; see [`PoolState`].
    latch: Mutex<PoolState>,

    /// Handles all disk I/O.
    disk_manager: Mutex<DiskManager>,

    /// Monotonic page id allocator. Ids are never reused.
    next_page_id: AtomicU32,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Arguments
    /// * `pool_size` - Number of frames in the pool
    /// * `replacer_k` - History depth for the LRU-K replacer
    /// * `disk_manager` - Handles disk I/O
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, replacer_k: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        // Allocate all frames upfront
        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();

        // All frames start on the free list (LIFO order)
        let free_list: Vec<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            latch: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                replacer: LruKReplacer::new(pool_size, replacer_k),
            }),
            disk_manager: Mutex::new(disk_manager),
            next_page_id: AtomicU32::new(0),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Allocate and create pages
    // ========================================================================

    /// Hand out the next page id.
    ///
    /// Ids increase monotonically and are never reused. This does not touch
    /// the pool: the page gets a frame only when it is first fetched.
    pub fn allocate_page_id(&self) -> PageId {
        PageId::new(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate a new page and load it into the buffer pool.
    ///
    /// The new page is zeroed, pinned, and returned behind a write guard.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if every frame is pinned
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        let mut state = self.latch.lock();

        // Get a free frame (or evict one)
        let frame_id = self.acquire_frame(&mut state)?;

        let page_id = self.allocate_page_id();

        // Set up the frame
        let frame = &self.frames[frame_id.0];
        frame.page_mut().reset();
        frame.set_page_id(Some(page_id));

        // New page starts with pin_count = 1
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id, AccessType::Unknown);
        state.replacer.set_evictable(frame_id, false);

        drop(state);

        let lock = self.frames[frame_id.0].page_mut();
        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// If the page is already in the buffer pool, its frame is reused without
    /// touching disk. Otherwise the page image is loaded from disk, possibly
    /// evicting another page.
    ///
    /// # Errors
    /// - `Error::InvalidPageId` if `page_id` is the invalid sentinel
    /// - `Error::NoFreeFrames` if the page is absent and all frames are pinned
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page();

        Ok(PageReadGuard::new(self, frame_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// Same as `fetch_page_read`, but returns an exclusive guard.
    /// The page is automatically marked dirty when the guard drops.
    ///
    /// # Errors
    /// - `Error::InvalidPageId` if `page_id` is the invalid sentinel
    /// - `Error::NoFreeFrames` if the page is absent and all frames are pinned
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// `fetch_page_read` for callers that treat exhaustion as a normal
    /// outcome rather than an error.
    pub fn checked_read_page(&self, page_id: PageId) -> Option<PageReadGuard<'_>> {
        self.fetch_page_read(page_id).ok()
    }

    /// `fetch_page_write` for callers that treat exhaustion as a normal
    /// outcome rather than an error.
    pub fn checked_write_page(&self, page_id: PageId) -> Option<PageWriteGuard<'_>> {
        self.fetch_page_write(page_id).ok()
    }

    // ========================================================================
    // Public API: Unpin
    // ========================================================================

    /// Unpin a page, optionally marking it dirty.
    ///
    /// Returns `false` if the page is not resident or is not pinned. The
    /// dirty flag is sticky: `is_dirty = false` never clears a flag set by an
    /// earlier writer; only a flush (or frame reuse after one) does.
    ///
    /// Guards call this on drop; callers holding a guard never need to call
    /// it themselves.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        if !page_id.is_valid() {
            return false;
        }

        let state = self.latch.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };

        let frame = &self.frames[frame_id.0];
        if !frame.is_pinned() {
            return false;
        }

        if is_dirty {
            frame.mark_dirty();
        }

        // If pin count dropped to 0, page is now evictable
        if frame.unpin() == 0 {
            state.replacer.set_evictable(frame_id, true);
        }

        true
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Write a page's frame to disk and clear its dirty flag.
    ///
    /// The write is unconditional - the dirty flag is not consulted - so a
    /// caller can force a clean page's image out as part of a checkpoint.
    /// Returns `Ok(false)` if the page is not resident.
    ///
    /// # Errors
    /// - I/O errors from disk write
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let state = self.latch.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(false);
        };

        self.flush_frame(frame_id, page_id)?;
        Ok(true)
    }

    /// Flush every resident page to disk.
    ///
    /// Runs under a single latch acquisition; the per-page flush is inlined
    /// rather than routed back through [`flush_page`](Self::flush_page).
    ///
    /// # Errors
    /// - I/O errors from disk writes
    pub fn flush_all_pages(&self) -> Result<()> {
        let state = self.latch.lock();

        debug!("flushing all {} resident pages", state.page_table.len());

        for (&page_id, &frame_id) in &state.page_table {
            self.flush_frame(frame_id, page_id)?;
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Delete pages
    // ========================================================================

    /// Delete a page from the buffer pool and deallocate its id.
    ///
    /// Returns `true` if the page is absent (idempotent) or was deleted;
    /// `false` if the page is pinned. Deleted pages are not written back -
    /// their contents are discarded.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.latch.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            // Page not in pool, nothing to do
            return true;
        };

        let frame = &self.frames[frame_id.0];

        // Can't delete a pinned page
        if frame.is_pinned() {
            return false;
        }

        state.page_table.remove(&page_id);
        state.replacer.remove(frame_id);
        state.free_list.push(frame_id);

        frame.reset();

        self.deallocate_page(page_id);
        true
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.latch.lock().free_list.len()
    }

    /// Get the number of pages in the buffer pool.
    pub fn page_count(&self) -> usize {
        self.latch.lock().page_table.len()
    }

    /// Get the pin count of a resident page, or `None` if not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.latch.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    /// Check whether a page is resident in the pool.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.latch.lock().page_table.contains_key(&page_id)
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    /// Fetch a page into the buffer pool, returning its frame ID pinned.
    fn fetch_page_internal(&self, page_id: PageId) -> Result<FrameId> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }

        let mut state = self.latch.lock();

        // Hit: the frame is reused as-is, never re-read from disk.
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id.0];
            frame.pin();

            state.replacer.record_access(frame_id, AccessType::Unknown);
            state.replacer.set_evictable(frame_id, false);

            self.stats.record_hit();
            return Ok(frame_id);
        }

        // Miss: load from disk
        self.stats.record_miss();

        let frame_id = self.acquire_frame(&mut state)?;

        let page_data = {
            let mut dm = self.disk_manager.lock();
            match dm.read_page(page_id) {
                Ok(page) => page,
                Err(e) => {
                    // The frame was taken off the free structures above; put
                    // it back so no frame is lost to a failed read.
                    state.free_list.push(frame_id);
                    return Err(e);
                }
            }
        };

        self.stats.record_disk_read();

        let frame = &self.frames[frame_id.0];

        // Copy page data into frame
        frame
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page_data.as_slice());

        frame.set_page_id(Some(page_id));
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id, AccessType::Unknown);
        state.replacer.set_evictable(frame_id, false);

        Ok(frame_id)
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get a usable frame: the free list first, then eviction.
    ///
    /// On eviction the victim's page is written back if dirty and its page
    /// table mapping is removed. The returned frame is empty and unpinned.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        // Try the free list first to avoid gratuitous eviction
        if let Some(frame_id) = state.free_list.pop() {
            return Ok(frame_id);
        }

        let Some(frame_id) = state.replacer.evict() else {
            return Err(Error::NoFreeFrames);
        };

        let frame = &self.frames[frame_id.0];

        // Get the page ID before we clear it
        let old_page_id = frame.page_id();

        trace!("evicting {:?} from {}", old_page_id, frame_id);

        // If dirty, flush to disk
        if frame.is_dirty() {
            if let Some(pid) = old_page_id {
                if let Err(e) = self.flush_frame(frame_id, pid) {
                    // The write-back failed, so the victim stays resident.
                    // `evict` already erased its replacer state; re-register
                    // the frame so every unpinned resident page remains
                    // visible to the replacer.
                    state.replacer.record_access(frame_id, AccessType::Unknown);
                    state.replacer.set_evictable(frame_id, true);
                    return Err(e);
                }
            }
        }

        // Remove from page table
        if let Some(pid) = old_page_id {
            state.page_table.remove(&pid);
        }

        // Reset frame state
        frame.clear_dirty();
        frame.set_page_id(None);

        self.stats.record_eviction();

        Ok(frame_id)
    }

    /// Write a frame's page to disk and clear the dirty flag.
    ///
    /// Called with the pool latch held.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];

        // Hold page read lock while writing to disk
        let page = frame.page();
        {
            let mut dm = self.disk_manager.lock();
            dm.write_page(page_id, &page)?;
        }
        drop(page);

        frame.clear_dirty();
        self.stats.record_disk_write();

        Ok(())
    }

    /// Release a page id back to the allocator.
    ///
    /// Ids are monotonic and never reused, so this is bookkeeping only; the
    /// page's slot in the file simply goes stale.
    fn deallocate_page(&self, page_id: PageId) {
        trace!("deallocated {}", page_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Helper to create a BPM with a temporary database file.
    fn create_test_bpm(pool_size: usize) -> (BufferPoolManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let dm = DiskManager::create(&path).unwrap();
        (BufferPoolManager::new(pool_size, 2, dm), dir)
    }

    /// Invariants that must hold between operations:
    /// every frame is free or mapped (never both), and the replacer's
    /// evictable count matches the number of unpinned resident pages.
    fn check_invariants(bpm: &BufferPoolManager) {
        let state = bpm.latch.lock();

        assert_eq!(
            state.free_list.len() + state.page_table.len(),
            bpm.pool_size
        );

        for frame_id in &state.free_list {
            assert!(!state.page_table.values().any(|fid| fid == frame_id));
        }

        let unpinned_resident = state
            .page_table
            .values()
            .filter(|fid| bpm.frames[fid.0].pin_count() == 0)
            .count();
        assert_eq!(unpinned_resident, state.replacer.size());
    }

    #[test]
    fn test_new_page() {
        let (bpm, _dir) = create_test_bpm(10);

        let guard = bpm.new_page().unwrap();
        assert_eq!(guard.page_id(), PageId::new(0));
        drop(guard);

        let guard = bpm.new_page().unwrap();
        assert_eq!(guard.page_id(), PageId::new(1));
        drop(guard);

        check_invariants(&bpm);
    }

    #[test]
    fn test_allocate_page_id_monotonic() {
        let (bpm, _dir) = create_test_bpm(10);

        let a = bpm.allocate_page_id();
        let b = bpm.allocate_page_id();
        let guard = bpm.new_page().unwrap();

        assert!(a < b);
        assert!(b < guard.page_id());
    }

    #[test]
    fn test_fetch_page_read() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create a page and write data
        {
            let mut guard = bpm.new_page().unwrap();
            guard.as_mut_slice()[0] = 0xAB;
        }

        // Fetch and verify
        {
            let guard = bpm.fetch_page_read(PageId::new(0)).unwrap();
            assert_eq!(guard.as_slice()[0], 0xAB);
        }

        check_invariants(&bpm);
    }

    #[test]
    fn test_fetch_page_write() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create a page
        {
            let _guard = bpm.new_page().unwrap();
        }

        // Fetch for write and modify
        {
            let mut guard = bpm.fetch_page_write(PageId::new(0)).unwrap();
            guard.as_mut_slice()[0] = 0xCD;
        }

        // Verify modification
        {
            let guard = bpm.fetch_page_read(PageId::new(0)).unwrap();
            assert_eq!(guard.as_slice()[0], 0xCD);
        }
    }

    #[test]
    fn test_fetch_invalid_page_id() {
        let (bpm, _dir) = create_test_bpm(10);

        assert!(matches!(
            bpm.fetch_page_read(PageId::INVALID),
            Err(Error::InvalidPageId(_))
        ));
        assert!(bpm.checked_write_page(PageId::INVALID).is_none());
    }

    #[test]
    fn test_cache_hit_reads_no_disk() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create a page
        {
            let _guard = bpm.new_page().unwrap();
        }

        // Fetch multiple times - should be cache hits with no disk reads
        {
            let _guard = bpm.fetch_page_read(PageId::new(0)).unwrap();
        }
        {
            let _guard = bpm.fetch_page_read(PageId::new(0)).unwrap();
        }

        let snapshot = bpm.stats().snapshot();
        assert!(snapshot.cache_hits >= 2);
        assert_eq!(snapshot.pages_read, 0);
    }

    #[test]
    fn test_eviction() {
        let (bpm, _dir) = create_test_bpm(3); // Small pool

        // Fill the pool
        for _ in 0..3 {
            let _guard = bpm.new_page().unwrap();
        }

        // All frames used, free list empty
        assert_eq!(bpm.free_frame_count(), 0);

        // Create one more page (forces eviction)
        let guard = bpm.new_page().unwrap();
        assert_eq!(guard.page_id(), PageId::new(3));
        drop(guard);

        let snapshot = bpm.stats().snapshot();
        assert_eq!(snapshot.evictions, 1);

        check_invariants(&bpm);
    }

    #[test]
    fn test_dirty_page_flushed_on_eviction() {
        let (bpm, _dir) = create_test_bpm(1); // Only 1 frame!

        // Create page 0 and write data
        {
            let mut guard = bpm.new_page().unwrap();
            guard.as_mut_slice()[0] = 0x42;
        } // Drops, marks dirty

        assert_eq!(bpm.stats().snapshot().pages_written, 0);

        // Create page 1 (evicts page 0, should flush first)
        {
            let _guard = bpm.new_page().unwrap();
        }

        assert_eq!(bpm.stats().snapshot().pages_written, 1);

        // Fetch page 0 again (should load from disk with our data)
        {
            let guard = bpm.fetch_page_read(PageId::new(0)).unwrap();
            assert_eq!(guard.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_clean_page_not_written_on_eviction() {
        let (bpm, _dir) = create_test_bpm(1);

        let pid = bpm.allocate_page_id();

        // Read-only residency: the frame never becomes dirty.
        {
            let _guard = bpm.fetch_page_read(pid).unwrap();
        }

        // Evict it by bringing in another page.
        {
            let _guard = bpm.fetch_page_read(bpm.allocate_page_id()).unwrap();
        }

        assert_eq!(bpm.stats().snapshot().pages_written, 0);
    }

    #[test]
    fn test_delete_page() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create a page
        {
            let _guard = bpm.new_page().unwrap();
        }

        assert_eq!(bpm.page_count(), 1);

        // Delete it
        assert!(bpm.delete_page(PageId::new(0)));

        // Frame should be back on free list
        assert_eq!(bpm.free_frame_count(), 10);
        assert_eq!(bpm.page_count(), 0);

        check_invariants(&bpm);
    }

    #[test]
    fn test_delete_absent_page_is_idempotent() {
        let (bpm, _dir) = create_test_bpm(10);
        assert!(bpm.delete_page(PageId::new(99)));
    }

    #[test]
    fn test_delete_pinned_page_fails() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create and hold a page
        let _guard = bpm.new_page().unwrap();

        // Try to delete while pinned - should be refused
        assert!(!bpm.delete_page(PageId::new(0)));
    }

    #[test]
    fn test_unpin_absent_or_unpinned() {
        let (bpm, _dir) = create_test_bpm(10);

        assert!(!bpm.unpin_page(PageId::INVALID, false));
        assert!(!bpm.unpin_page(PageId::new(3), false));

        // Create a page; guard drop brings the pin count to zero.
        {
            let _guard = bpm.new_page().unwrap();
        }
        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(0));

        // A second unpin must be refused.
        assert!(!bpm.unpin_page(PageId::new(0), false));
    }

    #[test]
    fn test_flush_page() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create and modify a page
        {
            let mut guard = bpm.new_page().unwrap();
            guard.as_mut_slice()[0] = 0xFF;
        }

        // Explicitly flush
        assert!(bpm.flush_page(PageId::new(0)).unwrap());

        let snapshot = bpm.stats().snapshot();
        assert!(snapshot.pages_written >= 1);

        // Non-resident pages report false
        assert!(!bpm.flush_page(PageId::new(77)).unwrap());
    }

    #[test]
    fn test_flush_clears_dirty_flag() {
        let (bpm, _dir) = create_test_bpm(1);

        {
            let mut guard = bpm.new_page().unwrap();
            guard.as_mut_slice()[0] = 0xEE;
        }

        assert!(bpm.flush_page(PageId::new(0)).unwrap());
        assert_eq!(bpm.stats().snapshot().pages_written, 1);

        // Eviction of the now-clean page must not write again.
        {
            let _guard = bpm.new_page().unwrap();
        }
        assert_eq!(bpm.stats().snapshot().pages_written, 1);
    }

    #[test]
    fn test_flush_writes_even_when_clean() {
        let (bpm, _dir) = create_test_bpm(10);

        let pid = bpm.allocate_page_id();
        {
            let _guard = bpm.fetch_page_read(pid).unwrap();
        }

        // Page is resident and clean; flush still issues the write.
        assert!(bpm.flush_page(pid).unwrap());
        assert_eq!(bpm.stats().snapshot().pages_written, 1);
    }

    #[test]
    fn test_flush_all_pages() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create multiple dirty pages
        for i in 0..5 {
            let mut guard = bpm.new_page().unwrap();
            guard.as_mut_slice()[0] = i;
        }

        // Flush all
        bpm.flush_all_pages().unwrap();

        let snapshot = bpm.stats().snapshot();
        assert!(snapshot.pages_written >= 5);
    }

    #[test]
    fn test_multiple_read_guards() {
        let (bpm, _dir) = create_test_bpm(10);

        // Create a page
        {
            let _guard = bpm.new_page().unwrap();
        }

        // Multiple simultaneous read guards should work
        let guard1 = bpm.fetch_page_read(PageId::new(0)).unwrap();
        let guard2 = bpm.fetch_page_read(PageId::new(0)).unwrap();

        assert_eq!(guard1.page_id(), guard2.page_id());
        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(2));

        drop(guard1);
        drop(guard2);

        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(0));
    }

    #[test]
    fn test_no_free_frames() {
        let (bpm, _dir) = create_test_bpm(2);

        // Pin both frames (hold the guards)
        let _guard1 = bpm.new_page().unwrap();
        let _guard2 = bpm.new_page().unwrap();

        // All frames pinned, can't allocate
        assert!(matches!(bpm.new_page(), Err(Error::NoFreeFrames)));
        check_invariants(&bpm);
    }

    #[test]
    fn test_pin_count_tracking() {
        let (bpm, _dir) = create_test_bpm(10);

        {
            let _guard = bpm.new_page().unwrap();
            assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(1));
        }

        // Guard dropped - unpinned, evictable
        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(0));
        check_invariants(&bpm);

        // Fetch again - pins it
        let guard = bpm.fetch_page_read(PageId::new(0)).unwrap();
        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(1));
        check_invariants(&bpm);

        drop(guard);
        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(0));
    }

    #[test]
    fn test_concurrent_reads() {
        use std::sync::Arc;
        use std::thread;

        let (bpm, _dir) = create_test_bpm(10);
        let bpm = Arc::new(bpm);

        // Create a page
        {
            let mut guard = bpm.new_page().unwrap();
            guard.as_mut_slice()[0] = 0x42;
        }

        let mut handles = vec![];

        // Multiple threads reading the same page
        for _ in 0..10 {
            let bpm_clone = Arc::clone(&bpm);
            handles.push(thread::spawn(move || {
                let guard = bpm_clone.fetch_page_read(PageId::new(0)).unwrap();
                assert_eq!(guard.as_slice()[0], 0x42);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        check_invariants(&bpm);
    }
}
