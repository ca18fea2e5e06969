use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

#[derive(Debug)]
struct Slot<V> {
    value: V,
    tick: AtomicU64,
}

/// Bounded key-value map with least-recently-used eviction.
///
/// Any access (lookup or write) refreshes an entry's recency. Lookups only
/// take the read lock and bump the entry's tick atomically; the recency heap
/// is touched on insert and eviction alone, so stale heap records are
/// validated lazily against the entry tick when an eviction candidate is
/// popped. Eviction guarantees bounded memory, not fairness.
#[derive(Debug)]
pub struct LruTable<K, V> {
    capacity: usize,
    clock: AtomicU64,
    entries: RwLock<HashMap<K, Slot<V>>>,
    order: Mutex<BinaryHeap<Reverse<(u64, K)>>>,
}

impl<K, V> LruTable<K, V>
where
    K: Copy + Eq + Ord + Hash,
    V: Copy,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
            order: Mutex::new(BinaryHeap::new()),
        }
    }

    fn next_tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn lookup(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap();
        let slot = entries.get(key)?;
        slot.tick.store(self.next_tick(), Ordering::Relaxed);
        Some(slot.value)
    }

    pub fn upsert(&self, key: K, value: V) {
        self.update_or_insert(key, |slot| *slot = value, || value);
    }

    /// Single logical read-modify-write: run `update` on the present value,
    /// or insert `insert()` after making room. Concurrent callers cannot
    /// interleave between the lookup and the write.
    pub fn update_or_insert<F, G>(&self, key: K, update: F, insert: G)
    where
        F: FnOnce(&mut V),
        G: FnOnce() -> V,
    {
        let mut entries = self.entries.write().unwrap();
        let tick = self.next_tick();
        if let Some(slot) = entries.get_mut(&key) {
            update(&mut slot.value);
            slot.tick.store(tick, Ordering::Relaxed);
            return;
        }

        if entries.len() >= self.capacity {
            self.evict_one(&mut entries);
        }
        entries.insert(
            key,
            Slot {
                value: insert(),
                tick: AtomicU64::new(tick),
            },
        );
        self.order.lock().unwrap().push(Reverse((tick, key)));
    }

    fn evict_one(&self, entries: &mut HashMap<K, Slot<V>>) {
        let mut order = self.order.lock().unwrap();
        while let Some(Reverse((tick, key))) = order.pop() {
            let Some(slot) = entries.get(&key) else {
                // Record for a key that was already evicted.
                continue;
            };
            let current = slot.tick.load(Ordering::Relaxed);
            if current == tick {
                entries.remove(&key);
                return;
            }
            // The entry was accessed after this record was made; file it
            // under its current tick and keep looking. Ticks cannot move
            // while the write lock is held, so this terminates.
            order.push(Reverse((current, key)));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
