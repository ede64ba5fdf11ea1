// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use crate::cache::{
    CacheError, CacheObserver, CacheStats, CacheStatsSnapshot, Description, ObjectTracker,
    RefCount, Tracked,
};
use crate::renderer::traits::GpuBackend;

/// A backend object stored in a [`ContentAddressedCache`] with the description it was built from.
pub struct CachedObject<D: Description> {
    description: D,
    hash: u64,
    object: D::Object,
    label: String,
    refs: RefCount,
    // Set when `clear` destroyed the object while owners still linked it.
    cleared: AtomicBool,
}

impl<D: Description> CachedObject<D> {
    /// Backend handle.
    pub fn object(&self) -> D::Object {
        self.object
    }

    /// The description the object was built from.
    pub fn description(&self) -> &D {
        &self.description
    }

    /// Cache key.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Label given on first acquisition.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of owners linked to the object.
    pub fn link_count(&self) -> i32 {
        self.refs.count()
    }

    /// Returns `true` if the object was force-destroyed by a cache clear.
    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::Acquire)
    }
}

impl<D: Description> Tracked for CachedObject<D> {
    fn ref_count(&self) -> &RefCount {
        &self.refs
    }
}

impl<D: Description> fmt::Debug for CachedObject<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedObject")
            .field("kind", &D::KIND)
            .field("label", &self.label)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("object", &self.object)
            .field("links", &self.refs.count())
            .finish()
    }
}

/// Tracker type used by owners of objects from a `ContentAddressedCache<D>`.
pub type CacheTracker<D> = ObjectTracker<CachedObject<D>>;

type Bucket<D> = Vec<Arc<CachedObject<D>>>;

/// Deduplicates immutable backend objects by description.
///
/// Entries are bucketed by [`Description::content_hash`] and matched by
/// equality, so colliding descriptions coexist. An object stays cached while
/// at least one tracker links to it.
pub struct ContentAddressedCache<D: Description> {
    backend: Arc<dyn GpuBackend>,
    table: Mutex<AHashMap<u64, Bucket<D>>>,
    observers: RwLock<Vec<Arc<dyn CacheObserver>>>,
    stats: CacheStats,
}

impl<D: Description> ContentAddressedCache<D> {
    /// Creates an empty cache allocating through `backend`.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            table: Mutex::new(AHashMap::new()),
            observers: RwLock::new(Vec::new()),
            stats: CacheStats::default(),
        }
    }

    /// Registers an observer for creation and removal events.
    pub fn add_observer(&self, observer: Arc<dyn CacheObserver>) {
        self.observers.write().push(observer);
    }

    /// Returns the object for `description`, allocating it on a miss, and
    /// attaches it to `tracker`.
    ///
    /// The flag is `true` when the object was created by this call. On
    /// allocation failure the cache is left exactly as it was.
    pub fn acquire(
        &self,
        description: &D,
        label: &str,
        tracker: &CacheTracker<D>,
    ) -> Result<(Arc<CachedObject<D>>, bool), CacheError> {
        let hash = description.content_hash();

        let (object, created) = {
            let mut table = self.table.lock();
            let bucket = table.entry(hash).or_default();

            if let Some(existing) = bucket.iter().find(|e| e.description == *description) {
                (Arc::clone(existing), false)
            } else {
                if !bucket.is_empty() {
                    log::debug!(
                        "{} hash {hash:#018x} collides with {} cached description(s)",
                        D::KIND,
                        bucket.len()
                    );
                    self.stats.record_collision();
                }

                match description.allocate(self.backend.as_ref(), label) {
                    Ok(handle) => {
                        let cached = Arc::new(CachedObject {
                            description: description.clone(),
                            hash,
                            object: handle,
                            label: label.to_owned(),
                            refs: RefCount::new(),
                            cleared: AtomicBool::new(false),
                        });
                        bucket.push(Arc::clone(&cached));
                        (cached, true)
                    }
                    Err(source) => {
                        if bucket.is_empty() {
                            table.remove(&hash);
                        }
                        drop(table);
                        self.stats.record_allocation_failure();
                        log::error!("Failed to allocate {} '{label}': {source}", D::KIND);
                        return Err(CacheError::AllocationFailed {
                            kind: D::KIND,
                            label: label.to_owned(),
                            source,
                        });
                    }
                }
            }
        };

        if created {
            self.stats.record_miss();
            for observer in self.observers.read().iter() {
                observer.on_object_created(D::KIND, hash, label);
            }
        } else {
            self.stats.record_hit();
        }

        tracker.attach(&object);
        Ok((object, created))
    }

    /// Removes `object` and destroys its backend object.
    ///
    /// Returns `Ok(false)` without touching the cache if owners are still
    /// linked. An object already destroyed by [`clear`](Self::clear) is
    /// reported as released. Releasing any other object that is not cached
    /// is a contract violation.
    pub fn release(&self, object: &Arc<CachedObject<D>>) -> Result<bool, CacheError> {
        let removed = {
            let mut table = self.table.lock();
            let position = table
                .get(&object.hash)
                .and_then(|bucket| bucket.iter().position(|e| Arc::ptr_eq(e, object)));

            let Some(position) = position else {
                drop(table);
                if object.is_cleared() {
                    log::warn!(
                        "{} '{}' was released after the cache was cleared",
                        D::KIND,
                        object.label
                    );
                    return Ok(true);
                }
                log::error!(
                    "Release of {} '{}' ({:#018x}) which is not cached",
                    D::KIND,
                    object.label,
                    object.hash
                );
                debug_assert!(false, "released a {} that is not cached", D::KIND);
                return Err(CacheError::NotCached {
                    kind: D::KIND,
                    hash: object.hash,
                });
            };

            if object.refs.is_linked() {
                log::warn!(
                    "{} '{}' still has {} owner(s), keeping it cached",
                    D::KIND,
                    object.label,
                    object.refs.count()
                );
                return Ok(false);
            }

            let mut emptied = false;
            let removed = table.get_mut(&object.hash).map(|bucket| {
                let removed = bucket.remove(position);
                emptied = bucket.is_empty();
                removed
            });
            if emptied {
                table.remove(&object.hash);
            }
            removed
        };

        if let Some(removed) = removed {
            self.destroy_entry(&removed);
        }
        Ok(true)
    }

    /// Destroys every cached object and returns how many were destroyed.
    ///
    /// Objects that still have owners are destroyed too, with a warning.
    pub fn clear(&self) -> usize {
        let drained: Vec<Arc<CachedObject<D>>> = {
            let mut table = self.table.lock();
            table.drain().flat_map(|(_, bucket)| bucket).collect()
        };

        for entry in &drained {
            entry.cleared.store(true, Ordering::Release);
            if entry.refs.is_linked() {
                log::warn!(
                    "Clearing {} '{}' with {} owner(s) still linked",
                    D::KIND,
                    entry.label,
                    entry.refs.count()
                );
            }
            self.destroy_entry(entry);
        }
        drained.len()
    }

    fn destroy_entry(&self, entry: &CachedObject<D>) {
        for observer in self.observers.read().iter() {
            observer.on_object_removed(D::KIND, entry.hash, &entry.label);
        }
        if let Err(e) = D::destroy(entry.object, self.backend.as_ref()) {
            log::error!("Failed to destroy {} '{}': {e}", D::KIND, entry.label);
        }
        self.stats.record_destroyed(1);
    }

    /// Returns the cached object for `description` without linking it.
    pub fn find(&self, description: &D) -> Option<Arc<CachedObject<D>>> {
        let table = self.table.lock();
        table
            .get(&description.content_hash())?
            .iter()
            .find(|e| e.description == *description)
            .cloned()
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.table.lock().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of hash buckets in use.
    pub fn bucket_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.len() as u64)
    }
}

impl<D: Description> Drop for ContentAddressedCache<D> {
    fn drop(&mut self) {
        if !self.table.get_mut().is_empty() {
            let count = self.clear();
            log::debug!("Destroyed {count} {} object(s) with the cache", D::KIND);
        }
    }
}

impl<D: Description> fmt::Debug for ContentAddressedCache<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAddressedCache")
            .field("kind", &D::KIND)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectKind;
    use crate::renderer::api::{SamplerDescription, SamplerFilter, SamplerWrap};
    use crate::renderer::error::ResourceError;
    use crate::testing::TestBackend;
    use std::sync::atomic::Ordering;

    type SamplerCache = ContentAddressedCache<SamplerDescription>;

    fn setup() -> (Arc<TestBackend>, Arc<SamplerCache>) {
        let backend = Arc::new(TestBackend::default());
        let cache = Arc::new(SamplerCache::new(backend.clone()));
        (backend, cache)
    }

    fn owner<D: Description>(cache: &Arc<ContentAddressedCache<D>>) -> CacheTracker<D> {
        let cache = Arc::clone(cache);
        ObjectTracker::new(move |objects: &[Arc<CachedObject<D>>]| {
            for object in objects {
                cache.release(object).unwrap();
            }
        })
    }

    /// Sampler-backed description whose hash always collides.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Colliding(SamplerDescription);

    impl Description for Colliding {
        type Object = crate::renderer::api::SamplerId;
        const KIND: ObjectKind = ObjectKind::Sampler;

        fn content_hash(&self) -> u64 {
            42
        }

        fn allocate(
            &self,
            backend: &dyn GpuBackend,
            label: &str,
        ) -> Result<Self::Object, ResourceError> {
            backend.create_sampler(&self.0, label)
        }

        fn destroy(object: Self::Object, backend: &dyn GpuBackend) -> Result<(), ResourceError> {
            backend.destroy_sampler(object)
        }
    }

    #[test]
    fn test_acquire_twice_allocates_once() {
        let (backend, cache) = setup();
        let tracker = owner(&cache);
        let desc = SamplerDescription::default().with_wrap(SamplerWrap::ClampToEdge);

        let (first, created_first) = cache.acquire(&desc, "clamp", &tracker).unwrap();
        let (second, created_second) = cache.acquire(&desc, "clamp", &tracker).unwrap();

        assert!(created_first);
        assert!(!created_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.created("sampler"), 1);
        assert_eq!(first.link_count(), 1);
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_colliding_descriptions_coexist() {
        let backend = Arc::new(TestBackend::default());
        let cache = Arc::new(ContentAddressedCache::<Colliding>::new(backend.clone()));
        let tracker = owner(&cache);

        let a = Colliding(SamplerDescription::default());
        let b = Colliding(SamplerDescription::default().with_filter(SamplerFilter::Nearest));

        let (obj_a, _) = cache.acquire(&a, "a", &tracker).unwrap();
        let (obj_b, created_b) = cache.acquire(&b, "b", &tracker).unwrap();

        assert!(created_b);
        assert_ne!(obj_a.object(), obj_b.object());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.bucket_count(), 1);
        assert_eq!(cache.stats().collisions, 1);

        let (again, created) = cache.acquire(&b, "b", &tracker).unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&again, &obj_b));
    }

    #[test]
    fn test_allocation_failure_leaves_cache_untouched() {
        let (backend, cache) = setup();
        let tracker = owner(&cache);
        backend.fail_allocations.store(true, Ordering::SeqCst);

        let result = cache.acquire(&SamplerDescription::default(), "broken", &tracker);

        assert!(matches!(
            result,
            Err(CacheError::AllocationFailed {
                kind: ObjectKind::Sampler,
                ..
            })
        ));
        assert!(cache.is_empty());
        assert_eq!(cache.bucket_count(), 0);
        assert!(tracker.is_empty());
        assert_eq!(cache.stats().allocation_failures, 1);

        backend.fail_allocations.store(false, Ordering::SeqCst);
        let (_, created) = cache
            .acquire(&SamplerDescription::default(), "fixed", &tracker)
            .unwrap();
        assert!(created);
    }

    #[test]
    fn test_object_survives_until_last_owner() {
        let (backend, cache) = setup();
        let owners: Vec<_> = (0..4).map(|_| owner(&cache)).collect();
        let desc = SamplerDescription::default();

        for tracker in &owners {
            cache.acquire(&desc, "shared", tracker).unwrap();
        }
        let object = cache.find(&desc).unwrap();
        assert_eq!(object.link_count(), 4);

        for tracker in &owners[..3] {
            tracker.release();
            assert_eq!(cache.len(), 1);
        }
        assert_eq!(object.link_count(), 1);
        assert_eq!(backend.live("sampler"), 1);

        owners[3].release();
        assert!(cache.is_empty());
        assert_eq!(backend.live("sampler"), 0);
        assert_eq!(cache.stats().destroyed, 1);
    }

    #[test]
    fn test_release_of_linked_object_is_refused() {
        let (backend, cache) = setup();
        let tracker = owner(&cache);
        let (object, _) = cache
            .acquire(&SamplerDescription::default(), "held", &tracker)
            .unwrap();

        assert_eq!(cache.release(&object), Ok(false));
        assert_eq!(cache.len(), 1);
        assert_eq!(backend.live("sampler"), 1);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "not cached"))]
    fn test_double_release_is_rejected() {
        let (_, cache) = setup();
        let tracker = owner(&cache);
        let (object, _) = cache
            .acquire(&SamplerDescription::default(), "once", &tracker)
            .unwrap();
        tracker.release();
        assert!(cache.is_empty());

        let result = cache.release(&object);
        assert!(matches!(result, Err(CacheError::NotCached { .. })));
    }

    #[test]
    fn test_clear_destroys_everything() {
        let (backend, cache) = setup();
        let tracker = owner(&cache);
        cache
            .acquire(&SamplerDescription::default(), "a", &tracker)
            .unwrap();
        cache
            .acquire(
                &SamplerDescription::default().with_wrap(SamplerWrap::MirroredRepeat),
                "b",
                &tracker,
            )
            .unwrap();

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(backend.live("sampler"), 0);

        // The leaked owner goes away after the clear without destroying twice.
        drop(tracker);
        assert_eq!(backend.live("sampler"), 0);
        assert_eq!(cache.stats().destroyed, 2);
    }

    #[test]
    fn test_release_after_clear_is_not_a_double_release() {
        let (backend, cache) = setup();
        let tracker = owner(&cache);
        let (object, _) = cache
            .acquire(&SamplerDescription::default(), "leaked", &tracker)
            .unwrap();
        cache.clear();

        assert!(object.is_cleared());
        assert!(matches!(cache.release(&object), Ok(true)));
        assert_eq!(backend.created("sampler"), 1);
        assert_eq!(cache.stats().destroyed, 1);
    }

    #[test]
    fn test_observer_sees_lifecycle() {
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder(Mutex<Vec<String>>);

        impl CacheObserver for Recorder {
            fn on_object_created(&self, kind: ObjectKind, _hash: u64, label: &str) {
                self.0.lock().unwrap().push(format!("+{kind} {label}"));
            }

            fn on_object_removed(&self, kind: ObjectKind, _hash: u64, label: &str) {
                self.0.lock().unwrap().push(format!("-{kind} {label}"));
            }
        }

        let (_, cache) = setup();
        let recorder = Arc::new(Recorder::default());
        cache.add_observer(recorder.clone());

        let tracker = owner(&cache);
        cache
            .acquire(&SamplerDescription::default(), "linear", &tracker)
            .unwrap();
        tracker.release();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["+sampler linear".to_string(), "-sampler linear".to_string()]
        );
    }
}
