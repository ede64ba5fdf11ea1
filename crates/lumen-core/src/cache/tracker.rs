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

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::cache::RefCount;

/// A shared object whose owners are counted.
pub trait Tracked: Send + Sync + 'static {
    /// The object's owner count.
    fn ref_count(&self) -> &RefCount;
}

/// Called once with every object whose last owner was released.
pub type DeleteCallback<T> = Box<dyn Fn(&[Arc<T>]) + Send + Sync>;

/// Records the shared objects one owner links to.
///
/// Attaching links the object once, however often it is attached. On
/// [`release`](ObjectTracker::release) every attached object is unlinked and
/// the ones left without owners are handed to the delete callback in a
/// single batch.
///
/// The lock is re-entrant so the callback may call back into code that
/// inspects this tracker.
pub struct ObjectTracker<T: Tracked> {
    attached: ReentrantMutex<RefCell<Vec<Arc<T>>>>,
    on_delete: DeleteCallback<T>,
}

impl<T: Tracked> ObjectTracker<T> {
    /// Creates an empty tracker.
    pub fn new(on_delete: impl Fn(&[Arc<T>]) + Send + Sync + 'static) -> Self {
        Self {
            attached: ReentrantMutex::new(RefCell::new(Vec::new())),
            on_delete: Box::new(on_delete),
        }
    }

    /// Links `object` to this owner. Returns `false` if it was already attached.
    pub fn attach(&self, object: &Arc<T>) -> bool {
        let guard = self.attached.lock();
        let mut attached = guard.borrow_mut();
        if attached.iter().any(|o| Arc::ptr_eq(o, object)) {
            return false;
        }
        object.ref_count().link();
        attached.push(Arc::clone(object));
        true
    }

    /// Unlinks every attached object and reports the orphaned ones.
    ///
    /// Calling it again without new attachments does nothing.
    pub fn release(&self) {
        let guard = self.attached.lock();
        let attached = std::mem::take(&mut *guard.borrow_mut());
        if attached.is_empty() {
            return;
        }

        let orphans: Vec<Arc<T>> = attached
            .into_iter()
            .filter(|object| object.ref_count().unlink() == 0)
            .collect();

        if !orphans.is_empty() {
            (self.on_delete)(&orphans);
        }
    }

    /// Returns `true` if `object` is attached.
    pub fn contains(&self, object: &Arc<T>) -> bool {
        let guard = self.attached.lock();
        let attached = guard.borrow();
        attached.iter().any(|o| Arc::ptr_eq(o, object))
    }

    /// Number of attached objects.
    pub fn len(&self) -> usize {
        self.attached.lock().borrow().len()
    }

    /// Returns `true` if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Tracked> Drop for ObjectTracker<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Tracked> fmt::Debug for ObjectTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTracker")
            .field("attached", &self.len())
            .finish()
    }
}
