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

//! Typed resource slots shared between stages.
//!
//! A stage publishes a value under a [`ResourceKey`] and later stages read it
//! by the same key. Keys are types, so a misspelled or mistyped name is a
//! compile error rather than a lookup miss.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::stage::StageError;

/// How long a published value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceLifetime {
    /// Kept until republished or the table is cleared.
    Global,
    /// Dropped at the start of every frame.
    Frame,
}

/// A named, typed slot in a [`ResourceTable`].
pub trait ResourceKey: 'static {
    /// Type stored in the slot.
    type Value: Clone + Send + Sync + 'static;
    /// Name used in logs and errors.
    const NAME: &'static str;
    /// Lifetime of published values.
    const LIFETIME: ResourceLifetime;
}

/// Declares marker types implementing [`ResourceKey`].
///
/// ```rust,ignore
/// declare_resource_key! {
///     /// Lit scene color.
///     pub SceneColor: TextureId = "scene_color", Global;
/// }
/// ```
#[macro_export]
macro_rules! declare_resource_key {
    ($($(#[$meta:meta])* $vis:vis $name:ident : $value:ty = $label:literal, $lifetime:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            $vis struct $name;

            impl $crate::stage::ResourceKey for $name {
                type Value = $value;
                const NAME: &'static str = $label;
                const LIFETIME: $crate::stage::ResourceLifetime =
                    $crate::stage::ResourceLifetime::$lifetime;
            }
        )+
    };
}

/// Type-erased identity of a [`ResourceKey`], used in stage declarations.
#[derive(Clone, Copy)]
pub struct ResourceSlot {
    id: TypeId,
    name: &'static str,
    lifetime: ResourceLifetime,
}

impl ResourceSlot {
    /// The slot of key `K`.
    pub fn of<K: ResourceKey>() -> Self {
        Self {
            id: TypeId::of::<K>(),
            name: K::NAME,
            lifetime: K::LIFETIME,
        }
    }

    /// Name of the key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Lifetime of the key.
    pub fn lifetime(&self) -> ResourceLifetime {
        self.lifetime
    }
}

impl PartialEq for ResourceSlot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceSlot {}

impl std::hash::Hash for ResourceSlot {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ResourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceSlot({}, {:?})", self.name, self.lifetime)
    }
}

type Entry = Box<dyn Any + Send + Sync>;

/// Values published by stages, keyed by [`ResourceKey`] type.
#[derive(Default)]
pub struct ResourceTable {
    global: HashMap<TypeId, Entry>,
    frame: HashMap<TypeId, Entry>,
}

impl ResourceTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, lifetime: ResourceLifetime) -> &HashMap<TypeId, Entry> {
        match lifetime {
            ResourceLifetime::Global => &self.global,
            ResourceLifetime::Frame => &self.frame,
        }
    }

    /// Publishes `value` under `K`, replacing any previous value.
    pub fn publish<K: ResourceKey>(&mut self, value: K::Value) {
        let map = match K::LIFETIME {
            ResourceLifetime::Global => &mut self.global,
            ResourceLifetime::Frame => &mut self.frame,
        };
        map.insert(TypeId::of::<K>(), Box::new(value));
    }

    /// Returns the value published under `K`.
    pub fn get<K: ResourceKey>(&self) -> Option<&K::Value> {
        self.map(K::LIFETIME)
            .get(&TypeId::of::<K>())
            .and_then(|v| v.downcast_ref::<K::Value>())
    }

    /// Returns a copy of the value published under `K`.
    ///
    /// A missing value means a stage ran before its producer, which is a
    /// pipeline wiring bug: it asserts in debug builds and is reported as an
    /// error otherwise.
    pub fn require<K: ResourceKey>(&self) -> Result<K::Value, StageError> {
        match self.get::<K>() {
            Some(value) => Ok(value.clone()),
            None => {
                log::error!("Required resource '{}' has not been published", K::NAME);
                debug_assert!(false, "required resource '{}' has not been published", K::NAME);
                Err(StageError::MissingResource { name: K::NAME })
            }
        }
    }

    /// Returns `true` if `K` has a value.
    pub fn contains<K: ResourceKey>(&self) -> bool {
        self.map(K::LIFETIME).contains_key(&TypeId::of::<K>())
    }

    /// Removes and returns the value of `K`.
    pub fn remove<K: ResourceKey>(&mut self) -> Option<K::Value> {
        let map = match K::LIFETIME {
            ResourceLifetime::Global => &mut self.global,
            ResourceLifetime::Frame => &mut self.frame,
        };
        map.remove(&TypeId::of::<K>())
            .and_then(|v| v.downcast::<K::Value>().ok())
            .map(|v| *v)
    }

    /// Drops every frame-lifetime value.
    pub fn begin_frame(&mut self) {
        self.frame.clear();
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.global.clear();
        self.frame.clear();
    }

    /// Number of published values.
    pub fn len(&self) -> usize {
        self.global.len() + self.frame.len()
    }

    /// Returns `true` if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("global", &self.global.len())
            .field("frame", &self.frame.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::TextureId;

    crate::declare_resource_key! {
        Albedo: TextureId = "albedo", Global;
        Exposure: f32 = "exposure", Frame;
    }

    #[test]
    fn test_publish_and_get() {
        let mut table = ResourceTable::new();
        table.publish::<Albedo>(TextureId(4));
        table.publish::<Exposure>(1.5);

        assert_eq!(table.get::<Albedo>(), Some(&TextureId(4)));
        assert_eq!(table.require::<Exposure>().unwrap(), 1.5);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_begin_frame_keeps_global_values() {
        let mut table = ResourceTable::new();
        table.publish::<Albedo>(TextureId(4));
        table.publish::<Exposure>(1.0);

        table.begin_frame();

        assert!(table.contains::<Albedo>());
        assert!(!table.contains::<Exposure>());
    }

    #[test]
    fn test_republish_replaces() {
        let mut table = ResourceTable::new();
        table.publish::<Albedo>(TextureId(1));
        table.publish::<Albedo>(TextureId(2));
        assert_eq!(table.remove::<Albedo>(), Some(TextureId(2)));
        assert!(table.is_empty());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "has not been published"))]
    fn test_require_missing() {
        let table = ResourceTable::new();
        let result = table.require::<Albedo>();
        assert!(matches!(result, Err(StageError::MissingResource { name: "albedo" })));
    }

    #[test]
    fn test_slot_identity() {
        assert_eq!(ResourceSlot::of::<Albedo>(), ResourceSlot::of::<Albedo>());
        assert_ne!(ResourceSlot::of::<Albedo>(), ResourceSlot::of::<Exposure>());
        assert_eq!(ResourceSlot::of::<Exposure>().lifetime(), ResourceLifetime::Frame);
    }
}
