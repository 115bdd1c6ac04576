//! Typed opaque handles
//!
//! A [`Handle<K>`] is what callers hold instead of a reference to a native
//! GPU object. It carries the same `(id, generation)` pair as the internal
//! [`PoolHandle`] but is tagged with a resource kind, so a buffer handle
//! cannot be presented where a texture handle is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{ResourceError, ResourceResult};
use crate::resources::pool::{PoolHandle, SlotPool};

/// Id value of the "no resource" sentinel
pub const SENTINEL: u32 = PoolHandle::SENTINEL_INDEX;

/// Runtime tag for each resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// GPU buffer
    Buffer,
    /// Texture image
    Texture,
    /// Texture sampler
    Sampler,
    /// Framebuffer / render target
    Framebuffer,
    /// Shader program
    Shader,
    /// Graphics pipeline
    Pipeline,
}

impl ResourceType {
    /// Every kind, in teardown order (dependents first)
    pub const TEARDOWN_ORDER: [ResourceType; 6] = [
        ResourceType::Pipeline,
        ResourceType::Framebuffer,
        ResourceType::Shader,
        ResourceType::Sampler,
        ResourceType::Texture,
        ResourceType::Buffer,
    ];

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            ResourceType::Buffer => "buffer",
            ResourceType::Texture => "texture",
            ResourceType::Sampler => "sampler",
            ResourceType::Framebuffer => "framebuffer",
            ResourceType::Shader => "shader",
            ResourceType::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker trait implemented by the zero-sized kind types
pub trait ResourceKind: 'static {
    /// Runtime tag for this kind
    const TYPE: ResourceType;
}

macro_rules! resource_kinds {
    ($($(#[$doc:meta])* $kind:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $kind {}

            impl ResourceKind for $kind {
                const TYPE: ResourceType = ResourceType::$kind;
            }
        )*
    };
}

resource_kinds! {
    /// Buffer kind marker
    Buffer,
    /// Texture kind marker
    Texture,
    /// Sampler kind marker
    Sampler,
    /// Framebuffer kind marker
    Framebuffer,
    /// Shader program kind marker
    Shader,
    /// Pipeline kind marker
    Pipeline,
}

/// Copyable, immutable handle to a pooled resource of kind `K`
///
/// [`Handle::is_valid`] only rules out the sentinel; whether the handle
/// still resolves is decided by the owning device.
pub struct Handle<K: ResourceKind> {
    id: u32,
    generation: u32,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Handle<K> {
    /// The "no resource" handle
    pub const fn invalid() -> Self {
        Self {
            id: SENTINEL,
            generation: 0,
            _kind: PhantomData,
        }
    }

    /// Slot id
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Generation the handle was issued with
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Cheap pool-independent check that this is not the sentinel
    pub const fn is_valid(&self) -> bool {
        self.id != SENTINEL
    }

    /// Kind tag of this handle
    pub const fn resource_type(&self) -> ResourceType {
        K::TYPE
    }

    pub(crate) const fn from_pool(handle: PoolHandle) -> Self {
        Self {
            id: handle.index,
            generation: handle.generation,
            _kind: PhantomData,
        }
    }

    pub(crate) const fn to_pool(self) -> PoolHandle {
        PoolHandle::new(self.id, self.generation)
    }

    /// Resolve against `pool`, describing the mismatch on failure
    ///
    /// Used where a dead handle is a caller bug, such as a framebuffer
    /// attachment at creation time. Not meant for the binding hot path.
    pub fn resolve_in<'a, T>(&self, pool: &'a SlotPool<T>) -> ResourceResult<&'a T> {
        if !self.is_valid() {
            return Err(ResourceError::InvalidHandle { kind: K::TYPE });
        }
        pool.try_get(self.to_pool()).ok_or_else(|| ResourceError::StaleHandle {
            kind: K::TYPE,
            id: self.id,
            expected_generation: self.generation,
            actual_generation: pool.slot_generation(self.id),
            occupied: pool.is_occupied(self.id),
        })
    }

    /// Fail-fast check against `pool`, for assertion contexts
    ///
    /// The error carries the expected id/generation and what the slot
    /// actually holds.
    pub fn validate_against<T>(&self, pool: &SlotPool<T>) -> ResourceResult<()> {
        self.resolve_in(pool).map(|_| ())
    }
}

impl<K: ResourceKind> Default for Handle<K> {
    fn default() -> Self {
        Self::invalid()
    }
}

// Manual impls so no bounds are placed on the marker type.
impl<K: ResourceKind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ResourceKind> Copy for Handle<K> {}

impl<K: ResourceKind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.generation == other.generation
    }
}

impl<K: ResourceKind> Eq for Handle<K> {}

impl<K: ResourceKind> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.generation.hash(state);
    }
}

impl<K: ResourceKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Handle<{}>({}v{})", K::TYPE, self.id, self.generation)
        } else {
            write!(f, "Handle<{}>(invalid)", K::TYPE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_invalid_handle() {
        let handle = Handle::<Texture>::invalid();
        assert!(!handle.is_valid());
        assert_eq!(handle.id(), SENTINEL);
        assert_eq!(Handle::<Texture>::default(), handle);
    }

    #[test]
    fn test_pool_conversion_is_identity() {
        let pool_handle = PoolHandle::new(3, 7);
        let handle = Handle::<Buffer>::from_pool(pool_handle);
        assert_eq!(handle.id(), 3);
        assert_eq!(handle.generation(), 7);
        assert_eq!(handle.to_pool(), pool_handle);
        assert_eq!(handle.resource_type(), ResourceType::Buffer);
    }

    #[test]
    fn test_handles_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(Handle::<Sampler>::from_pool(PoolHandle::new(0, 1)));
        set.insert(Handle::<Sampler>::from_pool(PoolHandle::new(0, 1)));
        set.insert(Handle::<Sampler>::from_pool(PoolHandle::new(0, 2)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Copy>() {}
        assert_send_sync::<Handle<Framebuffer>>();
        assert_send_sync::<Handle<Pipeline>>();
    }

    #[test]
    fn test_validate_against_reports_mismatch() {
        let mut pool = SlotPool::new();
        let stale = Handle::<Shader>::from_pool(pool.allocate("first"));
        pool.release(stale.to_pool());
        let fresh = Handle::<Shader>::from_pool(pool.allocate("second"));

        assert!(fresh.validate_against(&pool).is_ok());
        assert_eq!(fresh.resolve_in(&pool).ok(), Some(&"second"));
        match stale.validate_against(&pool) {
            Err(ResourceError::StaleHandle {
                kind,
                id,
                expected_generation,
                actual_generation,
                occupied,
            }) => {
                assert_eq!(kind, ResourceType::Shader);
                assert_eq!(id, 0);
                assert_eq!(expected_generation, 1);
                assert_eq!(actual_generation, Some(2));
                assert!(occupied);
            }
            other => panic!("expected stale handle error, got {other:?}"),
        }
        assert!(matches!(
            Handle::<Shader>::invalid().validate_against(&pool),
            Err(ResourceError::InvalidHandle { kind: ResourceType::Shader })
        ));
    }

    #[test]
    fn test_debug_format() {
        let handle = Handle::<Pipeline>::from_pool(PoolHandle::new(2, 5));
        assert_eq!(format!("{handle:?}"), "Handle<pipeline>(2v5)");
        assert_eq!(format!("{:?}", Handle::<Pipeline>::invalid()), "Handle<pipeline>(invalid)");
    }
}
