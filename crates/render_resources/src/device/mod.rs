//! Resource Device
//!
//! One [`ResourceDevice`] exists per graphics context. It owns a
//! [`SlotPool`] per resource kind and is the only place where public
//! [`Handle`]s are translated to and from internal [`PoolHandle`]s.
//!
//! # Architecture
//!
//! ```text
//! caller ── create_*(desc) ──► backend.construct_* ──► SlotPool::allocate ──► Handle<K>
//! caller ── get_*(handle)  ──► SlotPool::try_get  ──► Option<&Native>
//! caller ── destroy_*(h)   ──► pending queue (latency N) ──► SlotPool::release_with ──► backend.destroy_*
//! ```
//!
//! # Usage
//!
//! ```rust
//! use render_resources::prelude::*;
//!
//! let mut device = ResourceDevice::from_backend(HeadlessBackend::default());
//! let buffer = device
//!     .create_buffer(&BufferDescription::new("uniforms", 256, BufferUsage::UNIFORM))
//!     .unwrap();
//! assert!(device.get_buffer(buffer).is_some());
//!
//! device.destroy_buffer(buffer);
//! assert!(device.get_buffer(buffer).is_none());
//! ```

pub mod render_target;

use std::collections::VecDeque;
use std::fmt;

use crate::backend::GraphicsBackend;
use crate::config::DeviceConfig;
use crate::error::ResourceResult;
use crate::resources::descriptors::{
    BufferDescription, FramebufferDescription, PipelineDescription, SamplerDescription, ShaderDescription,
    TextureDescription,
};
use crate::resources::handle::{
    Buffer, Framebuffer, Handle, Pipeline, ResourceKind, ResourceType, Sampler, Shader, Texture,
};
use crate::resources::pool::{PoolHandle, PoolStats, SlotPool};

pub use render_target::RenderTarget;

/// The per-kind slot pools of one device
pub struct ResourcePools<B: GraphicsBackend> {
    buffers: SlotPool<B::Buffer>,
    textures: SlotPool<B::Texture>,
    samplers: SlotPool<B::Sampler>,
    framebuffers: SlotPool<B::Framebuffer>,
    shaders: SlotPool<B::Shader>,
    pipelines: SlotPool<B::Pipeline>,
}

impl<B: GraphicsBackend> ResourcePools<B> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: SlotPool::with_capacity(capacity),
            textures: SlotPool::with_capacity(capacity),
            samplers: SlotPool::with_capacity(capacity),
            framebuffers: SlotPool::with_capacity(capacity),
            shaders: SlotPool::with_capacity(capacity),
            pipelines: SlotPool::with_capacity(capacity),
        }
    }

    /// Occupancy of the pool for `kind`
    pub fn stats(&self, kind: ResourceType) -> PoolStats {
        match kind {
            ResourceType::Buffer => self.buffers.stats(),
            ResourceType::Texture => self.textures.stats(),
            ResourceType::Sampler => self.samplers.stats(),
            ResourceType::Framebuffer => self.framebuffers.stats(),
            ResourceType::Shader => self.shaders.stats(),
            ResourceType::Pipeline => self.pipelines.stats(),
        }
    }
}

/// A resource kind the device keeps a pool for
///
/// Implemented for the six kind markers; ties each marker to its pool and to
/// the backend call that destroys its native objects.
pub trait DeviceResource: ResourceKind {
    /// Native object type for backend `B`
    type Native<B: GraphicsBackend>;

    /// Pool holding this kind
    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<Self::Native<B>>;

    /// Mutable pool holding this kind
    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<Self::Native<B>>;

    /// Hand a native object back to the backend for destruction
    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: Self::Native<B>);
}

impl DeviceResource for Buffer {
    type Native<B: GraphicsBackend> = B::Buffer;

    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<B::Buffer> {
        &pools.buffers
    }

    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<B::Buffer> {
        &mut pools.buffers
    }

    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: B::Buffer) {
        backend.destroy_buffer(native);
    }
}

impl DeviceResource for Texture {
    type Native<B: GraphicsBackend> = B::Texture;

    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<B::Texture> {
        &pools.textures
    }

    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<B::Texture> {
        &mut pools.textures
    }

    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: B::Texture) {
        backend.destroy_texture(native);
    }
}

impl DeviceResource for Sampler {
    type Native<B: GraphicsBackend> = B::Sampler;

    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<B::Sampler> {
        &pools.samplers
    }

    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<B::Sampler> {
        &mut pools.samplers
    }

    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: B::Sampler) {
        backend.destroy_sampler(native);
    }
}

impl DeviceResource for Framebuffer {
    type Native<B: GraphicsBackend> = B::Framebuffer;

    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<B::Framebuffer> {
        &pools.framebuffers
    }

    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<B::Framebuffer> {
        &mut pools.framebuffers
    }

    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: B::Framebuffer) {
        backend.destroy_framebuffer(native);
    }
}

impl DeviceResource for Shader {
    type Native<B: GraphicsBackend> = B::Shader;

    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<B::Shader> {
        &pools.shaders
    }

    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<B::Shader> {
        &mut pools.shaders
    }

    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: B::Shader) {
        backend.destroy_shader(native);
    }
}

impl DeviceResource for Pipeline {
    type Native<B: GraphicsBackend> = B::Pipeline;

    fn pool<B: GraphicsBackend>(pools: &ResourcePools<B>) -> &SlotPool<B::Pipeline> {
        &pools.pipelines
    }

    fn pool_mut<B: GraphicsBackend>(pools: &mut ResourcePools<B>) -> &mut SlotPool<B::Pipeline> {
        &mut pools.pipelines
    }

    fn destroy_native<B: GraphicsBackend>(backend: &mut B, native: B::Pipeline) {
        backend.destroy_pipeline(native);
    }
}

/// A destroy request waiting for in-flight frames to retire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRelease {
    kind: ResourceType,
    handle: PoolHandle,
    release_frame: u64,
}

/// Occupancy of every pool on a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Buffer pool
    pub buffers: PoolStats,
    /// Texture pool
    pub textures: PoolStats,
    /// Sampler pool
    pub samplers: PoolStats,
    /// Framebuffer pool
    pub framebuffers: PoolStats,
    /// Shader pool
    pub shaders: PoolStats,
    /// Pipeline pool
    pub pipelines: PoolStats,
    /// Destroy requests not yet released
    pub pending_releases: usize,
    /// Current frame number
    pub frame: u64,
}

impl DeviceStats {
    /// Live resources across all pools
    pub fn total_allocated(&self) -> usize {
        [self.buffers, self.textures, self.samplers, self.framebuffers, self.shaders, self.pipelines]
            .iter()
            .map(|stats| stats.allocated)
            .sum()
    }
}

impl fmt::Display for DeviceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frame {} ({} pending releases)", self.frame, self.pending_releases)?;
        writeln!(f, "  buffers:      {}", self.buffers)?;
        writeln!(f, "  textures:     {}", self.textures)?;
        writeln!(f, "  samplers:     {}", self.samplers)?;
        writeln!(f, "  framebuffers: {}", self.framebuffers)?;
        writeln!(f, "  shaders:      {}", self.shaders)?;
        write!(f, "  pipelines:    {}", self.pipelines)
    }
}

/// Handle-based resource owner for one graphics context
///
/// All methods run on the thread that owns the device. Handles are plain
/// data and may travel between threads; only the owner resolves them.
pub struct ResourceDevice<B: GraphicsBackend> {
    backend: B,
    pools: ResourcePools<B>,
    render_target: RenderTarget,
    pending: VecDeque<PendingRelease>,
    frame: u64,
    config: DeviceConfig,
}

impl<B: GraphicsBackend> ResourceDevice<B> {
    /// Create a device on `backend`, rejecting an invalid `config`
    pub fn new(backend: B, config: DeviceConfig) -> ResourceResult<Self> {
        config.validate()?;
        Ok(Self::build(backend, config))
    }

    /// Create a device with the default configuration
    pub fn from_backend(backend: B) -> Self {
        Self::build(backend, DeviceConfig::default())
    }

    fn build(backend: B, config: DeviceConfig) -> Self {
        log::info!(
            "[{}] Resource device created on {} backend (pool capacity {}, release latency {} frames)",
            config.label,
            backend.name(),
            config.initial_pool_capacity,
            config.release_latency_frames
        );

        Self {
            pools: ResourcePools::with_capacity(config.initial_pool_capacity),
            backend,
            render_target: RenderTarget::Backbuffer,
            pending: VecDeque::new(),
            frame: 0,
            config,
        }
    }

    /// The backend this device drives
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, for calls outside this layer
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The configuration the device was created with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Read-only view of the pools
    pub fn pools(&self) -> &ResourcePools<B> {
        &self.pools
    }

    fn insert<K: DeviceResource>(&mut self, native: K::Native<B>, label: &str) -> Handle<K> {
        let handle = Handle::from_pool(K::pool_mut(&mut self.pools).allocate(native));
        log::debug!("[{}] Created {} '{}' as {:?}", self.config.label, K::TYPE, label, handle);
        handle
    }

    // === Generic access ===

    /// Resolve `handle`, or `None` if it is sentinel, stale or released
    pub fn get<K: DeviceResource>(&self, handle: Handle<K>) -> Option<&K::Native<B>> {
        K::pool(&self.pools).try_get(handle.to_pool())
    }

    /// Mutable variant of [`ResourceDevice::get`]
    pub fn get_mut<K: DeviceResource>(&mut self, handle: Handle<K>) -> Option<&mut K::Native<B>> {
        K::pool_mut(&mut self.pools).get_mut(handle.to_pool())
    }

    /// Whether `handle` currently resolves
    pub fn is_alive<K: DeviceResource>(&self, handle: Handle<K>) -> bool {
        K::pool(&self.pools).is_valid(handle.to_pool())
    }

    /// Strict check that fails with expected vs actual id/generation
    pub fn validate<K: DeviceResource>(&self, handle: Handle<K>) -> ResourceResult<()> {
        handle.validate_against(K::pool(&self.pools))
    }

    /// Whether `handle` has been destroyed and is waiting for its release frame
    pub fn is_pending_release<K: DeviceResource>(&self, handle: Handle<K>) -> bool {
        let pool_handle = handle.to_pool();
        self.pending
            .iter()
            .any(|pending| pending.kind == K::TYPE && pending.handle == pool_handle)
    }

    /// Destroy the resource behind `handle`
    ///
    /// A handle that no longer resolves is ignored and `false` is returned.
    /// With a release latency configured the slot is recycled only once the
    /// frame counter reaches `frame + latency`; until then the handle still
    /// resolves.
    pub fn destroy<K: DeviceResource>(&mut self, handle: Handle<K>) -> bool {
        let pool_handle = handle.to_pool();
        if !K::pool(&self.pools).is_valid(pool_handle) {
            log::trace!("[{}] Ignoring destroy of dead {:?}", self.config.label, handle);
            return false;
        }

        let latency = self.config.release_latency_frames;
        if latency == 0 {
            return self.release_now::<K>(pool_handle);
        }
        if self.is_pending_release(handle) {
            return false;
        }

        let release_frame = self.frame + u64::from(latency);
        log::debug!(
            "[{}] Deferring release of {:?} to frame {}",
            self.config.label,
            handle,
            release_frame
        );
        self.pending.push_back(PendingRelease {
            kind: K::TYPE,
            handle: pool_handle,
            release_frame,
        });
        true
    }

    fn release_now<K: DeviceResource>(&mut self, handle: PoolHandle) -> bool {
        let backend = &mut self.backend;
        let released = K::pool_mut(&mut self.pools).release_with(handle, |native| K::destroy_native(backend, native));
        if !released {
            return false;
        }
        log::debug!("[{}] Released {} {}v{}", self.config.label, K::TYPE, handle.index, handle.generation);

        if K::TYPE == ResourceType::Framebuffer && self.render_target.framebuffer().map(Handle::to_pool) == Some(handle) {
            log::debug!("[{}] Bound framebuffer released, reverting to backbuffer", self.config.label);
            self.render_target = RenderTarget::Backbuffer;
            self.backend.bind_default_render_target();
        }
        true
    }

    fn release_pending(&mut self, pending: PendingRelease) -> bool {
        let handle = pending.handle;
        let released = match pending.kind {
            ResourceType::Buffer => self.release_now::<Buffer>(handle),
            ResourceType::Texture => self.release_now::<Texture>(handle),
            ResourceType::Sampler => self.release_now::<Sampler>(handle),
            ResourceType::Framebuffer => self.release_now::<Framebuffer>(handle),
            ResourceType::Shader => self.release_now::<Shader>(handle),
            ResourceType::Pipeline => self.release_now::<Pipeline>(handle),
        };
        if !released {
            log::warn!(
                "[{}] Deferred release of {} {}v{} no longer resolves, native object leaked",
                self.config.label,
                pending.kind,
                handle.index,
                handle.generation
            );
        }
        released
    }

    // === Frame boundary ===

    /// Current frame number
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Destroy requests not yet released
    pub fn pending_release_count(&self) -> usize {
        self.pending.len()
    }

    /// Advance the frame counter and release everything that is now due
    ///
    /// Returns the number of resources released.
    pub fn end_frame(&mut self) -> usize {
        self.frame += 1;

        let mut released = 0;
        while let Some(pending) = self.pending.front().copied() {
            if pending.release_frame > self.frame {
                break;
            }
            self.pending.pop_front();
            if self.release_pending(pending) {
                released += 1;
            }
        }
        released
    }

    /// Release every pending destroy request immediately
    pub fn flush_pending_releases(&mut self) -> usize {
        let mut released = 0;
        while let Some(pending) = self.pending.pop_front() {
            if self.release_pending(pending) {
                released += 1;
            }
        }
        released
    }

    // === Teardown ===

    fn clear_pool<K: DeviceResource>(&mut self) -> usize {
        let backend = &mut self.backend;
        let pool = K::pool_mut(&mut self.pools);
        let count = pool.allocated_count();
        pool.clear_with(|native| K::destroy_native(backend, native));
        count
    }

    /// Destroy every resource the device owns, dependents first
    ///
    /// The device stays usable afterwards; handles issued before never
    /// resolve again.
    pub fn shutdown(&mut self) {
        self.flush_pending_releases();

        let mut destroyed = 0;
        for kind in ResourceType::TEARDOWN_ORDER {
            destroyed += match kind {
                ResourceType::Pipeline => self.clear_pool::<Pipeline>(),
                ResourceType::Framebuffer => self.clear_pool::<Framebuffer>(),
                ResourceType::Shader => self.clear_pool::<Shader>(),
                ResourceType::Sampler => self.clear_pool::<Sampler>(),
                ResourceType::Texture => self.clear_pool::<Texture>(),
                ResourceType::Buffer => self.clear_pool::<Buffer>(),
            };
        }
        self.render_target = RenderTarget::Backbuffer;

        if destroyed > 0 {
            log::info!("[{}] Resource device teardown destroyed {} resources", self.config.label, destroyed);
        }
    }

    /// Occupancy snapshot of every pool
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            buffers: self.pools.stats(ResourceType::Buffer),
            textures: self.pools.stats(ResourceType::Texture),
            samplers: self.pools.stats(ResourceType::Sampler),
            framebuffers: self.pools.stats(ResourceType::Framebuffer),
            shaders: self.pools.stats(ResourceType::Shader),
            pipelines: self.pools.stats(ResourceType::Pipeline),
            pending_releases: self.pending.len(),
            frame: self.frame,
        }
    }

    // === Buffers ===

    /// Create a buffer
    pub fn create_buffer(&mut self, desc: &BufferDescription) -> ResourceResult<Handle<Buffer>> {
        desc.validate()?;
        let native = self.backend.construct_buffer(desc)?;
        Ok(self.insert(native, &desc.label))
    }

    /// Destroy a buffer; dead handles are ignored
    pub fn destroy_buffer(&mut self, handle: Handle<Buffer>) -> bool {
        self.destroy(handle)
    }

    /// Resolve a buffer handle
    pub fn get_buffer(&self, handle: Handle<Buffer>) -> Option<&B::Buffer> {
        self.get(handle)
    }

    // === Textures ===

    /// Create a texture
    pub fn create_texture(&mut self, desc: &TextureDescription) -> ResourceResult<Handle<Texture>> {
        desc.validate()?;
        let native = self.backend.construct_texture(desc)?;
        Ok(self.insert(native, &desc.label))
    }

    /// Destroy a texture; dead handles are ignored
    pub fn destroy_texture(&mut self, handle: Handle<Texture>) -> bool {
        self.destroy(handle)
    }

    /// Resolve a texture handle
    pub fn get_texture(&self, handle: Handle<Texture>) -> Option<&B::Texture> {
        self.get(handle)
    }

    // === Samplers ===

    /// Create a sampler
    pub fn create_sampler(&mut self, desc: &SamplerDescription) -> ResourceResult<Handle<Sampler>> {
        desc.validate()?;
        let native = self.backend.construct_sampler(desc)?;
        Ok(self.insert(native, "sampler"))
    }

    /// Destroy a sampler; dead handles are ignored
    pub fn destroy_sampler(&mut self, handle: Handle<Sampler>) -> bool {
        self.destroy(handle)
    }

    /// Resolve a sampler handle
    pub fn get_sampler(&self, handle: Handle<Sampler>) -> Option<&B::Sampler> {
        self.get(handle)
    }

    // === Framebuffers ===

    /// Create a framebuffer; every attachment handle must resolve
    pub fn create_framebuffer(&mut self, desc: &FramebufferDescription) -> ResourceResult<Handle<Framebuffer>> {
        desc.validate()?;
        let textures = &self.pools.textures;
        let color_attachments = desc
            .color_attachments
            .iter()
            .map(|attachment| attachment.resolve_in(textures))
            .collect::<ResourceResult<Vec<_>>>()?;
        let depth_attachment = desc
            .depth_attachment
            .map(|attachment| attachment.resolve_in(textures))
            .transpose()?;

        let native = self
            .backend
            .construct_framebuffer(desc, &color_attachments, depth_attachment)?;
        Ok(self.insert(native, &desc.label))
    }

    /// Destroy a framebuffer; dead handles are ignored
    ///
    /// If it is the bound render target, the backbuffer is bound instead
    /// once the release happens.
    pub fn destroy_framebuffer(&mut self, handle: Handle<Framebuffer>) -> bool {
        self.destroy(handle)
    }

    /// Resolve a framebuffer handle
    pub fn get_framebuffer(&self, handle: Handle<Framebuffer>) -> Option<&B::Framebuffer> {
        self.get(handle)
    }

    // === Shaders ===

    /// Create a shader program
    pub fn create_shader(&mut self, desc: &ShaderDescription) -> ResourceResult<Handle<Shader>> {
        desc.validate()?;
        let native = self.backend.construct_shader(desc)?;
        Ok(self.insert(native, &desc.label))
    }

    /// Destroy a shader program; dead handles are ignored
    pub fn destroy_shader(&mut self, handle: Handle<Shader>) -> bool {
        self.destroy(handle)
    }

    /// Resolve a shader handle
    pub fn get_shader(&self, handle: Handle<Shader>) -> Option<&B::Shader> {
        self.get(handle)
    }

    // === Pipelines ===

    /// Create a pipeline; its shader handle must resolve
    pub fn create_pipeline(&mut self, desc: &PipelineDescription) -> ResourceResult<Handle<Pipeline>> {
        let shader = desc.shader.resolve_in(&self.pools.shaders)?;
        let native = self.backend.construct_pipeline(desc, shader)?;
        Ok(self.insert(native, &desc.label))
    }

    /// Destroy a pipeline; dead handles are ignored
    pub fn destroy_pipeline(&mut self, handle: Handle<Pipeline>) -> bool {
        self.destroy(handle)
    }

    /// Resolve a pipeline handle
    pub fn get_pipeline(&self, handle: Handle<Pipeline>) -> Option<&B::Pipeline> {
        self.get(handle)
    }
}

impl<B: GraphicsBackend> Drop for ResourceDevice<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: GraphicsBackend> fmt::Debug for ResourceDevice<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDevice")
            .field("label", &self.config.label)
            .field("backend", &self.backend.name())
            .field("render_target", &self.render_target)
            .field("stats", &self.stats())
            .finish()
    }
}
