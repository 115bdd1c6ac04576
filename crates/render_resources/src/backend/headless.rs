//! Headless backend
//!
//! Builds plain in-memory objects instead of GPU ones and records every
//! construct, destroy and bind call. Useful for tests and tooling that need a
//! working [`ResourceDevice`](crate::device::ResourceDevice) without a GPU.

use std::collections::HashSet;

use super::GraphicsBackend;
use crate::error::{ResourceError, ResourceResult};
use crate::resources::descriptors::{
    BufferDescription, BufferUsage, FramebufferDescription, PipelineDescription, SamplerDescription,
    ShaderDescription, ShaderStages, TextureDescription, TextureFormat,
};
use crate::resources::handle::ResourceType;

/// Object id of the backbuffer
pub const BACKBUFFER_ID: u64 = 0;

/// A recorded backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// `construct_*` succeeded with this object id
    Construct(ResourceType, u64),
    /// `destroy_*` was called with this object id
    Destroy(ResourceType, u64),
    /// A framebuffer (or the backbuffer, [`BACKBUFFER_ID`]) was bound
    Bind(u64),
}

/// Headless buffer
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessBuffer {
    /// Object id
    pub id: u64,
    /// Usage flags
    pub usage: BufferUsage,
    /// Contents, zero filled to the requested size
    pub contents: Vec<u8>,
}

/// Headless texture
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessTexture {
    /// Object id
    pub id: u64,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
}

/// Headless sampler
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessSampler {
    /// Object id
    pub id: u64,
}

/// Headless framebuffer
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessFramebuffer {
    /// Object id
    pub id: u64,
    /// Ids of the colour attachments
    pub color_ids: Vec<u64>,
    /// Id of the depth attachment
    pub depth_id: Option<u64>,
    /// Extent shared by all attachments
    pub extent: (u32, u32),
}

/// Headless shader program
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessShader {
    /// Object id
    pub id: u64,
    /// Stages in the program
    pub stages: ShaderStages,
}

/// Headless pipeline
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessPipeline {
    /// Object id
    pub id: u64,
    /// Id of the shader it was built from
    pub shader_id: u64,
}

/// In-memory backend that records its calls
#[derive(Debug)]
pub struct HeadlessBackend {
    backbuffer: HeadlessFramebuffer,
    next_id: u64,
    live: HashSet<u64>,
    calls: Vec<BackendCall>,
    bound: u64,
    fail_next: Option<ResourceType>,
}

impl HeadlessBackend {
    /// Backend with a backbuffer of the given extent
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            backbuffer: HeadlessFramebuffer {
                id: BACKBUFFER_ID,
                color_ids: Vec::new(),
                depth_id: None,
                extent: (width, height),
            },
            next_id: BACKBUFFER_ID + 1,
            live: HashSet::new(),
            calls: Vec::new(),
            bound: BACKBUFFER_ID,
            fail_next: None,
        }
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of constructed objects not yet destroyed
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether object `id` is constructed and not yet destroyed
    pub fn is_live(&self, id: u64) -> bool {
        self.live.contains(&id)
    }

    /// How many times object `id` has been destroyed
    pub fn destroy_count(&self, id: u64) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Destroy(_, destroyed) if *destroyed == id))
            .count()
    }

    /// Id of the framebuffer bound last
    pub fn bound_framebuffer(&self) -> u64 {
        self.bound
    }

    /// Make the next `construct_*` of `kind` fail
    pub fn fail_next_construct(&mut self, kind: ResourceType) {
        self.fail_next = Some(kind);
    }

    fn begin_construct(&mut self, kind: ResourceType) -> ResourceResult<u64> {
        if self.fail_next == Some(kind) {
            self.fail_next = None;
            return Err(ResourceError::creation_failed(kind, "injected headless failure"));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.calls.push(BackendCall::Construct(kind, id));
        Ok(id)
    }

    fn finish_destroy(&mut self, kind: ResourceType, id: u64) {
        if !self.live.remove(&id) {
            log::error!("headless {} {} destroyed while not live", kind, id);
        }
        self.calls.push(BackendCall::Destroy(kind, id));
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Buffer = HeadlessBuffer;
    type Texture = HeadlessTexture;
    type Sampler = HeadlessSampler;
    type Framebuffer = HeadlessFramebuffer;
    type Shader = HeadlessShader;
    type Pipeline = HeadlessPipeline;

    fn name(&self) -> &str {
        "headless"
    }

    fn construct_buffer(&mut self, desc: &BufferDescription) -> ResourceResult<HeadlessBuffer> {
        let size = usize::try_from(desc.size)
            .map_err(|_| ResourceError::creation_failed(ResourceType::Buffer, "size exceeds address space"))?;
        let mut contents = Vec::new();
        contents
            .try_reserve_exact(size)
            .map_err(|err| ResourceError::creation_failed(ResourceType::Buffer, err.to_string()))?;
        contents.resize(size, 0);
        let id = self.begin_construct(ResourceType::Buffer)?;
        if let Some(data) = &desc.initial_data {
            let len = data.len().min(size);
            contents[..len].copy_from_slice(&data[..len]);
        }
        Ok(HeadlessBuffer {
            id,
            usage: desc.usage,
            contents,
        })
    }

    fn destroy_buffer(&mut self, buffer: HeadlessBuffer) {
        self.finish_destroy(ResourceType::Buffer, buffer.id);
    }

    fn construct_texture(&mut self, desc: &TextureDescription) -> ResourceResult<HeadlessTexture> {
        let id = self.begin_construct(ResourceType::Texture)?;
        Ok(HeadlessTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        })
    }

    fn destroy_texture(&mut self, texture: HeadlessTexture) {
        self.finish_destroy(ResourceType::Texture, texture.id);
    }

    fn construct_sampler(&mut self, _desc: &SamplerDescription) -> ResourceResult<HeadlessSampler> {
        let id = self.begin_construct(ResourceType::Sampler)?;
        Ok(HeadlessSampler { id })
    }

    fn destroy_sampler(&mut self, sampler: HeadlessSampler) {
        self.finish_destroy(ResourceType::Sampler, sampler.id);
    }

    fn construct_framebuffer(
        &mut self,
        desc: &FramebufferDescription,
        color_attachments: &[&HeadlessTexture],
        depth_attachment: Option<&HeadlessTexture>,
    ) -> ResourceResult<HeadlessFramebuffer> {
        let mut attachments = color_attachments.iter().copied().chain(depth_attachment);
        let extent = attachments
            .next()
            .map(|texture| (texture.width, texture.height))
            .ok_or_else(|| ResourceError::creation_failed(ResourceType::Framebuffer, "no attachments"))?;
        if attachments.any(|texture| (texture.width, texture.height) != extent) {
            return Err(ResourceError::creation_failed(
                ResourceType::Framebuffer,
                format!("attachments of '{}' differ in extent", desc.label),
            ));
        }

        let id = self.begin_construct(ResourceType::Framebuffer)?;
        Ok(HeadlessFramebuffer {
            id,
            color_ids: color_attachments.iter().map(|texture| texture.id).collect(),
            depth_id: depth_attachment.map(|texture| texture.id),
            extent,
        })
    }

    fn destroy_framebuffer(&mut self, framebuffer: HeadlessFramebuffer) {
        self.finish_destroy(ResourceType::Framebuffer, framebuffer.id);
    }

    fn construct_shader(&mut self, desc: &ShaderDescription) -> ResourceResult<HeadlessShader> {
        let id = self.begin_construct(ResourceType::Shader)?;
        Ok(HeadlessShader {
            id,
            stages: desc.stage_flags(),
        })
    }

    fn destroy_shader(&mut self, shader: HeadlessShader) {
        self.finish_destroy(ResourceType::Shader, shader.id);
    }

    fn construct_pipeline(
        &mut self,
        _desc: &PipelineDescription,
        shader: &HeadlessShader,
    ) -> ResourceResult<HeadlessPipeline> {
        let id = self.begin_construct(ResourceType::Pipeline)?;
        Ok(HeadlessPipeline {
            id,
            shader_id: shader.id,
        })
    }

    fn destroy_pipeline(&mut self, pipeline: HeadlessPipeline) {
        self.finish_destroy(ResourceType::Pipeline, pipeline.id);
    }

    fn default_render_target(&self) -> &HeadlessFramebuffer {
        &self.backbuffer
    }

    fn bind_framebuffer(&mut self, framebuffer: &HeadlessFramebuffer) {
        self.bound = framebuffer.id;
        self.calls.push(BackendCall::Bind(framebuffer.id));
    }

    fn bind_default_render_target(&mut self) {
        self.bound = BACKBUFFER_ID;
        self.calls.push(BackendCall::Bind(BACKBUFFER_ID));
    }
}
