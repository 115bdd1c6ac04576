//! Backend abstraction trait for native resource construction
//!
//! A backend only knows how to build and destroy native objects and how to
//! bind a render target. Pools, handles and generations live entirely in the
//! [`ResourceDevice`](crate::device::ResourceDevice), which never branches on
//! which backend it is driving.

pub mod headless;

use crate::error::ResourceResult;
use crate::resources::descriptors::{
    BufferDescription, FramebufferDescription, PipelineDescription, SamplerDescription, ShaderDescription,
    TextureDescription,
};

pub use headless::HeadlessBackend;

/// Native graphics backend capability set
///
/// `construct_*` must leave nothing allocated when it returns an error.
/// `destroy_*` is called exactly once for every successfully constructed
/// resource.
pub trait GraphicsBackend {
    /// Native buffer object
    type Buffer;
    /// Native texture object
    type Texture;
    /// Native sampler object
    type Sampler;
    /// Native framebuffer / render target object
    type Framebuffer;
    /// Native shader program
    type Shader;
    /// Native pipeline state object
    type Pipeline;

    /// Short backend name for logging
    fn name(&self) -> &str;

    /// Create a buffer
    fn construct_buffer(&mut self, desc: &BufferDescription) -> ResourceResult<Self::Buffer>;
    /// Destroy a buffer
    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    /// Create a texture
    fn construct_texture(&mut self, desc: &TextureDescription) -> ResourceResult<Self::Texture>;
    /// Destroy a texture
    fn destroy_texture(&mut self, texture: Self::Texture);

    /// Create a sampler
    fn construct_sampler(&mut self, desc: &SamplerDescription) -> ResourceResult<Self::Sampler>;
    /// Destroy a sampler
    fn destroy_sampler(&mut self, sampler: Self::Sampler);

    /// Create a framebuffer over already resolved attachments
    fn construct_framebuffer(
        &mut self,
        desc: &FramebufferDescription,
        color_attachments: &[&Self::Texture],
        depth_attachment: Option<&Self::Texture>,
    ) -> ResourceResult<Self::Framebuffer>;
    /// Destroy a framebuffer
    fn destroy_framebuffer(&mut self, framebuffer: Self::Framebuffer);

    /// Create a shader program
    fn construct_shader(&mut self, desc: &ShaderDescription) -> ResourceResult<Self::Shader>;
    /// Destroy a shader program
    fn destroy_shader(&mut self, shader: Self::Shader);

    /// Create a pipeline over an already resolved shader
    fn construct_pipeline(&mut self, desc: &PipelineDescription, shader: &Self::Shader) -> ResourceResult<Self::Pipeline>;
    /// Destroy a pipeline
    fn destroy_pipeline(&mut self, pipeline: Self::Pipeline);

    /// The permanent backbuffer target
    fn default_render_target(&self) -> &Self::Framebuffer;

    /// Make `framebuffer` the active render target
    fn bind_framebuffer(&mut self, framebuffer: &Self::Framebuffer);

    /// Make the backbuffer the active render target
    fn bind_default_render_target(&mut self);
}
