//! Creation descriptions for each resource kind
//!
//! Descriptions are plain data handed to the backend's `construct_*` calls.
//! Each one validates itself before any backend call is made, so a rejected
//! description never leaves a half-built resource behind.

use bitflags::bitflags;

use crate::error::{ResourceError, ResourceResult};
use crate::resources::handle::{Handle, ResourceType, Shader, Texture};

/// Largest texture edge accepted by [`TextureDescription::validate`]
pub const MAX_TEXTURE_DIMENSION: u32 = 16_384;

/// Largest buffer size in bytes accepted by [`BufferDescription::validate`]
pub const MAX_BUFFER_SIZE: u64 = 1 << 31;

/// Largest number of colour attachments on one framebuffer
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

bitflags! {
    /// How a buffer will be bound
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex input
        const VERTEX = 1 << 0;
        /// Index input
        const INDEX = 1 << 1;
        /// Uniform / constant data
        const UNIFORM = 1 << 2;
        /// Read-write storage
        const STORAGE = 1 << 3;
        /// Rewritten by the CPU every frame
        const DYNAMIC = 1 << 4;
        /// Source or destination of copies
        const STAGING = 1 << 5;
    }
}

bitflags! {
    /// How a texture will be bound
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Sampled from shaders
        const SAMPLED = 1 << 0;
        /// Written as a colour attachment
        const RENDER_TARGET = 1 << 1;
        /// Written as a depth/stencil attachment
        const DEPTH_STENCIL = 1 << 2;
        /// Read-write storage image
        const STORAGE = 1 << 3;
    }
}

bitflags! {
    /// Programmable stages present in a shader program
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        /// Vertex stage
        const VERTEX = 1 << 0;
        /// Fragment stage
        const FRAGMENT = 1 << 1;
        /// Compute stage
        const COMPUTE = 1 << 2;
    }
}

/// Pixel formats understood by the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, unsigned normalized
    Rgba8Unorm,
    /// 8-bit BGRA, unsigned normalized
    Bgra8Unorm,
    /// 16-bit float RGBA
    Rgba16Float,
    /// 32-bit float depth
    Depth32Float,
    /// 24-bit depth, 8-bit stencil
    Depth24Stencil8,
}

impl TextureFormat {
    /// Whether this format can back a depth attachment
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth32Float | Self::Depth24Stencil8)
    }
}

/// Filtering mode for samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Linear interpolation
    #[default]
    Linear,
}

/// Addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Repeat the texture
    #[default]
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
    /// Mirror on every repeat
    MirrorRepeat,
}

/// Primitive assembly for pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Independent triangles
    #[default]
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Independent lines
    LineList,
    /// Points
    PointList,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Draw both faces
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    #[default]
    Back,
}

/// Colour blending preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Overwrite the destination
    #[default]
    Opaque,
    /// Standard alpha blending
    AlphaBlend,
    /// Additive blending
    Additive,
}

/// Buffer creation description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescription {
    /// Debug label
    pub label: String,
    /// Size in bytes
    pub size: u64,
    /// Intended bindings
    pub usage: BufferUsage,
    /// Optional initial contents; must not exceed `size`
    pub initial_data: Option<Vec<u8>>,
}

impl BufferDescription {
    /// Empty buffer of `size` bytes
    pub fn new(label: impl Into<String>, size: u64, usage: BufferUsage) -> Self {
        Self {
            label: label.into(),
            size,
            usage,
            initial_data: None,
        }
    }

    /// Buffer sized and filled from a slice of plain-old-data values
    pub fn with_data<T: bytemuck::Pod>(label: impl Into<String>, data: &[T], usage: BufferUsage) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self {
            label: label.into(),
            size: bytes.len() as u64,
            usage,
            initial_data: Some(bytes.to_vec()),
        }
    }

    /// Reject zero-sized, oversized or overfilled buffers
    pub fn validate(&self) -> ResourceResult<()> {
        if self.size == 0 {
            return Err(ResourceError::invalid_description(ResourceType::Buffer, "size must be non-zero"));
        }
        if self.size > MAX_BUFFER_SIZE {
            return Err(ResourceError::invalid_description(
                ResourceType::Buffer,
                format!("size {} exceeds the maximum of {}", self.size, MAX_BUFFER_SIZE),
            ));
        }
        if self.usage.is_empty() {
            return Err(ResourceError::invalid_description(ResourceType::Buffer, "no usage flags set"));
        }
        if let Some(data) = &self.initial_data {
            if data.len() as u64 > self.size {
                return Err(ResourceError::invalid_description(
                    ResourceType::Buffer,
                    format!("{} bytes of initial data exceed size {}", data.len(), self.size),
                ));
            }
        }
        Ok(())
    }
}

/// Texture creation description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescription {
    /// Debug label
    pub label: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Number of mip levels, at least 1
    pub mip_levels: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Intended bindings
    pub usage: TextureUsage,
}

impl TextureDescription {
    /// Single-mip sampled 2D texture
    pub fn new_2d(label: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            mip_levels: 1,
            format,
            usage: TextureUsage::SAMPLED,
        }
    }

    /// Colour or depth attachment, picked from the format
    pub fn render_target(label: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        let usage = if format.is_depth() {
            TextureUsage::DEPTH_STENCIL
        } else {
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED
        };
        Self {
            usage,
            ..Self::new_2d(label, width, height, format)
        }
    }

    /// Mip levels of a full chain for this size
    pub fn full_mip_chain(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Reject empty, oversized or inconsistent textures
    pub fn validate(&self) -> ResourceResult<()> {
        let kind = ResourceType::Texture;
        if self.width == 0 || self.height == 0 {
            return Err(ResourceError::invalid_description(
                kind,
                format!("extent {}x{} is empty", self.width, self.height),
            ));
        }
        if self.width > MAX_TEXTURE_DIMENSION || self.height > MAX_TEXTURE_DIMENSION {
            return Err(ResourceError::invalid_description(
                kind,
                format!("extent {}x{} exceeds {}", self.width, self.height, MAX_TEXTURE_DIMENSION),
            ));
        }
        if self.mip_levels == 0 || self.mip_levels > self.full_mip_chain() {
            return Err(ResourceError::invalid_description(
                kind,
                format!("{} mip levels, expected 1..={}", self.mip_levels, self.full_mip_chain()),
            ));
        }
        if self.usage.contains(TextureUsage::DEPTH_STENCIL) != self.format.is_depth() {
            return Err(ResourceError::invalid_description(
                kind,
                format!("{:?} does not match usage {:?}", self.format, self.usage),
            ));
        }
        Ok(())
    }
}

/// Sampler creation description
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SamplerDescription {
    /// Magnification filter
    pub mag_filter: FilterMode,
    /// Minification filter
    pub min_filter: FilterMode,
    /// Addressing for all axes
    pub address_mode: AddressMode,
    /// Anisotropy clamp, 1 disables it
    pub max_anisotropy: u8,
    /// Lowest mip level to sample
    pub lod_min: f32,
    /// Highest mip level to sample
    pub lod_max: f32,
}

impl SamplerDescription {
    /// Linear filtering with repeat addressing
    pub fn linear() -> Self {
        Self {
            max_anisotropy: 1,
            lod_max: f32::MAX,
            ..Self::default()
        }
    }

    /// Nearest filtering, clamped to edge
    pub fn point_clamp() -> Self {
        Self {
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            address_mode: AddressMode::ClampToEdge,
            ..Self::linear()
        }
    }

    /// Reject inverted LOD ranges and out of range anisotropy
    pub fn validate(&self) -> ResourceResult<()> {
        let kind = ResourceType::Sampler;
        if !(1..=16).contains(&self.max_anisotropy) {
            return Err(ResourceError::invalid_description(
                kind,
                format!("anisotropy {} outside 1..=16", self.max_anisotropy),
            ));
        }
        if self.lod_min.is_nan() || self.lod_max.is_nan() || self.lod_min > self.lod_max {
            return Err(ResourceError::invalid_description(
                kind,
                format!("invalid LOD range {}..{}", self.lod_min, self.lod_max),
            ));
        }
        Ok(())
    }
}

/// Framebuffer creation description
///
/// Attachments are texture handles; the device resolves them before the
/// backend sees the description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDescription {
    /// Debug label
    pub label: String,
    /// Colour attachments, in binding order
    pub color_attachments: Vec<Handle<Texture>>,
    /// Optional depth/stencil attachment
    pub depth_attachment: Option<Handle<Texture>>,
}

impl FramebufferDescription {
    /// Framebuffer with a single colour attachment
    pub fn with_color(label: impl Into<String>, color: Handle<Texture>) -> Self {
        Self {
            label: label.into(),
            color_attachments: vec![color],
            depth_attachment: None,
        }
    }

    /// Add a depth attachment
    pub fn depth(mut self, depth: Handle<Texture>) -> Self {
        self.depth_attachment = Some(depth);
        self
    }

    /// Reject framebuffers with nothing to render into
    pub fn validate(&self) -> ResourceResult<()> {
        let kind = ResourceType::Framebuffer;
        if self.color_attachments.is_empty() && self.depth_attachment.is_none() {
            return Err(ResourceError::invalid_description(kind, "no attachments"));
        }
        if self.color_attachments.len() > MAX_COLOR_ATTACHMENTS {
            return Err(ResourceError::invalid_description(
                kind,
                format!("{} colour attachments exceed {}", self.color_attachments.len(), MAX_COLOR_ATTACHMENTS),
            ));
        }
        Ok(())
    }
}

/// One compiled shader stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStageSource {
    /// Stage this bytecode runs at
    pub stage: ShaderStages,
    /// Entry point name
    pub entry_point: String,
    /// Compiled bytecode (SPIR-V, DXIL, ...)
    pub bytecode: Vec<u8>,
}

/// Shader program creation description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescription {
    /// Debug label
    pub label: String,
    /// Stages making up the program
    pub stages: Vec<ShaderStageSource>,
}

impl ShaderDescription {
    /// Vertex + fragment program with `main` entry points
    pub fn graphics(label: impl Into<String>, vertex: Vec<u8>, fragment: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            stages: vec![
                ShaderStageSource {
                    stage: ShaderStages::VERTEX,
                    entry_point: "main".to_string(),
                    bytecode: vertex,
                },
                ShaderStageSource {
                    stage: ShaderStages::FRAGMENT,
                    entry_point: "main".to_string(),
                    bytecode: fragment,
                },
            ],
        }
    }

    /// Union of all stages in the program
    pub fn stage_flags(&self) -> ShaderStages {
        self.stages.iter().fold(ShaderStages::empty(), |acc, s| acc | s.stage)
    }

    /// Reject empty programs, duplicate stages and compute mixed with graphics
    pub fn validate(&self) -> ResourceResult<()> {
        let kind = ResourceType::Shader;
        if self.stages.is_empty() {
            return Err(ResourceError::invalid_description(kind, "no stages"));
        }
        let mut seen = ShaderStages::empty();
        for source in &self.stages {
            if source.stage.bits().count_ones() != 1 {
                return Err(ResourceError::invalid_description(
                    kind,
                    format!("stage {:?} must name exactly one stage", source.stage),
                ));
            }
            if seen.contains(source.stage) {
                return Err(ResourceError::invalid_description(
                    kind,
                    format!("duplicate stage {:?}", source.stage),
                ));
            }
            if source.bytecode.is_empty() {
                return Err(ResourceError::invalid_description(
                    kind,
                    format!("{:?} stage has no bytecode", source.stage),
                ));
            }
            seen |= source.stage;
        }
        if seen.contains(ShaderStages::COMPUTE) && seen != ShaderStages::COMPUTE {
            return Err(ResourceError::invalid_description(kind, "compute mixed with graphics stages"));
        }
        Ok(())
    }
}

/// Graphics pipeline creation description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescription {
    /// Debug label
    pub label: String,
    /// Shader program; resolved by the device before construction
    pub shader: Handle<Shader>,
    /// Primitive assembly
    pub topology: PrimitiveTopology,
    /// Face culling
    pub cull_mode: CullMode,
    /// Colour blending
    pub blend: BlendMode,
    /// Whether depth testing is enabled
    pub depth_test: bool,
}

impl PipelineDescription {
    /// Opaque, depth tested, back-face culled triangles
    pub fn new(label: impl Into<String>, shader: Handle<Shader>) -> Self {
        Self {
            label: label.into(),
            shader,
            topology: PrimitiveTopology::default(),
            cull_mode: CullMode::default(),
            blend: BlendMode::default(),
            depth_test: true,
        }
    }
}
