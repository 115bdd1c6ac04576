//! Resource storage primitives
//!
//! - `pool`: the generation-validated slot pool
//! - `handle`: typed opaque handles and resource kinds
//! - `descriptors`: creation descriptions handed to backends

pub mod descriptors;
pub mod handle;
pub mod pool;

pub use descriptors::*;
pub use handle::{Buffer, Framebuffer, Handle, Pipeline, ResourceKind, ResourceType, Sampler, Shader, Texture};
pub use pool::{PoolHandle, PoolStats, SlotPool};
