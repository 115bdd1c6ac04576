//! # Render Resources
//!
//! Generation-validated GPU resource pools and typed handles for a rendering
//! engine's graphics device.
//!
//! ## Features
//!
//! - **Slot Pools**: generic single-owner storage with per-slot generations
//! - **Typed Handles**: copyable `Handle<Buffer>`, `Handle<Texture>`, ... that
//!   can never be mixed up between kinds
//! - **Resource Device**: create/destroy/get per resource kind, with optional
//!   frame-latency deferred release
//! - **Render Target Binder**: stale framebuffer handles degrade to the backbuffer
//! - **Backend Agnostic**: native objects come from a [`GraphicsBackend`](backend::GraphicsBackend)
//!
//! ## Quick Start
//!
//! ```rust
//! use render_resources::prelude::*;
//!
//! fn main() -> Result<(), ResourceError> {
//!     let mut device = ResourceDevice::new(HeadlessBackend::default(), DeviceConfig::default())?;
//!
//!     let color = device.create_texture(&TextureDescription::render_target(
//!         "scene color",
//!         1280,
//!         720,
//!         TextureFormat::Rgba8Unorm,
//!     ))?;
//!     let scene = device.create_framebuffer(&FramebufferDescription::with_color("scene", color))?;
//!
//!     assert!(!device.set_render_target(scene).is_backbuffer());
//!
//!     device.destroy_framebuffer(scene);
//!     assert!(device.set_render_target(scene).is_backbuffer());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod foundation;
pub mod resources;

pub use error::{ResourceError, ResourceResult};

/// Common imports for device users
pub mod prelude {
    pub use crate::{
        backend::{GraphicsBackend, HeadlessBackend},
        config::{Config, ConfigError, DeviceConfig},
        device::{DeviceResource, DeviceStats, RenderTarget, ResourceDevice},
        error::{ResourceError, ResourceResult},
        resources::{
            descriptors::*,
            handle::{Buffer, Framebuffer, Handle, Pipeline, ResourceKind, ResourceType, Sampler, Shader, Texture},
            pool::{PoolHandle, PoolStats, SlotPool},
        },
    };
}
