//! Render target binding with backbuffer fallback
//!
//! The binder has two states, [`RenderTarget::Backbuffer`] and
//! [`RenderTarget::Bound`]. Every [`ResourceDevice::set_render_target`] call
//! re-evaluates from the presented handle alone: a handle that resolves in
//! the framebuffer pool is bound, anything else (sentinel, stale generation,
//! out of range, released) silently binds the backbuffer.

use crate::backend::GraphicsBackend;
use crate::device::ResourceDevice;
use crate::resources::handle::{Framebuffer, Handle};
use crate::resources::pool::SlotPool;

/// What the device currently renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTarget {
    /// The backend's permanent default target
    #[default]
    Backbuffer,
    /// A pooled framebuffer
    Bound(Handle<Framebuffer>),
}

impl RenderTarget {
    /// Decide the next state for `handle`, returning the native target to bind
    ///
    /// `None` means the backbuffer should be bound.
    pub fn transition<T>(handle: Handle<Framebuffer>, framebuffers: &SlotPool<T>) -> (Self, Option<&T>) {
        if !handle.is_valid() {
            return (Self::Backbuffer, None);
        }
        match framebuffers.try_get(handle.to_pool()) {
            Some(native) => (Self::Bound(handle), Some(native)),
            None => (Self::Backbuffer, None),
        }
    }

    /// Whether the backbuffer is the current target
    pub fn is_backbuffer(&self) -> bool {
        matches!(self, Self::Backbuffer)
    }

    /// The bound framebuffer handle, if any
    pub fn framebuffer(&self) -> Option<Handle<Framebuffer>> {
        match self {
            Self::Backbuffer => None,
            Self::Bound(handle) => Some(*handle),
        }
    }
}

impl<B: GraphicsBackend> ResourceDevice<B> {
    /// Bind `handle` as the render target, or the backbuffer if it does not resolve
    ///
    /// Never fails: a stale handle degrades to the backbuffer.
    pub fn set_render_target(&mut self, handle: Handle<Framebuffer>) -> RenderTarget {
        let (state, native) = RenderTarget::transition(handle, &self.pools.framebuffers);
        match native {
            Some(framebuffer) => self.backend.bind_framebuffer(framebuffer),
            None => {
                if handle.is_valid() {
                    log::warn!("[{}] Stale {:?}, binding backbuffer", self.config.label, handle);
                }
                self.backend.bind_default_render_target();
            }
        }
        self.render_target = state;
        state
    }

    /// Bind the backbuffer
    pub fn reset_render_target(&mut self) -> RenderTarget {
        self.set_render_target(Handle::invalid())
    }

    /// Current binder state
    pub fn render_target(&self) -> RenderTarget {
        self.render_target
    }

    /// Native object of the current render target
    pub fn current_render_target(&self) -> &B::Framebuffer {
        self.render_target
            .framebuffer()
            .and_then(|handle| self.pools.framebuffers.try_get(handle.to_pool()))
            .unwrap_or_else(|| self.backend.default_render_target())
    }
}
