//! Render target binding against a headless device

use render_resources::backend::headless::{BackendCall, HeadlessBackend, BACKBUFFER_ID};
use render_resources::prelude::*;

fn framebuffer_desc(device: &mut ResourceDevice<HeadlessBackend>, label: &str) -> FramebufferDescription {
    let color = device
        .create_texture(&TextureDescription::render_target(label, 256, 256, TextureFormat::Rgba8Unorm))
        .unwrap();
    FramebufferDescription::with_color(label, color)
}

fn last_bind(device: &ResourceDevice<HeadlessBackend>) -> Option<u64> {
    device.backend().calls().iter().rev().find_map(|call| match call {
        BackendCall::Bind(id) => Some(*id),
        _ => None,
    })
}

#[test]
fn test_stale_framebuffer_falls_back_to_backbuffer() {
    let _ = render_resources::foundation::logging::try_init();
    let mut device = ResourceDevice::from_backend(HeadlessBackend::default());

    // Empty pool: the sentinel binds the backbuffer
    assert_eq!(device.set_render_target(Handle::invalid()), RenderTarget::Backbuffer);
    assert_eq!(last_bind(&device), Some(BACKBUFFER_ID));

    let desc = framebuffer_desc(&mut device, "fb1");
    let fb1 = device.create_framebuffer(&desc).unwrap();
    assert_eq!((fb1.id(), fb1.generation()), (0, 1));
    let fb1_native = device.get_framebuffer(fb1).unwrap().id;

    assert_eq!(device.set_render_target(fb1), RenderTarget::Bound(fb1));
    assert_eq!(last_bind(&device), Some(fb1_native));
    assert_eq!(device.current_render_target().id, fb1_native);

    // Destroyed: stale handle degrades silently
    assert!(device.destroy_framebuffer(fb1));
    assert_eq!(device.set_render_target(fb1), RenderTarget::Backbuffer);
    assert_eq!(last_bind(&device), Some(BACKBUFFER_ID));

    // Slot 0 reused with a newer generation
    let desc = framebuffer_desc(&mut device, "fb2");
    let fb2 = device.create_framebuffer(&desc).unwrap();
    assert_eq!((fb2.id(), fb2.generation()), (0, 2));
    let fb2_native = device.get_framebuffer(fb2).unwrap().id;

    assert_eq!(device.set_render_target(fb1), RenderTarget::Backbuffer);
    assert_eq!(last_bind(&device), Some(BACKBUFFER_ID));
    assert_eq!(device.current_render_target().id, BACKBUFFER_ID);

    assert_eq!(device.set_render_target(fb2), RenderTarget::Bound(fb2));
    assert_eq!(last_bind(&device), Some(fb2_native));
    assert_eq!(device.backend().bound_framebuffer(), fb2_native);
}

#[test]
fn test_out_of_range_handle_binds_backbuffer() {
    let mut device = ResourceDevice::from_backend(HeadlessBackend::default());
    let desc = framebuffer_desc(&mut device, "only");
    let only = device.create_framebuffer(&desc).unwrap();
    device.set_render_target(only);

    // A handle issued by another device, past this device's high water mark
    let mut other = ResourceDevice::from_backend(HeadlessBackend::default());
    let foreign = ["a", "b", "c"]
        .into_iter()
        .map(|label| {
            let desc = framebuffer_desc(&mut other, label);
            other.create_framebuffer(&desc).unwrap()
        })
        .last()
        .unwrap();
    assert_eq!(foreign.id(), 2);

    assert!(device.set_render_target(foreign).is_backbuffer());
    assert_eq!(device.backend().bound_framebuffer(), BACKBUFFER_ID);
    assert!(device.set_render_target(Handle::default()).is_backbuffer());
}

#[test]
fn test_destroying_bound_framebuffer_rebinds_backbuffer() {
    let mut device = ResourceDevice::from_backend(HeadlessBackend::default());
    let desc = framebuffer_desc(&mut device, "hud");
    let hud = device.create_framebuffer(&desc).unwrap();
    device.set_render_target(hud);

    device.destroy_framebuffer(hud);
    assert!(device.render_target().is_backbuffer());
    assert_eq!(device.backend().bound_framebuffer(), BACKBUFFER_ID);
    assert_eq!(device.current_render_target().id, BACKBUFFER_ID);
}

#[test]
fn test_deferred_framebuffer_stays_bindable_until_released() {
    let mut device = ResourceDevice::new(HeadlessBackend::default(), DeviceConfig::with_release_latency(1)).unwrap();
    let desc = framebuffer_desc(&mut device, "reflection");
    let reflection = device.create_framebuffer(&desc).unwrap();

    device.destroy_framebuffer(reflection);
    assert_eq!(device.set_render_target(reflection), RenderTarget::Bound(reflection));

    assert_eq!(device.end_frame(), 1);
    assert!(device.render_target().is_backbuffer());
    assert!(device.set_render_target(reflection).is_backbuffer());
}

#[test]
fn test_framebuffer_with_stale_attachment_is_rejected() {
    let mut device = ResourceDevice::from_backend(HeadlessBackend::default());
    let desc = framebuffer_desc(&mut device, "target");
    device.destroy_texture(desc.color_attachments[0]);

    let err = device.create_framebuffer(&desc).unwrap_err();
    assert!(err.is_handle_error());
    assert_eq!(device.stats().framebuffers.allocated, 0);
}

#[test]
fn test_framebuffer_with_depth_attachment() {
    let mut device = ResourceDevice::from_backend(HeadlessBackend::default());
    let depth = device
        .create_texture(&TextureDescription::render_target("depth", 256, 256, TextureFormat::Depth32Float))
        .unwrap();
    let desc = framebuffer_desc(&mut device, "lit").depth(depth);
    let lit = device.create_framebuffer(&desc).unwrap();

    let depth_id = device.get_texture(depth).unwrap().id;
    let native = device.get_framebuffer(lit).unwrap();
    assert_eq!(native.depth_id, Some(depth_id));
    assert_eq!(native.extent, (256, 256));
}
