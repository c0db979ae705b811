//! In-process host with no display.
//!
//! Frame callbacks queue up until the driver asks for them with
//! [`HeadlessHost::take_due_frame`]. Used by the CLI and by tests that check
//! the mount/unmount bookkeeping.

use crate::host::{FrameHandle, FrameScheduler, Host, ListenerId, ResizeSource};
use starscape_common::Viewport;
use starscape_render::{HeadlessRenderer, RenderError, Renderer, RendererOptions};
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct HeadlessHost {
    viewport: Viewport,
    frames: BTreeSet<FrameHandle>,
    listeners: BTreeSet<ListenerId>,
    surfaces: usize,
    next_id: u64,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames: BTreeSet::new(),
            listeners: BTreeSet::new(),
            surfaces: 0,
            next_id: 1,
        }
    }

    /// Outstanding frame requests.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Registered resize listeners.
    pub fn resize_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Renderer surfaces currently attached to the mount point.
    pub fn attached_surfaces(&self) -> usize {
        self.surfaces
    }

    /// Pop the oldest outstanding frame request, as a display refresh would.
    pub fn take_due_frame(&mut self) -> Option<FrameHandle> {
        self.frames.pop_first()
    }

    /// Change the mount-point size. Returns the new viewport when any
    /// listener is registered to hear about it.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<Viewport> {
        self.viewport = Viewport::new(width, height);
        (!self.listeners.is_empty()).then_some(self.viewport)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.frames.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.remove(&handle);
    }
}

impl ResizeSource for HeadlessHost {
    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}

impl Host for HeadlessHost {
    type Renderer = HeadlessRenderer;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_renderer(
        &mut self,
        options: RendererOptions,
    ) -> Result<HeadlessRenderer, RenderError> {
        self.surfaces += 1;
        Ok(HeadlessRenderer::new(
            options,
            self.viewport.width,
            self.viewport.height,
        ))
    }

    fn release_renderer(&mut self, mut renderer: HeadlessRenderer) {
        renderer.dispose();
        self.surfaces = self.surfaces.saturating_sub(1);
    }
}
