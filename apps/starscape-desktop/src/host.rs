use starscape_common::Viewport;
use starscape_render::{RenderError, Renderer, RendererOptions};
use starscape_render_wgpu::WgpuRenderer;
use starscape_view::{FrameHandle, FrameScheduler, Host, ListenerId, ResizeSource};
use std::collections::BTreeSet;
use std::sync::Arc;
use winit::window::Window;

/// A winit window acting as the view's mount point.
///
/// A frame request becomes a redraw request; the next `RedrawRequested`
/// event delivers it.
pub struct DesktopHost {
    window: Arc<Window>,
    instance: wgpu::Instance,
    pending: Option<FrameHandle>,
    listeners: BTreeSet<ListenerId>,
    next_id: u64,
}

impl DesktopHost {
    pub fn new(window: Arc<Window>) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Self {
            window,
            instance,
            pending: None,
            listeners: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// The frame a redraw was requested for, if it is still wanted.
    pub fn take_due_frame(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn has_resize_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl FrameScheduler for DesktopHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

impl ResizeSource for DesktopHost {
    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}

impl Host for DesktopHost {
    type Renderer = WgpuRenderer;

    fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height)
    }

    fn create_renderer(&mut self, options: RendererOptions) -> Result<WgpuRenderer, RenderError> {
        let surface = self
            .instance
            .create_surface(self.window.clone())
            .map_err(|e| RenderError::Surface(e.to_string()))?;
        let viewport = self.viewport();
        pollster::block_on(WgpuRenderer::new(
            &self.instance,
            surface,
            viewport.width,
            viewport.height,
            options,
        ))
    }

    fn release_renderer(&mut self, mut renderer: WgpuRenderer) {
        renderer.dispose();
    }
}
