//! The environment a view is mounted into.
//!
//! A host owns the display: it creates renderers bound to its mount point,
//! fires frame callbacks once per display refresh, and delivers resize
//! events. Hosts never call into the view themselves; the embedding event
//! loop asks the host which frame is due and hands that handle to
//! [`StarfieldView::on_frame`](crate::StarfieldView::on_frame).

use starscape_common::Viewport;
use starscape_render::{RenderError, Renderer, RendererOptions};

/// Registration returned by [`FrameScheduler::request_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Registration returned by [`ResizeSource::add_resize_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Per-frame callback facility.
pub trait FrameScheduler {
    /// Ask for one callback at the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a pending request. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Global resize notifications.
pub trait ResizeSource {
    fn add_resize_listener(&mut self) -> ListenerId;

    fn remove_resize_listener(&mut self, id: ListenerId);
}

/// Everything a mounted view needs from its environment.
pub trait Host: FrameScheduler + ResizeSource {
    type Renderer: Renderer;

    /// Current size of the mount point.
    fn viewport(&self) -> Viewport;

    /// Create a renderer and attach its output surface to the mount point.
    fn create_renderer(&mut self, options: RendererOptions) -> Result<Self::Renderer, RenderError>;

    /// Dispose `renderer` and detach its output surface from the mount point.
    fn release_renderer(&mut self, renderer: Self::Renderer);
}
