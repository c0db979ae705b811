//! Starfield view: drifting stars, a floating 3D text label, and the
//! lifecycle that mounts them into a host and tears them down again.
//!
//! # Invariants
//! - Every star stays within `z ∈ [-extent, extent)`; crossing the far bound
//!   recycles it within the same tick.
//! - At most one label exists, and only once the typeface is ready and the
//!   text is non-empty. Replacing it releases the previous geometry and
//!   material first.
//! - While mounted, exactly one frame request and one resize listener are
//!   registered with the host. After unmount, none are.
//! - Ticks run one at a time and only for the loop's pending frame handle.
//!
//! # Workaround
//! Hosts never call back into the view. The embedding event loop takes the
//! due frame from its host and passes it to [`StarfieldView::on_frame`],
//! which keeps the view free of shared ownership.

mod assembly;
mod config;
mod error;
pub mod font;
mod headless;
mod host;
mod label;
mod lifecycle;
mod render_loop;
pub mod slug;
mod stars;
mod viewport;

#[cfg(test)]
mod testing;

pub use assembly::{SceneContext, assemble};
pub use config::{
    CameraConfig, ConfigError, LabelConfig, LightConfig, RenderConfig, StarConfig,
    StarfieldConfig,
};
pub use error::ViewError;
pub use font::{FontLoader, FontPoll, FontRequest, FontResolver, ManualFontLoader, ThreadFontLoader};
pub use headless::HeadlessHost;
pub use host::{FrameHandle, FrameScheduler, Host, ListenerId, ResizeSource};
pub use label::{FontState, Label, LabelBuilder};
pub use lifecycle::{StarfieldView, TeardownReport};
pub use render_loop::{LoopState, RenderLoop};
pub use stars::{Star, StarPool};
pub use viewport::ViewportAdapter;

pub fn crate_info() -> &'static str {
    "starscape-view v0.1.0"
}
