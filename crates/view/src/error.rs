use crate::config::ConfigError;
use starscape_render::RenderError;

/// Errors that can stop a view from mounting.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
