//! Font resource acquisition.
//!
//! A font source is either a local file or an HTTP(S) URL. Both resolve to
//! typeface JSON which is handed to the renderer's typeface parser. Fetching
//! is blocking; callers that must not stall run it off the frame thread.

use serde::{Deserialize, Serialize};
use starscape_render::{Typeface, TypefaceError};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default typeface used for the floating label.
pub const DEFAULT_FONT_URL: &str =
    "https://threejs.org/examples/fonts/helvetiker_regular.typeface.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a typeface comes from.
///
/// Serialized as a plain string: anything with an http(s) scheme is a URL,
/// everything else a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FontSource {
    Url(String),
    Path(PathBuf),
}

impl FontSource {
    /// Interpret `spec` as a URL when it has an http(s) scheme and as a
    /// filesystem path otherwise.
    pub fn parse(spec: &str) -> Self {
        if spec.starts_with("http://") || spec.starts_with("https://") {
            Self::Url(spec.to_string())
        } else {
            Self::Path(PathBuf::from(spec))
        }
    }
}

impl Default for FontSource {
    fn default() -> Self {
        Self::Url(DEFAULT_FONT_URL.to_string())
    }
}

impl From<String> for FontSource {
    fn from(spec: String) -> Self {
        Self::parse(&spec)
    }
}

impl From<FontSource> for String {
    fn from(source: FontSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors from font acquisition.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("font server answered with status {0}")]
    Status(u16),
    #[error("typeface parse error: {0}")]
    Parse(#[from] TypefaceError),
    #[error("font request was dropped before completing")]
    Canceled,
}

/// Read the raw typeface bytes from `source`.
pub fn fetch_font_bytes(source: &FontSource) -> Result<Vec<u8>, FontError> {
    match source {
        FontSource::Path(path) => {
            tracing::debug!(path = %path.display(), "reading font file");
            Ok(std::fs::read(path)?)
        }
        FontSource::Url(url) => {
            tracing::debug!(url, "fetching font");
            let client = reqwest::blocking::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()?;
            let response = client.get(url).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(FontError::Status(status.as_u16()));
            }
            Ok(response.bytes()?.to_vec())
        }
    }
}

/// Fetch and parse a typeface.
pub fn load_typeface(source: &FontSource) -> Result<Typeface, FontError> {
    let bytes = fetch_font_bytes(source)?;
    let typeface = Typeface::from_slice(&bytes)?;
    tracing::info!(
        family = typeface.family(),
        glyphs = typeface.glyph_count(),
        %source,
        "typeface loaded"
    );
    Ok(typeface)
}

pub fn crate_info() -> &'static str {
    "starscape-assets v0.1.0"
}
