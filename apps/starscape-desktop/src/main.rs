mod host;

use anyhow::Result;
use clap::Parser;
use host::DesktopHost;
use rand::SeedableRng;
use rand::rngs::StdRng;
use starscape_assets::FontSource;
use starscape_common::Viewport;
use starscape_view::{StarfieldConfig, StarfieldView, ThreadFontLoader, slug};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "starscape-desktop", about = "Starfield with a floating 3D label")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial label text
    #[arg(short, long, conflicts_with = "random_slug")]
    text: Option<String>,

    /// Start with a random theme slug as the label
    #[arg(long)]
    random_slug: bool,

    /// Typeface JSON to use (URL or file path)
    #[arg(long)]
    font: Option<String>,

    /// Initial window width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height
    #[arg(long, default_value = "720")]
    height: u32,
}

/// A keyboard-driven change to the label text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TextEdit {
    Insert(String),
    Backspace,
    Clear,
    Replace(String),
}

/// Apply `edit` to `text`. Returns `true` if the text changed.
fn apply_edit(text: &mut String, edit: TextEdit) -> bool {
    match edit {
        TextEdit::Insert(s) => {
            let printable: String = s.chars().filter(|c| !c.is_control() || *c == '\n').collect();
            text.push_str(&printable);
            !printable.is_empty()
        }
        TextEdit::Backspace => text.pop().is_some(),
        TextEdit::Clear => {
            let changed = !text.is_empty();
            text.clear();
            changed
        }
        TextEdit::Replace(s) => {
            let changed = *text != s;
            *text = s;
            changed
        }
    }
}

struct StarscapeApp {
    config: StarfieldConfig,
    fonts: ThreadFontLoader,
    text: String,
    rng: StdRng,
    window_size: PhysicalSize<u32>,
    host: Option<DesktopHost>,
    view: Option<StarfieldView<DesktopHost>>,
}

impl StarscapeApp {
    fn new(config: StarfieldConfig, text: String, window_size: PhysicalSize<u32>) -> Self {
        Self {
            config,
            fonts: ThreadFontLoader,
            text,
            rng: StdRng::from_os_rng(),
            window_size,
            host: None,
            view: None,
        }
    }

    fn edit_for_key(&mut self, event: &KeyEvent) -> Option<TextEdit> {
        match event.physical_key {
            PhysicalKey::Code(KeyCode::F2) => {
                Some(TextEdit::Replace(slug::random_slug(&mut self.rng)))
            }
            PhysicalKey::Code(KeyCode::Escape) => Some(TextEdit::Clear),
            PhysicalKey::Code(KeyCode::Backspace) => Some(TextEdit::Backspace),
            PhysicalKey::Code(KeyCode::Enter | KeyCode::NumpadEnter) => {
                Some(TextEdit::Insert("\n".into()))
            }
            _ => event
                .text
                .as_ref()
                .map(|t| TextEdit::Insert(t.as_str().to_string())),
        }
    }

    fn unmount(&mut self) {
        if let (Some(view), Some(host)) = (self.view.take(), self.host.as_mut()) {
            let report = view.unmount(host);
            tracing::info!(
                frames = report.frames,
                geometries = report.disposed.geometries,
                materials = report.disposed.materials,
                "view torn down"
            );
        }
    }
}

impl ApplicationHandler for StarscapeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Starscape")
            .with_inner_size(self.window_size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut host = DesktopHost::new(window);
        let text = (!self.text.is_empty()).then_some(self.text.as_str());
        match StarfieldView::mount(self.config.clone(), &mut host, &self.fonts, text) {
            Ok(view) => self.view = Some(view),
            Err(e) => {
                tracing::error!("failed to mount starfield: {e}");
                event_loop.exit();
            }
        }
        self.host = Some(host);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(view), Some(host)) = (self.view.as_mut(), self.host.as_ref()) {
                    if host.has_resize_listeners() {
                        view.on_resize(Viewport::new(size.width, size.height));
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let Some(edit) = self.edit_for_key(&event) else {
                    return;
                };
                if apply_edit(&mut self.text, edit) {
                    tracing::debug!(text = %self.text, "label text changed");
                    if let Some(view) = self.view.as_mut() {
                        view.set_text(Some(&self.text));
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(view), Some(host)) = (self.view.as_mut(), self.host.as_mut()) {
                    if let Some(handle) = host.take_due_frame() {
                        view.on_frame(handle, host);
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.unmount();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("starscape-desktop starting");

    let mut config = match &cli.config {
        Some(path) => StarfieldConfig::from_yaml_file(path)?,
        None => StarfieldConfig::default(),
    };
    if let Some(font) = &cli.font {
        config.label.font = FontSource::parse(font);
    }

    let text = if cli.random_slug {
        slug::random_slug(&mut rand::rng())
    } else {
        cli.text.unwrap_or_default()
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = StarscapeApp::new(config, text, PhysicalSize::new(cli.width, cli.height));
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_appends_printable_text() {
        let mut text = String::from("nova");
        assert!(apply_edit(&mut text, TextEdit::Insert("-7".into())));
        assert_eq!(text, "nova-7");
        assert!(!apply_edit(&mut text, TextEdit::Insert("\u{8}".into())));
        assert_eq!(text, "nova-7");
    }

    #[test]
    fn backspace_and_clear() {
        let mut text = String::from("ab");
        assert!(apply_edit(&mut text, TextEdit::Backspace));
        assert_eq!(text, "a");
        assert!(apply_edit(&mut text, TextEdit::Clear));
        assert!(text.is_empty());
        assert!(!apply_edit(&mut text, TextEdit::Backspace));
        assert!(!apply_edit(&mut text, TextEdit::Clear));
    }

    #[test]
    fn replace_reports_change_only_when_different() {
        let mut text = String::from("comet-1");
        assert!(!apply_edit(&mut text, TextEdit::Replace("comet-1".into())));
        assert!(apply_edit(&mut text, TextEdit::Replace("orbit-2".into())));
        assert_eq!(text, "orbit-2");
    }

    #[test]
    fn newline_is_kept() {
        let mut text = String::from("a");
        assert!(apply_edit(&mut text, TextEdit::Insert("\n".into())));
        assert_eq!(text, "a\n");
    }
}
