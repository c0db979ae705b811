use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use starscape_assets::{FontSource, load_typeface};
use starscape_common::Viewport;
use starscape_render::{TextGeometryOptions, build_text_geometry};
use starscape_view::{
    FontState, HeadlessHost, StarfieldConfig, StarfieldView, ThreadFontLoader, slug,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starscape-cli", about = "CLI tool for starscape operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Mount a headless view, run frames, and print the scene
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Label text
        #[arg(short, long)]
        text: Option<String>,
        /// Typeface JSON (URL or file path)
        #[arg(long)]
        font: Option<String>,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seconds to wait for the typeface before running frames
        #[arg(long, default_value = "10")]
        font_timeout: u64,
    },
    /// Load a typeface and report on it
    FontInfo {
        /// Typeface JSON (URL or file path)
        #[arg(long)]
        font: Option<String>,
        /// Build extruded geometry for this text and report its size
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Print random theme slugs
    Slug {
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print the default configuration as YAML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("starscape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", starscape_render::crate_info());
            println!("assets: {}", starscape_assets::crate_info());
            println!("view: {}", starscape_view::crate_info());
        }
        Commands::Simulate {
            frames,
            text,
            font,
            seed,
            width,
            height,
            config,
            font_timeout,
        } => {
            let mut config = match config {
                Some(path) => StarfieldConfig::from_yaml_file(path)?,
                None => StarfieldConfig::default(),
            };
            config.seed = Some(seed);
            if let Some(font) = font {
                config.label.font = FontSource::parse(&font);
            }

            println!(
                "Simulate: frames={frames}, seed={seed}, viewport={width}x{height}, font={}",
                config.label.font
            );

            let mut host = HeadlessHost::new(Viewport::new(width, height));
            let mut view =
                StarfieldView::mount(config, &mut host, &ThreadFontLoader, text.as_deref())?;

            if text.is_some() {
                let deadline = Instant::now() + Duration::from_secs(font_timeout);
                while view.label().font_state().is_pending() && Instant::now() < deadline {
                    std::thread::sleep(Duration::from_millis(10));
                    view.poll_font();
                }
                match view.label().font_state() {
                    FontState::Ready(_) => {}
                    FontState::Failed => {
                        println!("Typeface failed to load; running without a label")
                    }
                    FontState::Idle | FontState::Pending(_) => println!(
                        "Typeface still loading after {font_timeout}s; running without waiting"
                    ),
                }
            }

            for _ in 0..frames {
                let Some(handle) = host.take_due_frame() else {
                    break;
                };
                view.on_frame(handle, &mut host);
            }

            print!("{}", view.renderer().describe(view.scene(), view.camera()));
            if let Some(label) = view.label().label() {
                let node = view.scene().get(label.node);
                if let Some(node) = node {
                    let p = node.transform.position;
                    println!(
                        "Label {:?}: pos=({:.1}, {:.1}, {:.1})",
                        label.text, p.x, p.y, p.z
                    );
                }
            }

            let report = view.unmount(&mut host);
            println!(
                "Teardown: frames={}, nodes={}, geometries={}, materials={}, \
                 pending_frames={}, listeners={}, surfaces={}",
                report.frames,
                report.disposed.nodes,
                report.disposed.geometries,
                report.disposed.materials,
                host.pending_frames(),
                host.resize_listeners(),
                host.attached_surfaces()
            );
        }
        Commands::FontInfo { font, text } => {
            let source = font.map(|f| FontSource::parse(&f)).unwrap_or_default();
            let typeface = load_typeface(&source)?;
            println!("Source: {source}");
            println!("Family: {}", typeface.family());
            println!("Resolution: {}", typeface.resolution());
            println!("Glyphs: {}", typeface.glyph_count());

            let options = TextGeometryOptions::default();
            println!(
                "Line height at size {}: {:.2}",
                options.size,
                typeface.line_height(options.size)
            );

            if let Some(text) = text {
                let mesh = build_text_geometry(&typeface, &text, &options);
                println!(
                    "Text {:?}: vertices={}, triangles={}",
                    text,
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                if let Some(bounds) = mesh.compute_bounding_box() {
                    let size = bounds.size();
                    println!("Bounds: {:.2} x {:.2} x {:.2}", size.x, size.y, size.z);
                }
            }
        }
        Commands::Slug { count, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            for _ in 0..count {
                println!("{}", slug::random_slug(&mut rng));
            }
        }
        Commands::Config => {
            print!("{}", StarfieldConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
