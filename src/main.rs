//! glyphcam binary: CLI dispatch and the preview/record loop.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;

use glyphcam::audio::list_input_devices;
use glyphcam::camera::{list_devices, CameraSettings, FrameSource};
use glyphcam::cli::{Args, Charset, Command, ConfigAction, ResolutionPreset};
use glyphcam::config::{self, Config};
use glyphcam::output;
use glyphcam::render::{FontAtlas, GlyphRenderer, RenderConfig};
use glyphcam::session::RecordingSession;

/// Polling interval of the render loop (~30 Hz ceiling).
const TICK: Duration = Duration::from_millis(33);

/// Global flag set by the Ctrl+C handler.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, stopping...");
    })
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = match &args.command {
        Some(Command::ListCameras) => cmd_list_cameras(),
        Some(Command::ListAudioDevices) => cmd_list_audio_devices(),
        Some(Command::Config { action }) => cmd_config(action.clone(), args.config.as_deref()),
        None => run(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_list_cameras() -> Result<(), Box<dyn Error>> {
    let devices = list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
    } else {
        for device in devices {
            println!("{}", device);
        }
    }
    Ok(())
}

fn cmd_list_audio_devices() -> Result<(), Box<dyn Error>> {
    let devices = list_input_devices()?;
    if devices.is_empty() {
        println!("No audio input devices found.");
    } else {
        for (i, name) in devices.iter().enumerate() {
            println!("[{}] {}", i, name);
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load(path)?;
            println!("{:#?}", config);
        }
        ConfigAction::Init => {
            let path = path
                .map(Path::to_path_buf)
                .unwrap_or_else(config::default_path);
            if path.exists() {
                return Err(format!("Config file already exists at {}", path.display()).into());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, config::CONFIG_TEMPLATE)?;
            println!("Created {}", path.display());
        }
    }
    Ok(())
}

/// Settings resolved from CLI args, the config file, and built-in defaults.
struct Resolved {
    camera: CameraSettings,
    render: RenderConfig,
    font: Option<PathBuf>,
    font_size: f32,
    video_dir: PathBuf,
    picture_dir: PathBuf,
}

/// Merge settings: CLI args > config file > built-in defaults.
fn resolve_settings(args: &Args, cfg: &Config) -> Resolved {
    let resolution = args
        .resolution
        .or_else(|| {
            cfg.camera
                .resolution
                .as_deref()
                .and_then(ResolutionPreset::from_name)
        })
        .unwrap_or(ResolutionPreset::P720)
        .to_resolution();

    let camera = CameraSettings {
        device_index: args.camera.unwrap_or(cfg.camera.device),
        resolution,
        fps: cfg.camera.fps,
        // --no-mirror always wins over the config default
        mirror: cfg.camera.mirror && !args.no_mirror,
    };

    let ramp = args
        .charset
        .or_else(|| cfg.glyph.charset.as_deref().and_then(Charset::from_name))
        .unwrap_or_default()
        .to_ramp();

    let render = RenderConfig {
        width: resolution.width,
        height: resolution.height,
        ramp,
        color_mode: args.color || cfg.glyph.color,
        invert: args.invert || cfg.glyph.invert,
    };

    Resolved {
        camera,
        render,
        font: args.font.clone().or_else(|| cfg.glyph.font.clone()),
        font_size: args.font_size.unwrap_or(cfg.glyph.font_size),
        video_dir: args
            .output_dir
            .clone()
            .or_else(|| cfg.output.videos.clone())
            .unwrap_or_else(output::default_video_dir),
        picture_dir: args
            .output_dir
            .clone()
            .or_else(|| cfg.output.pictures.clone())
            .unwrap_or_else(output::default_picture_dir),
    }
}

/// Preview/record loop: poll the latest frame at a fixed cadence, render
/// it, and forward the rendered image to the active recording session.
fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let cfg = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            if args.config.is_some() {
                return Err(e.into());
            }
            eprintln!("Warning: {}", e);
            eprintln!("Using default settings.\n");
            Config::default()
        }
    };
    let resolved = resolve_settings(args, &cfg);

    let font = FontAtlas::load(resolved.font.as_deref(), resolved.font_size)?;
    let mut renderer = GlyphRenderer::new(font, resolved.render.clone());

    let mut source = FrameSource::open(resolved.camera.clone())?;
    source.start()?;

    if args.snapshot {
        let result = take_snapshot(&source, &mut renderer, &resolved.picture_dir);
        source.stop();
        let path = result?;
        println!("Image saved to {}", path.display());
        return Ok(());
    }

    setup_ctrlc_handler()?;

    let mut session = if args.record {
        let s = RecordingSession::start(
            resolved.render.width,
            resolved.render.height,
            args.audio_device.as_deref(),
            resolved.video_dir.clone(),
        )?;
        println!("Recording... press Ctrl+C to stop.");
        Some(s)
    } else {
        println!("Previewing... press Ctrl+C to stop.");
        None
    };

    let started = Instant::now();
    let mut last_tick = Instant::now();
    let mut ticks = 0u64;

    loop {
        if ctrlc_received() {
            break;
        }
        if let Some(limit) = args.duration {
            if started.elapsed() >= Duration::from_secs(limit) {
                break;
            }
        }

        if let Some(frame) = source.latest() {
            let image = renderer.render(&frame);
            if let Some(active) = session.as_mut() {
                if let Err(e) = active.forward_frame(&image) {
                    // Tear the session down cleanly before surfacing the error
                    source.stop();
                    return Err(e.into());
                }
            }
        }

        ticks += 1;
        if ticks % 64 == 0 {
            let fps = 64.0 / last_tick.elapsed().as_secs_f64();
            last_tick = Instant::now();
            log::info!("render loop at {:.1} fps", fps);
        }

        std::thread::sleep(TICK);
    }

    let result = match session.take() {
        Some(active) => {
            let frames = active.frame_count();
            active.stop().map(|path| Some((path, frames)))
        }
        None => Ok(None),
    };
    source.stop();

    if let Some((path, frames)) = result? {
        println!("Video saved to {} ({} frames)", path.display(), frames);
    }
    Ok(())
}

/// Wait for the first frame, render it, and save a still image.
fn take_snapshot(
    source: &FrameSource,
    renderer: &mut GlyphRenderer<FontAtlas>,
    dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let frame = loop {
        if let Some(frame) = source.latest() {
            break frame;
        }
        if Instant::now() >= deadline {
            return Err("Timed out waiting for the first camera frame".into());
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let image = renderer.render(&frame);
    Ok(output::save_snapshot(&image, dir)?)
}
