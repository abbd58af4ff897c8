use anyhow::Context;
use capture::{ArchivingSource, CameraDevice, MockImageDir};
use clap::Parser;
use light::{NoopLight, WizLight};
use log::{info, warn};
use samcamcore::monitor::shutdown::{self, ShutdownHandle};
use samcamcore::prelude::{AlertAction, ConfigurationError, FrameSource, VisionAnalyzer};
use samcamcore::MonitorLoop;
use settings::config::Settings;
use status_bridge::StatusBridge;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use vision::GeminiAnalyzer;

mod capture;
mod light;
mod settings;
mod status_bridge;
mod vision;

#[derive(Parser)]
#[command(author, version, about = "Watches the dog crate and flashes a light when the dog is restless")]
struct Args {
    /// Load settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    check_interval_seconds: Option<u64>,
    #[arg(long)]
    alert_threshold_minutes: Option<u64>,
    #[arg(long)]
    alert_cooldown_seconds: Option<u64>,
    /// Read frames from a directory of JPEGs instead of the camera
    #[arg(long)]
    mock_dir: Option<PathBuf>,
    /// Never drive the light
    #[arg(long, default_value_t = false)]
    skip_light: bool,
    /// Analyze one image from the mock directory, print it and exit
    #[arg(long, default_value_t = false)]
    analyze_once: bool,
    /// Serve monitor status over HTTP
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    status_addr: Option<SocketAddr>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(secs) = self.check_interval_seconds {
            settings.monitor.check_interval_seconds = secs;
        }
        if let Some(minutes) = self.alert_threshold_minutes {
            settings.monitor.alert_threshold_minutes = minutes;
        }
        if let Some(secs) = self.alert_cooldown_seconds {
            settings.monitor.alert_cooldown_seconds = secs;
        }
        if let Some(dir) = &self.mock_dir {
            settings.mock_dir = Some(dir.clone());
        }
        if self.skip_light {
            settings.light.skip = true;
        }
        if let Some(addr) = self.status_addr {
            settings.status_addr = addr;
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings
        .apply_env(|key| std::env::var(key).ok())
        .context("reading environment")?;
    args.apply(&mut settings);

    init_logging(settings.debug);

    if args.analyze_once {
        return analyze_once(&settings);
    }

    settings.validate().context("invalid configuration")?;

    let source = build_source(&settings)?;
    let analyzer = GeminiAnalyzer::new(&settings.vision)?;
    let light = build_light(&settings);
    let mut monitor = MonitorLoop::new(settings.to_monitor_config(), source, analyzer, light)
        .context("invalid monitor timing")?;

    let (handle, mut signal) = shutdown::channel();
    spawn_interrupt_listener(handle)?;

    if args.serve {
        StatusBridge::spawn(settings.status_addr, monitor.metrics())?;
    }

    let summary = monitor.run(&mut signal).context("monitor terminated")?;
    info!(
        "exiting after {} cycles ({} alerts)",
        summary.cycles, summary.alerts_fired
    );
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn build_source(settings: &Settings) -> Result<Box<dyn FrameSource>, ConfigurationError> {
    let source: Box<dyn FrameSource> = match (&settings.mock_dir, settings.camera.video_device) {
        (Some(dir), _) => {
            info!("using mock frames from {}", dir.display());
            Box::new(MockImageDir::new(dir, settings.mock_seed))
        }
        (None, Some(index)) => Box::new(CameraDevice::new(index, &settings.camera)),
        (None, None) => return Err(ConfigurationError::Missing("VIDEO_DEVICE")),
    };

    if settings.debug {
        Ok(Box::new(ArchivingSource::new(
            source,
            &settings.debug_frames_dir,
        )))
    } else {
        Ok(source)
    }
}

fn build_light(settings: &Settings) -> Box<dyn AlertAction> {
    match (&settings.light.ip, settings.light.skip) {
        (Some(ip), false) => Box::new(WizLight::new(ip, settings.light.port)),
        _ => Box::new(NoopLight),
    }
}

/// Ctrl+C ends the current sleep and stops the loop.
fn spawn_interrupt_listener(handle: ShutdownHandle) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;

    thread::spawn(move || {
        runtime.block_on(async {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, stopping after the current cycle");
                    handle.trigger();
                }
                Err(err) => warn!("unable to listen for Ctrl+C: {}", err),
            }
        });
    });
    Ok(())
}

fn analyze_once(settings: &Settings) -> anyhow::Result<()> {
    let dir = settings
        .mock_dir
        .as_ref()
        .context("--analyze-once needs --mock-dir")?;
    let mut source = MockImageDir::new(dir, settings.mock_seed);
    let mut analyzer = GeminiAnalyzer::new(&settings.vision)?;

    source.open()?;
    let frame = source.capture();
    source.release();
    let frame = frame?;

    println!("Analyzing image: {}", frame.name);
    let result = analyzer.analyze(&frame)?;
    println!(
        "dog={} posture={} panting={:.2}",
        result.is_dog_present(),
        result.posture().as_str(),
        result.panting_probability()
    );
    Ok(())
}
