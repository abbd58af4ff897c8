use anyhow::Context;
use samcamcore::prelude::{ConfigurationError, MonitorConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// WiZ local-control UDP port, used when `LIGHT_PORT` is unset.
pub const DEFAULT_LIGHT_PORT: u16 = 38899;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Index of `/dev/video<N>`.
    pub video_device: Option<u32>,
    pub width: u32,
    pub height: u32,
    /// Frames discarded before the captured one so exposure can settle.
    pub ramp_frames: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            video_device: None,
            width: 1280,
            height: 720,
            ramp_frames: 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash-lite".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub ip: Option<String>,
    pub port: u16,
    pub skip: bool,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            ip: None,
            port: DEFAULT_LIGHT_PORT,
            skip: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub monitor: MonitorConfig,
    pub camera: CameraSettings,
    /// Directory of JPEGs used instead of the camera.
    pub mock_dir: Option<PathBuf>,
    pub mock_seed: Option<u64>,
    pub vision: VisionSettings,
    pub light: LightSettings,
    pub debug: bool,
    pub debug_frames_dir: PathBuf,
    pub status_addr: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            camera: CameraSettings::default(),
            mock_dir: None,
            mock_seed: None,
            vision: VisionSettings::default(),
            light: LightSettings::default(),
            debug: false,
            debug_frames_dir: PathBuf::from("tmp"),
            status_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading settings {}", path_ref.display()))?;
        let settings: Settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing settings {}", path_ref.display()))?;
        Ok(settings)
    }

    /// Overlays the documented environment variables. `lookup` is usually
    /// `std::env::var` but tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|v| !v.is_empty()) {
            self.vision.api_key = Some(key);
        }

        if let Some(device) = lookup("VIDEO_DEVICE") {
            let index = device
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigurationError::Invalid {
                    field: "VIDEO_DEVICE",
                    reason: format!("must be an integer, got {:?}", device),
                })?;
            self.camera.video_device = Some(index);
        }

        if let Some(ip) = lookup("LIGHT_IP").filter(|v| !v.is_empty()) {
            self.light.ip = Some(ip);
        }

        if let Some(port) = lookup("LIGHT_PORT") {
            self.light.port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigurationError::Invalid {
                    field: "LIGHT_PORT",
                    reason: format!("must be a port number, got {:?}", port),
                })?;
        }

        if let Some(skip) = lookup("SKIP_LIGHT") {
            self.light.skip = is_truthy(&skip);
        }

        if let Some(debug) = lookup("DEBUG") {
            self.debug = debug.trim() == "1";
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.monitor.validate()?;

        if self.vision.api_key.is_none() {
            return Err(ConfigurationError::Missing("GEMINI_API_KEY"));
        }
        if self.mock_dir.is_none() && self.camera.video_device.is_none() {
            return Err(ConfigurationError::Missing("VIDEO_DEVICE"));
        }
        if !self.light.skip && self.light.ip.is_none() {
            return Err(ConfigurationError::Missing("LIGHT_IP"));
        }
        Ok(())
    }

    pub fn to_monitor_config(&self) -> MonitorConfig {
        self.monitor.clone()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}
