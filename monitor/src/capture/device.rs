use crate::settings::config::CameraSettings;
use log::{debug, info};
use samcamcore::prelude::{CaptureError, Frame, FrameSource};
use std::fs::File;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// V4L2 camera read through `ffmpeg`, one JPEG per capture.
pub struct CameraDevice {
    path: PathBuf,
    width: u32,
    height: u32,
    ramp_frames: u32,
    handle: Option<File>,
}

impl CameraDevice {
    pub fn new(index: u32, settings: &CameraSettings) -> Self {
        Self {
            path: PathBuf::from(format!("/dev/video{}", index)),
            width: settings.width,
            height: settings.height,
            ramp_frames: settings.ramp_frames,
            handle: None,
        }
    }

    fn ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "v4l2".into(),
            "-video_size".into(),
            format!("{}x{}", self.width, self.height),
            "-i".into(),
            self.path.display().to_string(),
            "-vf".into(),
            format!("select=gte(n\\,{})", self.ramp_frames),
            "-frames:v".into(),
            "1".into(),
            "-f".into(),
            "image2pipe".into(),
            "-vcodec".into(),
            "mjpeg".into(),
            "-".into(),
        ]
    }
}

impl FrameSource for CameraDevice {
    fn open(&mut self) -> Result<(), CaptureError> {
        let file = File::open(&self.path).map_err(|err| {
            CaptureError::DeviceUnavailable(format!("{}: {}", self.path.display(), err))
        })?;

        let version = Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map_err(|err| CaptureError::DeviceUnavailable(format!("ffmpeg not found: {}", err)))?;
        if !version.status.success() {
            return Err(CaptureError::DeviceUnavailable(
                "ffmpeg -version exited with an error".into(),
            ));
        }

        self.handle = Some(file);
        info!("camera {} opened", self.path.display());
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        if self.handle.is_none() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is not open",
                self.path.display()
            )));
        }

        let output = Command::new("ffmpeg")
            .args(self.ffmpeg_args())
            .output()
            .map_err(|err| CaptureError::FrameRead(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::FrameRead(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = output.stdout;
        if !is_jpeg(&bytes) {
            return Err(CaptureError::FrameRead(format!(
                "expected a JPEG frame, got {} bytes",
                bytes.len()
            )));
        }

        let name = frame_name(SystemTime::now());
        debug!("captured {} ({} bytes)", name, bytes.len());
        Ok(Frame::new(name, bytes))
    }

    fn release(&mut self) {
        if self.handle.take().is_some() {
            info!("camera {} closed", self.path.display());
        }
    }
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == 0xFF && bytes[1] == 0xD8
}

pub fn frame_name(at: SystemTime) -> String {
    let secs = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("photo_{}.jpg", secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ffmpeg_args_skip_ramp_frames() {
        let camera = CameraDevice::new(2, &CameraSettings::default());
        let args = camera.ffmpeg_args();
        assert!(args.contains(&"/dev/video2".to_string()));
        assert!(args.contains(&"1280x720".to_string()));
        assert!(args.contains(&"select=gte(n\\,30)".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }

    #[test]
    fn capture_before_open_is_rejected() {
        let mut camera = CameraDevice::new(7, &CameraSettings::default());
        assert!(matches!(
            camera.capture(),
            Err(CaptureError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn missing_device_fails_to_open() {
        let mut camera = CameraDevice::new(4242, &CameraSettings::default());
        assert!(camera.open().is_err());
        camera.release();
    }

    #[test]
    fn frame_names_use_unix_seconds() {
        let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(frame_name(at), "photo_1700000000.jpg");
    }

    #[test]
    fn jpeg_magic_is_checked() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(b"ffmpeg: error"));
        assert!(!is_jpeg(&[]));
    }
}
