use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use samcamcore::prelude::{CaptureError, Frame, FrameSource};
use std::fs;
use std::path::{Path, PathBuf};

/// Serves a random JPEG from a directory on every capture.
pub struct MockImageDir {
    dir: PathBuf,
    rng: StdRng,
}

impl MockImageDir {
    pub fn new(dir: impl Into<PathBuf>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            dir: dir.into(),
            rng,
        }
    }

    fn list_images(&self) -> Result<Vec<PathBuf>, CaptureError> {
        let entries = fs::read_dir(&self.dir).map_err(|err| {
            CaptureError::DeviceUnavailable(format!("{}: {}", self.dir.display(), err))
        })?;

        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_jpg_extension(path))
            .collect();
        images.sort();
        Ok(images)
    }
}

fn has_jpg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg"))
        .unwrap_or(false)
}

impl FrameSource for MockImageDir {
    fn open(&mut self) -> Result<(), CaptureError> {
        if !self.dir.is_dir() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let images = self.list_images()?;
        let path = images
            .choose(&mut self.rng)
            .ok_or_else(|| CaptureError::NoFrames(self.dir.display().to_string()))?;

        let bytes = fs::read(path)
            .map_err(|err| CaptureError::FrameRead(format!("{}: {}", path.display(), err)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("mock frame {}", name);
        Ok(Frame::new(name, bytes))
    }

    fn release(&mut self) {}
}
