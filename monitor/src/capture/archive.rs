use log::warn;
use samcamcore::prelude::{CaptureError, Frame, FrameSource};
use std::fs;
use std::path::PathBuf;

/// Saves a copy of every captured frame; used in debug mode.
pub struct ArchivingSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: FrameSource> ArchivingSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }
}

impl<S: FrameSource> FrameSource for ArchivingSource<S> {
    fn open(&mut self) -> Result<(), CaptureError> {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!("cannot create frame archive {}: {}", self.dir.display(), err);
        }
        self.inner.open()
    }

    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let frame = self.inner.capture()?;
        let target = self.dir.join(&frame.name);
        if let Err(err) = fs::write(&target, &frame.bytes) {
            warn!("failed to archive frame {}: {}", target.display(), err);
        }
        Ok(frame)
    }

    fn release(&mut self) {
        self.inner.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::MockImageDir;
    use tempfile::tempdir;

    #[test]
    fn captured_frames_are_copied_to_archive() {
        let mocks = tempdir().unwrap();
        fs::write(mocks.path().join("standing.jpg"), [0xFF, 0xD8, 0x02]).unwrap();
        let archive = tempdir().unwrap();
        let archive_dir = archive.path().join("frames");

        let mut source =
            ArchivingSource::new(MockImageDir::new(mocks.path(), Some(3)), &archive_dir);
        source.open().unwrap();
        let frame = source.capture().unwrap();
        source.release();

        let saved = fs::read(archive_dir.join(&frame.name)).unwrap();
        assert_eq!(saved, frame.bytes);
    }
}
