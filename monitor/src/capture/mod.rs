pub mod archive;
pub mod device;
pub mod mock;

pub use archive::ArchivingSource;
pub use device::CameraDevice;
pub use mock::MockImageDir;
