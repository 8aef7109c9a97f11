use embedded_sdmmc::{
    Error, Mode, RawDirectory, RawFile, SdCard, SdCardError, TimeSource, VolumeIdx, VolumeManager,
};
use log::{info, warn};

use super::StorageMedium;

/// FAT-formatted SD card on an SPI bus.
///
/// Uses the raw handle API of `embedded_sdmmc` so the open session file can
/// live alongside the volume manager instead of borrowing it. The root
/// directory of the first partition is opened once, on mount, and stays open.
///
/// All operations block on the SPI bus.
pub struct SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    volume_mgr: VolumeManager<SdCard<S, D>, T, 4, 4, 1>,
    root_dir: Option<RawDirectory>,
}

impl<S, D, T> SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    pub fn new(sd_card: SdCard<S, D>, ts: T) -> Self {
        let volume_mgr = VolumeManager::new(sd_card, ts);

        Self {
            volume_mgr,
            root_dir: None,
        }
    }

    fn root_dir(&self) -> Result<RawDirectory, Error<SdCardError>> {
        self.root_dir.ok_or(Error::BadHandle)
    }
}

impl<S, D, T> StorageMedium for SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    type File = RawFile;
    type Error = Error<SdCardError>;

    fn mount(&mut self) -> Result<(), Self::Error> {
        if self.root_dir.is_some() {
            return Ok(());
        }

        // Card initialisation happens on first access, so a missing card fails here
        let volume0 = self.volume_mgr.open_raw_volume(VolumeIdx(0))?;
        let root_dir = self.volume_mgr.open_root_dir(volume0)?;
        self.root_dir = Some(root_dir);
        info!("SD card volume 0 mounted");

        Ok(())
    }

    fn exists(&mut self, name: &str) -> Result<bool, Self::Error> {
        let root_dir = self.root_dir()?;

        match self.volume_mgr.find_directory_entry(root_dir, name) {
            Ok(_) => Ok(true),
            Err(Error::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn create(&mut self, name: &str) -> Result<RawFile, Self::Error> {
        let root_dir = self.root_dir()?;

        // ReadWriteCreate refuses an existing name rather than truncating it
        self.volume_mgr
            .open_file_in_dir(root_dir, name, Mode::ReadWriteCreate)
    }

    fn write(&mut self, file: &mut RawFile, bytes: &[u8]) -> Result<(), Self::Error> {
        self.volume_mgr.write(*file, bytes)
    }

    fn sync(&mut self, file: &mut RawFile) -> Result<(), Self::Error> {
        self.volume_mgr.flush_file(*file)
    }

    fn close(&mut self, file: RawFile) -> Result<(), Self::Error> {
        self.volume_mgr.close_file(file).inspect_err(|e| {
            warn!("SD close failed: {:?}", e);
        })
    }
}
