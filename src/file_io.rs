use std::path::{Path, PathBuf};
use std::sync::Arc;

use iced_core::image::Handle;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, RgbImage};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::config::IMAGE_EXTENSIONS;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("file dialog closed")]
    DialogClosed,
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("{path} contains no pixels")]
    EmptyImage { path: PathBuf },
    #[error("image loader stopped: {0}")]
    Worker(String),
}

/// A decoded image, held as RGB8 for the detector and RGBA for display.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub pixels: Arc<RgbImage>,
    pub handle: Handle,
}

impl LoadedImage {
    pub fn from_rgb(path: PathBuf, pixels: RgbImage) -> Self {
        let (width, height) = pixels.dimensions();
        let rgba = DynamicImage::ImageRgb8(pixels.clone()).into_rgba8();
        Self {
            path,
            pixels: Arc::new(pixels),
            handle: Handle::from_rgba(width, height, rgba.into_raw()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn file_name(&self) -> String {
        get_filename(&self.path).unwrap_or_else(|| self.path.display().to_string())
    }
}

pub fn get_filename(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|os_str| os_str.to_str())
        .map(|s| s.to_string())
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub async fn pick_image_file() -> Result<PathBuf, Error> {
    let handle = rfd::AsyncFileDialog::new()
        .set_title("Open Image File")
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_file()
        .await;

    match handle {
        Some(file) => Ok(file.path().to_path_buf()),
        None => Err(Error::DialogClosed),
    }
}

/// Decode `path` into upright RGB8. The format is sniffed from the content, so
/// files picked through "All Files" decode as long as the image crate knows them.
pub fn decode_image(path: &Path) -> Result<LoadedImage, Error> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| Error::Read { path: path.to_path_buf(), reason: e.to_string() })?
        .with_guessed_format()
        .map_err(|e| Error::Read { path: path.to_path_buf(), reason: e.to_string() })?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| Error::Decode { path: path.to_path_buf(), reason: e.to_string() })?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        warn!("Ignoring unreadable orientation in {}: {}", path.display(), e);
        Orientation::NoTransforms
    });
    let mut decoded = DynamicImage::from_decoder(decoder)
        .map_err(|e| Error::Decode { path: path.to_path_buf(), reason: e.to_string() })?;
    // Camera photos store rotation as an EXIF tag; bake it into the pixels
    decoded.apply_orientation(orientation);

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(Error::EmptyImage { path: path.to_path_buf() });
    }

    debug!("Decoded {} ({}x{}, {:?})", path.display(), decoded.width(), decoded.height(), decoded.color());
    Ok(LoadedImage::from_rgb(path.to_path_buf(), decoded.into_rgb8()))
}

pub async fn load_image(path: PathBuf) -> Result<LoadedImage, Error> {
    tokio::task::spawn_blocking(move || decode_image(&path))
        .await
        .unwrap_or_else(|e| Err(Error::Worker(e.to_string())))
}
