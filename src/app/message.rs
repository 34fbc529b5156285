use std::path::PathBuf;

use iced_core::Point;

use crate::file_io::{self, LoadedImage};
use crate::model::{Detection, DetectorError};

#[derive(Debug, Clone)]
pub enum Message {
    LoadImage,
    ImageFileSelected(Result<PathBuf, file_io::Error>),
    ImageLoaded(Result<LoadedImage, file_io::Error>),
    FileDropped(PathBuf),
    Detect,
    // Tagged with the generation of the image the run started on
    DetectionFinished(u64, Result<Vec<Detection>, DetectorError>),
    // Pointer position in image coordinates, None once it leaves the view
    PointerMoved(Option<Point>),
}
