use std::path::PathBuf;
use clap::Parser;
use iced_core::Color;

pub const APP_NAME: &str = "object-detection-tool";
pub const WINDOW_TITLE: &str = "AI-Powered Object Detection Tool";

// Window geometry
pub const DEFAULT_WINDOW_X: f32 = 100.0;
pub const DEFAULT_WINDOW_Y: f32 = 100.0;
pub const DEFAULT_WINDOW_WIDTH: f32 = 1000.0;
pub const DEFAULT_WINDOW_HEIGHT: f32 = 700.0;
pub const SIDEBAR_WIDTH: f32 = 270.0;

// Palette
pub const BACKGROUND_COLOR: Color = Color::from_rgb(0.173, 0.243, 0.314);     // #2c3e50
pub const SIDEBAR_COLOR: Color = Color::from_rgb(0.204, 0.286, 0.369);        // #34495e
pub const UPLOAD_BUTTON_COLOR: Color = Color::from_rgb(0.102, 0.737, 0.612);  // #1abc9c
pub const DETECT_BUTTON_COLOR: Color = Color::from_rgb(0.906, 0.298, 0.235);  // #e74c3c

// Overlay appearance
pub const BOX_STROKE_COLOR: Color = Color::from_rgb(1.0, 0.0, 0.0);
pub const BOX_HIGHLIGHT_COLOR: Color = Color::from_rgb(0.0, 1.0, 0.0);
pub const BOX_STROKE_WIDTH: f32 = 3.0;
pub const LABEL_OFFSET_X: f32 = 5.0;
pub const LABEL_OFFSET_Y: f32 = -22.0;
pub const LABEL_FONT_SIZE: f32 = 16.0;

// Model
pub const DEFAULT_MODEL_PATH: &str = "yolov8s.onnx";
pub const MODEL_INPUT_SIZE: u32 = 640;
pub const CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const IOU_THRESHOLD: f32 = 0.7;
pub const MAX_DETECTIONS: usize = 300;

pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

// Status bar messages
pub const STATUS_READY: &str = "Ready";
pub const STATUS_IMAGE_LOADED: &str = "Image Loaded Successfully";
pub const STATUS_DETECTING: &str = "Detecting Objects...";
pub const STATUS_DETECTION_COMPLETE: &str = "Detection Complete";

/// Startup arguments
#[derive(Parser, Debug, Clone)]
#[command(name = APP_NAME, version, about = "Run an object detector over an image and inspect the boxes")]
pub struct Args {
    /// Image to open at startup
    pub image: Option<PathBuf>,

    /// ONNX detection model to load
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: PathBuf,
    pub initial_image: Option<PathBuf>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            model_path: args.model,
            initial_image: args.image,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            initial_image: None,
        }
    }
}
