#![windows_subsystem = "windows"]

mod app;
mod build_info;
mod classes;
mod config;
mod file_io;
mod logging;
mod model;
mod overlay;
mod ui;
mod widgets;

use std::sync::Arc;

use clap::Parser;
#[allow(unused_imports)]
use log::{debug, info, warn, error};

use iced_custom as iced;
use iced::window;
use iced::{Point, Size};

use crate::app::ObjectDetectionApp;
use crate::build_info::BuildInfo;
use crate::config::{
    Args, Config, APP_NAME, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_X,
    DEFAULT_WINDOW_Y, WINDOW_TITLE,
};
use crate::model::{Detector, YoloDetector};

fn main() -> iced::Result {
    let args = Args::parse();

    let shared_log_buffer = logging::setup_logger();
    logging::setup_panic_hook(APP_NAME, shared_log_buffer);
    info!("{} {}", APP_NAME, BuildInfo::CURRENT);

    let config = Config::from(args);

    // The model is loaded once, before any window exists
    let detector: Arc<dyn Detector> = match YoloDetector::load(&config.model_path) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            error!("Error loading model: {}", e);
            std::process::exit(1);
        }
    };
    info!("Model loaded from {}", config.model_path.display());

    iced::application(WINDOW_TITLE, ObjectDetectionApp::update, ObjectDetectionApp::view)
        .subscription(ObjectDetectionApp::subscription)
        .theme(ObjectDetectionApp::theme)
        .window_size(Size::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT))
        .position(window::Position::Specific(Point::new(DEFAULT_WINDOW_X, DEFAULT_WINDOW_Y)))
        .run_with(move || ObjectDetectionApp::new(detector, config))
}
