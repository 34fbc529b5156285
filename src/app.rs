// Submodules
mod message;
mod message_handlers;

// Re-exports
pub use message::Message;

use std::sync::Arc;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use iced_custom::{event, window, Element, Subscription, Task, Theme};
use iced_core::Event;

use crate::config::{Config, STATUS_DETECTING, STATUS_DETECTION_COMPLETE, STATUS_IMAGE_LOADED, STATUS_READY};
use crate::file_io::{self, LoadedImage};
use crate::model::{self, Detection, Detector, DetectorError};
use crate::overlay::Scene;
use crate::ui;

pub struct ObjectDetectionApp {
    detector: Arc<dyn Detector>,
    pub image: Option<LoadedImage>,
    pub detections: Option<Vec<Detection>>,
    pub scene: Scene,
    pub status: String,
    /// Bumped on every successful load; detection results tagged with an older value are dropped
    pub generation: u64,
    pub detection_in_flight: Option<u64>,
}

impl ObjectDetectionApp {
    pub fn new(detector: Arc<dyn Detector>, config: Config) -> (Self, Task<Message>) {
        let app = Self {
            detector,
            image: None,
            detections: None,
            scene: Scene::new(),
            status: STATUS_READY.to_string(),
            generation: 0,
            detection_in_flight: None,
        };

        let task = match config.initial_image {
            Some(path) => {
                info!("Opening {} from the command line", path.display());
                Task::perform(file_io::load_image(path), Message::ImageLoaded)
            }
            None => Task::none(),
        };

        (app, task)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        message_handlers::handle_message(self, message)
    }

    pub fn view(&self) -> Element<'_, Message> {
        ui::build_ui(self)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn is_detecting(&self) -> bool {
        self.detection_in_flight.is_some()
    }

    pub fn can_detect(&self) -> bool {
        self.image.is_some() && !self.is_detecting()
    }

    /// Replace the current image wholesale. Detections of the previous image are
    /// dropped, and any run still in flight becomes stale.
    pub(crate) fn apply_loaded_image(&mut self, image: LoadedImage) {
        let (width, height) = image.dimensions();
        info!("Loaded {} ({}x{})", image.file_name(), width, height);

        self.generation += 1;
        self.detection_in_flight = None;
        self.detections = None;
        self.scene.render(&image, None);
        self.image = Some(image);
        self.status = STATUS_IMAGE_LOADED.to_string();
    }

    pub(crate) fn load_failed(&mut self, e: file_io::Error) {
        error!("Failed to load image: {}", e);
        self.status = format!("Failed to load image: {}", e);
    }

    pub(crate) fn start_detection(&mut self) -> Task<Message> {
        if !self.can_detect() {
            debug!("Detect ignored: no image loaded or a run is already in flight");
            return Task::none();
        }
        let Some(image) = self.image.as_ref() else {
            return Task::none();
        };

        let generation = self.generation;
        let pixels = Arc::clone(&image.pixels);
        info!("Running detection on {}", image.file_name());

        self.detection_in_flight = Some(generation);
        self.status = STATUS_DETECTING.to_string();

        Task::perform(
            model::detect_in_background(Arc::clone(&self.detector), pixels),
            move |result| Message::DetectionFinished(generation, result),
        )
    }

    pub(crate) fn finish_detection(
        &mut self,
        generation: u64,
        result: Result<Vec<Detection>, DetectorError>,
    ) {
        if generation != self.generation || self.detection_in_flight != Some(generation) {
            debug!("Discarding detection result for stale generation {} (current {})", generation, self.generation);
            return;
        }
        self.detection_in_flight = None;

        match result {
            Ok(detections) => {
                info!("Detection finished: {} objects", detections.len());
                if let Some(image) = self.image.as_ref() {
                    self.scene.render(image, Some(&detections));
                }
                self.detections = Some(detections);
                self.status = STATUS_DETECTION_COMPLETE.to_string();
            }
            Err(e) => {
                error!("Detection failed: {}", e);
                self.status = format!("Detection failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use iced_core::Point;
    use image::RgbImage;

    use crate::overlay::HoverState;

    struct StubDetector {
        detections: Vec<Detection>,
        calls: AtomicUsize,
    }

    impl StubDetector {
        fn new(detections: Vec<Detection>) -> Arc<Self> {
            Arc::new(Self { detections, calls: AtomicUsize::new(0) })
        }
    }

    impl Detector for StubDetector {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detections.clone())
        }
    }

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: u32) -> Detection {
        Detection { x1, y1, x2, y2, confidence, class_id }
    }

    fn test_image(name: &str) -> LoadedImage {
        LoadedImage::from_rgb(PathBuf::from(name), RgbImage::new(120, 80))
    }

    fn app_with(detections: Vec<Detection>) -> ObjectDetectionApp {
        let detector: Arc<dyn Detector> = StubDetector::new(detections);
        let (app, _task) = ObjectDetectionApp::new(detector, Config::default());
        app
    }

    /// Run Detect and feed back the stub's output as the worker would.
    fn detect_now(app: &mut ObjectDetectionApp) {
        let _ = app.update(Message::Detect);
        let generation = app.detection_in_flight.expect("detection should be in flight");
        let image = app.image.as_ref().unwrap().pixels.clone();
        let result = app.detector.detect(&image);
        let _ = app.update(Message::DetectionFinished(generation, result));
    }

    #[test]
    fn test_initial_state() {
        let app = app_with(vec![]);
        assert!(!app.can_detect());
        assert_eq!(app.status, STATUS_READY);
        assert_eq!(app.scene.item_count(), 0);
    }

    #[test]
    fn test_detect_without_image_is_noop() {
        let mut app = app_with(vec![det(0.0, 0.0, 5.0, 5.0, 0.9, 0)]);
        let _ = app.update(Message::Detect);
        assert!(app.detection_in_flight.is_none());
        assert_eq!(app.status, STATUS_READY);
        assert!(app.detections.is_none());
    }

    #[test]
    fn test_load_enables_detect() {
        let mut app = app_with(vec![]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("a.png"))));
        assert!(app.can_detect());
        assert_eq!(app.status, STATUS_IMAGE_LOADED);
        assert_eq!(app.scene.item_count(), 1);
    }

    #[test]
    fn test_dialog_cancel_leaves_state_untouched() {
        let mut app = app_with(vec![]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("a.png"))));
        let _ = app.update(Message::ImageFileSelected(Err(file_io::Error::DialogClosed)));
        assert_eq!(app.status, STATUS_IMAGE_LOADED);
        assert!(app.image.is_some());
    }

    #[test]
    fn test_failed_load_keeps_previous_image() {
        let mut app = app_with(vec![]);
        let _ = app.update(Message::ImageLoaded(Err(file_io::Error::Decode {
            path: PathBuf::from("broken.png"),
            reason: "bad header".to_string(),
        })));
        assert!(!app.can_detect());
        assert!(app.status.starts_with("Failed to load image"));

        let _ = app.update(Message::ImageLoaded(Ok(test_image("good.png"))));
        let _ = app.update(Message::ImageLoaded(Err(file_io::Error::EmptyImage {
            path: PathBuf::from("empty.png"),
        })));
        assert!(app.can_detect());
        assert_eq!(app.image.as_ref().map(|i| i.file_name()), Some("good.png".to_string()));
    }

    #[test]
    fn test_detect_renders_one_overlay_per_detection() {
        let mut app = app_with(vec![
            det(10.0, 10.0, 40.0, 40.0, 0.8675, 2),
            det(50.0, 20.0, 90.0, 70.0, 0.5, 0),
        ]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("street.png"))));

        let _ = app.update(Message::Detect);
        assert_eq!(app.status, STATUS_DETECTING);
        assert!(!app.can_detect());

        let generation = app.detection_in_flight.unwrap();
        let result = app.detector.detect(&RgbImage::new(1, 1));
        let _ = app.update(Message::DetectionFinished(generation, result));

        assert_eq!(app.status, STATUS_DETECTION_COMPLETE);
        assert!(app.can_detect());
        assert_eq!(app.scene.overlays().len(), 2);
        assert_eq!(app.scene.item_count(), 5);
        assert_eq!(app.scene.overlays()[0].label, "car (0.87)");
        assert!(app.scene.overlays().iter().all(|item| !item.is_label_visible()));
    }

    #[test]
    fn test_repeat_detect_yields_same_scene() {
        let mut app = app_with(vec![det(1.0, 1.0, 20.0, 20.0, 0.7, 16)]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("dog.png"))));

        detect_now(&mut app);
        let first = app.scene.overlays().to_vec();
        detect_now(&mut app);

        assert_eq!(app.scene.overlays(), first.as_slice());
        assert_eq!(app.scene.item_count(), 3);
    }

    #[test]
    fn test_new_image_clears_previous_overlays() {
        let mut app = app_with(vec![det(1.0, 1.0, 20.0, 20.0, 0.7, 16)]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("first.png"))));
        detect_now(&mut app);
        assert_eq!(app.scene.overlays().len(), 1);

        let _ = app.update(Message::ImageLoaded(Ok(test_image("second.png"))));
        assert!(app.detections.is_none());
        assert!(app.scene.overlays().is_empty());
        assert_eq!(app.scene.item_count(), 1);
    }

    #[test]
    fn test_stale_detection_result_is_discarded() {
        let mut app = app_with(vec![det(1.0, 1.0, 20.0, 20.0, 0.7, 16)]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("first.png"))));
        let _ = app.update(Message::Detect);
        let stale = app.detection_in_flight.unwrap();

        let _ = app.update(Message::ImageLoaded(Ok(test_image("second.png"))));
        assert!(app.can_detect());

        let _ = app.update(Message::DetectionFinished(stale, Ok(vec![det(0.0, 0.0, 5.0, 5.0, 0.9, 0)])));
        assert!(app.scene.overlays().is_empty());
        assert!(app.detections.is_none());
        assert_eq!(app.status, STATUS_IMAGE_LOADED);
    }

    #[test]
    fn test_detection_failure_keeps_overlays_and_reenables_detect() {
        let mut app = app_with(vec![det(1.0, 1.0, 20.0, 20.0, 0.7, 16)]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("dog.png"))));
        detect_now(&mut app);

        let _ = app.update(Message::Detect);
        let generation = app.detection_in_flight.unwrap();
        let _ = app.update(Message::DetectionFinished(
            generation,
            Err(DetectorError::Inference("session crashed".to_string())),
        ));

        assert!(app.can_detect());
        assert!(app.status.starts_with("Detection failed"));
        assert_eq!(app.scene.overlays().len(), 1);
    }

    #[test]
    fn test_pointer_moves_drive_hover() {
        let mut app = app_with(vec![det(10.0, 10.0, 40.0, 40.0, 0.9, 0)]);
        let _ = app.update(Message::ImageLoaded(Ok(test_image("person.png"))));
        detect_now(&mut app);

        let _ = app.update(Message::PointerMoved(Some(Point::new(20.0, 20.0))));
        assert_eq!(app.scene.overlays()[0].hover_state(), HoverState::Hovered);

        let _ = app.update(Message::PointerMoved(None));
        assert_eq!(app.scene.overlays()[0].hover_state(), HoverState::Idle);
    }

    #[test]
    fn test_stub_detector_runs_once_per_detect() {
        let stub = StubDetector::new(vec![]);
        let detector: Arc<dyn Detector> = stub.clone();
        let (mut app, _task) = ObjectDetectionApp::new(detector, Config::default());
        let _ = app.update(Message::ImageLoaded(Ok(test_image("empty.png"))));

        detect_now(&mut app);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.detections.as_deref(), Some(&[][..]));
        assert_eq!(app.scene.item_count(), 1);
    }
}
