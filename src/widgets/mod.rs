pub mod detection_overlay;
pub mod loading_overlay;

pub use detection_overlay::DetectionOverlay;
pub use loading_overlay::loading_overlay;
