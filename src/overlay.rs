//! Detection overlays: the scene model behind the image view.
//!
//! Everything here is plain data (iced_core geometry, no renderer), so the
//! hover logic and the fit-to-view math run in unit tests without a window.
use iced_core::image::Handle;
use iced_core::{Color, Point, Rectangle, Size, Vector};

#[allow(unused_imports)]
use log::{debug, trace};

use crate::classes::class_name;
use crate::config::{BOX_HIGHLIGHT_COLOR, BOX_STROKE_COLOR, LABEL_OFFSET_X, LABEL_OFFSET_Y};
use crate::file_io::LoadedImage;
use crate::model::Detection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    PointerEntered,
    PointerLeft,
}

impl HoverState {
    pub fn transition(self, event: HoverEvent) -> Self {
        match (self, event) {
            (HoverState::Idle, HoverEvent::PointerEntered) => HoverState::Hovered,
            (HoverState::Hovered, HoverEvent::PointerLeft) => HoverState::Idle,
            (state, _) => state,
        }
    }
}

pub fn format_label(name: &str, confidence: f32) -> String {
    format!("{} ({:.2})", name, confidence)
}

/// One detection drawn over the image: a stroked rectangle and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub bounds: Rectangle,
    pub label: String,
    pub label_anchor: Point,
    hover: HoverState,
}

impl OverlayItem {
    pub fn from_detection(detection: &Detection) -> Self {
        let x = detection.x1.min(detection.x2);
        let y = detection.y1.min(detection.y2);
        let bounds = Rectangle {
            x,
            y,
            width: (detection.x2 - detection.x1).abs(),
            height: (detection.y2 - detection.y1).abs(),
        };
        let name = class_name(i64::from(detection.class_id));

        Self {
            bounds,
            label: format_label(&name, detection.confidence),
            label_anchor: Point::new(x + LABEL_OFFSET_X, y + LABEL_OFFSET_Y),
            hover: HoverState::Idle,
        }
    }

    pub fn hover_state(&self) -> HoverState {
        self.hover
    }

    pub fn handle(&mut self, event: HoverEvent) {
        self.hover = self.hover.transition(event);
    }

    pub fn is_label_visible(&self) -> bool {
        self.hover == HoverState::Hovered
    }

    pub fn stroke_color(&self) -> Color {
        match self.hover {
            HoverState::Idle => BOX_STROKE_COLOR,
            HoverState::Hovered => BOX_HIGHLIGHT_COLOR,
        }
    }

    /// Closed containment: the stroke sits on the edge, so edges count.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.bounds.x
            && point.x <= self.bounds.x + self.bounds.width
            && point.y >= self.bounds.y
            && point.y <= self.bounds.y + self.bounds.height
    }
}

/// Index of the item that receives hover at `point`: the topmost, i.e. last drawn.
pub fn hover_target(items: &[OverlayItem], point: Option<Point>) -> Option<usize> {
    let point = point?;
    items.iter().rposition(|item| item.contains(point))
}

#[derive(Debug, Clone)]
pub struct ImageLayer {
    pub handle: Handle,
    pub size: (u32, u32),
}

/// What the image view shows: at most one image and the overlays on top of it.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    image: Option<ImageLayer>,
    overlays: Vec<OverlayItem>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.image = None;
        self.overlays.clear();
    }

    /// Rebuild the scene from scratch: image first, then one overlay per detection in order.
    pub fn render(&mut self, image: &LoadedImage, detections: Option<&[Detection]>) {
        self.clear();
        self.image = Some(ImageLayer {
            handle: image.handle.clone(),
            size: image.dimensions(),
        });

        if let Some(detections) = detections {
            self.overlays = detections.iter().map(OverlayItem::from_detection).collect();
        }
        debug!("Scene rendered: {} overlays over {}x{}", self.overlays.len(), image.dimensions().0, image.dimensions().1);
    }

    pub fn image(&self) -> Option<&ImageLayer> {
        self.image.as_ref()
    }

    pub fn overlays(&self) -> &[OverlayItem] {
        &self.overlays
    }

    /// Number of drawn items: the image plus a rectangle and a label per overlay.
    pub fn item_count(&self) -> usize {
        usize::from(self.image.is_some()) + self.overlays.len() * 2
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.overlays.iter().position(|item| item.hover_state() == HoverState::Hovered)
    }

    /// Feed a pointer position in image coordinates (`None` once it leaves the view).
    /// Sends leave to the item losing hover and enter to the one gaining it.
    pub fn pointer_moved(&mut self, point: Option<Point>) {
        let target = hover_target(&self.overlays, point);
        for (index, item) in self.overlays.iter_mut().enumerate() {
            let hovered = item.hover_state() == HoverState::Hovered;
            if Some(index) == target && !hovered {
                trace!("pointer entered overlay {} ({})", index, item.label);
                item.handle(HoverEvent::PointerEntered);
            } else if Some(index) != target && hovered {
                trace!("pointer left overlay {} ({})", index, item.label);
                item.handle(HoverEvent::PointerLeft);
            }
        }
    }
}

/// Maps image pixels onto the viewport, scaled to fit with the aspect ratio kept
/// and centered (the same placement as `ContentFit::Contain`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Vector,
}

impl ViewTransform {
    pub fn fit(image_size: (u32, u32), bounds: Rectangle) -> Self {
        let image_width = image_size.0 as f32;
        let image_height = image_size.1 as f32;
        if image_width <= 0.0 || image_height <= 0.0 {
            return Self { scale: 1.0, offset: Vector::new(bounds.x, bounds.y) };
        }

        let scale = (bounds.width / image_width).min(bounds.height / image_height);
        let fitted = Size::new(image_width * scale, image_height * scale);

        Self {
            scale,
            offset: Vector::new(
                bounds.x + (bounds.width - fitted.width) / 2.0,
                bounds.y + (bounds.height - fitted.height) / 2.0,
            ),
        }
    }

    pub fn to_screen(&self, point: Point) -> Point {
        Point::new(point.x * self.scale + self.offset.x, point.y * self.scale + self.offset.y)
    }

    pub fn to_image(&self, point: Point) -> Option<Point> {
        if self.scale <= 0.0 {
            return None;
        }
        Some(Point::new(
            (point.x - self.offset.x) / self.scale,
            (point.y - self.offset.y) / self.scale,
        ))
    }

    pub fn to_screen_rect(&self, rect: Rectangle) -> Rectangle {
        let top_left = self.to_screen(Point::new(rect.x, rect.y));
        Rectangle {
            x: top_left.x,
            y: top_left.y,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::path::PathBuf;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: u32) -> Detection {
        Detection { x1, y1, x2, y2, confidence, class_id }
    }

    fn test_image(width: u32, height: u32) -> LoadedImage {
        LoadedImage::from_rgb(PathBuf::from("test.png"), RgbImage::new(width, height))
    }

    #[test]
    fn test_label_format() {
        assert_eq!(format_label("car", 0.8675), "car (0.87)");
        assert_eq!(format_label("person", 1.0), "person (1.00)");
        assert_eq!(format_label("Unknown 91", 0.5), "Unknown 91 (0.50)");
    }

    #[test]
    fn test_overlay_from_detection() {
        let item = OverlayItem::from_detection(&det(10.0, 40.0, 110.0, 90.0, 0.8675, 2));
        assert_eq!(item.bounds, Rectangle { x: 10.0, y: 40.0, width: 100.0, height: 50.0 });
        assert_eq!(item.label, "car (0.87)");
        assert_eq!(item.label_anchor, Point::new(15.0, 18.0));
        assert!(!item.is_label_visible());
        assert_eq!(item.stroke_color(), BOX_STROKE_COLOR);
    }

    #[test]
    fn test_overlay_unknown_class() {
        let item = OverlayItem::from_detection(&det(0.0, 0.0, 1.0, 1.0, 0.333, 85));
        assert_eq!(item.label, "Unknown 85 (0.33)");
    }

    #[test]
    fn test_hover_transitions() {
        assert_eq!(HoverState::Idle.transition(HoverEvent::PointerEntered), HoverState::Hovered);
        assert_eq!(HoverState::Hovered.transition(HoverEvent::PointerLeft), HoverState::Idle);
        // Events that do not apply in a state are ignored
        assert_eq!(HoverState::Idle.transition(HoverEvent::PointerLeft), HoverState::Idle);
        assert_eq!(HoverState::Hovered.transition(HoverEvent::PointerEntered), HoverState::Hovered);
    }

    #[test]
    fn test_hover_cycles_leave_no_residue() {
        let original = OverlayItem::from_detection(&det(0.0, 0.0, 10.0, 10.0, 0.5, 0));
        let mut item = original.clone();
        for _ in 0..3 {
            item.handle(HoverEvent::PointerEntered);
            assert!(item.is_label_visible());
            assert_eq!(item.stroke_color(), BOX_HIGHLIGHT_COLOR);
            item.handle(HoverEvent::PointerLeft);
            assert!(!item.is_label_visible());
            assert_eq!(item.stroke_color(), BOX_STROKE_COLOR);
        }
        assert_eq!(item, original);
    }

    #[test]
    fn test_render_creates_one_overlay_per_detection() {
        let mut scene = Scene::new();
        let image = test_image(200, 100);
        let detections = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            det(20.0, 20.0, 50.0, 60.0, 0.6, 2),
            det(5.0, 5.0, 15.0, 15.0, 0.4, 99),
        ];

        scene.render(&image, Some(&detections));
        assert_eq!(scene.overlays().len(), 3);
        assert_eq!(scene.item_count(), 1 + 3 * 2);
        assert!(scene.overlays().iter().all(|item| !item.is_label_visible()));
        assert_eq!(scene.overlays()[2].label, "Unknown 99 (0.40)");
        assert_eq!(scene.image().map(|layer| layer.size), Some((200, 100)));
    }

    #[test]
    fn test_render_clears_previous_overlays() {
        let mut scene = Scene::new();
        let image = test_image(64, 64);
        scene.render(&image, Some(&[det(0.0, 0.0, 10.0, 10.0, 0.9, 0)]));
        scene.pointer_moved(Some(Point::new(5.0, 5.0)));
        assert_eq!(scene.hovered_index(), Some(0));

        scene.render(&image, None);
        assert_eq!(scene.item_count(), 1);
        assert!(scene.overlays().is_empty());
        assert_eq!(scene.hovered_index(), None);
    }

    #[test]
    fn test_render_twice_is_idempotent() {
        let image = test_image(64, 64);
        let detections = vec![det(1.0, 2.0, 30.0, 40.0, 0.75, 16), det(8.0, 8.0, 20.0, 20.0, 0.5, 17)];

        let mut scene = Scene::new();
        scene.render(&image, Some(&detections));
        let first: Vec<OverlayItem> = scene.overlays().to_vec();
        scene.pointer_moved(Some(Point::new(10.0, 10.0)));
        scene.render(&image, Some(&detections));

        assert_eq!(scene.overlays(), first.as_slice());
        assert_eq!(scene.item_count(), 5);
    }

    #[test]
    fn test_empty_detection_list() {
        let mut scene = Scene::new();
        scene.render(&test_image(8, 8), Some(&[]));
        assert_eq!(scene.item_count(), 1);
    }

    #[test]
    fn test_pointer_hover_enter_and_leave() {
        let mut scene = Scene::new();
        scene.render(&test_image(100, 100), Some(&[det(10.0, 10.0, 30.0, 30.0, 0.9, 0)]));

        scene.pointer_moved(Some(Point::new(20.0, 20.0)));
        assert!(scene.overlays()[0].is_label_visible());

        scene.pointer_moved(Some(Point::new(25.0, 25.0)));
        assert_eq!(scene.overlays()[0].hover_state(), HoverState::Hovered);

        scene.pointer_moved(Some(Point::new(50.0, 50.0)));
        assert!(!scene.overlays()[0].is_label_visible());

        scene.pointer_moved(Some(Point::new(20.0, 20.0)));
        scene.pointer_moved(None);
        assert_eq!(scene.hovered_index(), None);
    }

    #[test]
    fn test_overlapping_boxes_hover_topmost_only() {
        let mut scene = Scene::new();
        scene.render(
            &test_image(100, 100),
            Some(&[det(0.0, 0.0, 50.0, 50.0, 0.9, 0), det(20.0, 20.0, 70.0, 70.0, 0.8, 1)]),
        );

        scene.pointer_moved(Some(Point::new(30.0, 30.0)));
        assert_eq!(scene.hovered_index(), Some(1));
        assert!(!scene.overlays()[0].is_label_visible());

        scene.pointer_moved(Some(Point::new(10.0, 10.0)));
        assert_eq!(scene.hovered_index(), Some(0));
        assert!(!scene.overlays()[1].is_label_visible());
    }

    #[test]
    fn test_fit_wide_image_into_square_view() {
        let bounds = Rectangle { x: 10.0, y: 20.0, width: 400.0, height: 400.0 };
        let transform = ViewTransform::fit((800, 400), bounds);
        assert!((transform.scale - 0.5).abs() < 1e-6);
        assert_eq!(transform.offset, Vector::new(10.0, 120.0));

        let rect = transform.to_screen_rect(Rectangle { x: 100.0, y: 100.0, width: 200.0, height: 50.0 });
        assert_eq!(rect, Rectangle { x: 60.0, y: 170.0, width: 100.0, height: 25.0 });
    }

    #[test]
    fn test_fit_upscales_small_image() {
        let bounds = Rectangle { x: 0.0, y: 0.0, width: 300.0, height: 200.0 };
        let transform = ViewTransform::fit((30, 10), bounds);
        assert!((transform.scale - 10.0).abs() < 1e-6);
        assert_eq!(transform.offset, Vector::new(0.0, 50.0));
    }

    #[test]
    fn test_screen_to_image_round_trip() {
        let bounds = Rectangle { x: 5.0, y: 7.0, width: 640.0, height: 480.0 };
        let transform = ViewTransform::fit((1920, 1080), bounds);
        let image_point = Point::new(960.0, 540.0);
        let back = transform.to_image(transform.to_screen(image_point)).unwrap();
        assert!((back.x - image_point.x).abs() < 1e-2);
        assert!((back.y - image_point.y).abs() < 1e-2);
    }
}
