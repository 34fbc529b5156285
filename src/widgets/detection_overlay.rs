//! Draws detection rectangles and hover labels over a `ContentFit::Contain` image.
//!
//! Sits on top of the image in a `Stack` and fills the same bounds, so both
//! share one fit transform. Hover is resolved by the scene; the widget only
//! reports the pointer position in image coordinates when the hovered
//! target changes.

use iced_core::event;
use iced_core::font;
use iced_core::layout;
use iced_core::mouse;
use iced_core::renderer;
use iced_core::text::Text;
use iced_core::widget::Tree;
use iced_core::{
    Border, Clipboard, Color, Element, Event, Font, Layout, Length, Point, Rectangle, Shell, Size,
    Widget,
};

use crate::app::Message;
use crate::config::{BOX_STROKE_WIDTH, LABEL_FONT_SIZE};
use crate::overlay::{hover_target, OverlayItem, ViewTransform};

const LABEL_PADDING: f32 = 4.0;
const LABEL_BACKGROUND: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.6 };

pub struct DetectionOverlay<'a> {
    items: &'a [OverlayItem],
    image_size: (u32, u32),
    hovered: Option<usize>,
}

impl<'a> DetectionOverlay<'a> {
    pub fn new(items: &'a [OverlayItem], image_size: (u32, u32), hovered: Option<usize>) -> Self {
        Self { items, image_size, hovered }
    }
}

/// Message to publish for a pointer at `cursor` (screen space, `None` once it left
/// the window). Only emitted when the hovered overlay changes.
fn hover_change(
    cursor: Option<Point>,
    bounds: Rectangle,
    image_size: (u32, u32),
    items: &[OverlayItem],
    hovered: Option<usize>,
) -> Option<Message> {
    let point = cursor
        .filter(|position| bounds.contains(*position))
        .and_then(|position| ViewTransform::fit(image_size, bounds).to_image(position));

    (hover_target(items, point) != hovered).then_some(Message::PointerMoved(point))
}

/// Rough glyph-width estimate; labels are short so a fixed ratio is close enough.
fn label_width(label: &str) -> f32 {
    label.chars().count() as f32 * LABEL_FONT_SIZE * 0.6 + LABEL_PADDING * 2.0
}

impl<Theme, R> Widget<Message, Theme, R> for DetectionOverlay<'_>
where
    R: iced_core::Renderer + iced_core::text::Renderer<Font = Font>,
{
    fn size(&self) -> Size<Length> {
        Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn layout(
        &self,
        _tree: &mut Tree,
        _renderer: &R,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::atomic(limits, Length::Fill, Length::Fill)
    }

    fn on_event(
        &mut self,
        _tree: &mut Tree,
        event: Event,
        layout: Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &R,
        _clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> event::Status {
        let position = match event {
            Event::Mouse(mouse::Event::CursorMoved { .. }) => cursor.position(),
            Event::Mouse(mouse::Event::CursorLeft) => None,
            _ => return event::Status::Ignored,
        };

        if let Some(message) = hover_change(position, layout.bounds(), self.image_size, self.items, self.hovered) {
            shell.publish(message);
        }

        // Never capture: buttons and the image underneath still see the event
        event::Status::Ignored
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut R,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let bounds = layout.bounds();
        let transform = ViewTransform::fit(self.image_size, bounds);

        for item in self.items {
            renderer.fill_quad(
                renderer::Quad {
                    bounds: transform.to_screen_rect(item.bounds),
                    border: Border {
                        radius: 0.0.into(),
                        width: BOX_STROKE_WIDTH,
                        color: item.stroke_color(),
                    },
                    shadow: iced_core::Shadow::default(),
                },
                Color::TRANSPARENT,
            );
        }

        // Labels after all rectangles so a hovered label is never covered by a later box
        for item in self.items.iter().filter(|item| item.is_label_visible()) {
            let anchor = transform.to_screen(item.label_anchor);
            let label_height = LABEL_FONT_SIZE + LABEL_PADDING;

            renderer.fill_quad(
                renderer::Quad {
                    bounds: Rectangle {
                        x: anchor.x,
                        y: anchor.y,
                        width: label_width(&item.label),
                        height: label_height,
                    },
                    border: Border {
                        radius: 2.0.into(),
                        width: 0.0,
                        color: Color::TRANSPARENT,
                    },
                    shadow: iced_core::Shadow::default(),
                },
                LABEL_BACKGROUND,
            );

            renderer.fill_text(
                Text {
                    content: item.label.clone(),
                    bounds: Size::new(f32::INFINITY, label_height),
                    size: LABEL_FONT_SIZE.into(),
                    line_height: iced_core::text::LineHeight::default(),
                    font: Font {
                        weight: font::Weight::Bold,
                        ..renderer.default_font()
                    },
                    horizontal_alignment: iced_core::alignment::Horizontal::Left,
                    vertical_alignment: iced_core::alignment::Vertical::Top,
                    shaping: iced_core::text::Shaping::Basic,
                    wrapping: iced_core::text::Wrapping::default(),
                },
                Point::new(anchor.x + LABEL_PADDING, anchor.y + LABEL_PADDING / 2.0),
                Color::WHITE,
                bounds,
            );
        }
    }
}

impl<'a, Theme, R> From<DetectionOverlay<'a>> for Element<'a, Message, Theme, R>
where
    R: iced_core::Renderer + iced_core::text::Renderer<Font = Font> + 'a,
{
    fn from(widget: DetectionOverlay<'a>) -> Self {
        Element::new(widget)
    }
}
