use iced_custom::widget::{button, center, column, container, image, row, stack, text, vertical_space};
use iced_custom::alignment::Horizontal;
use iced_custom::border::Radius;
use iced_custom::widget::button::Style;
use iced_custom::{Border, Color, ContentFit, Element, Length, Theme};

use crate::app::{Message, ObjectDetectionApp};
use crate::config::{
    BACKGROUND_COLOR, DETECT_BUTTON_COLOR, SIDEBAR_COLOR, SIDEBAR_WIDTH, STATUS_DETECTING,
    UPLOAD_BUTTON_COLOR,
};
use crate::widgets::{loading_overlay, DetectionOverlay};

const BUTTON_FONT_SIZE: u16 = 16;
const STATUS_FONT_SIZE: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonClass {
    Upload,
    Detect,
}

impl ButtonClass {
    fn color(self) -> Color {
        match self {
            ButtonClass::Upload => UPLOAD_BUTTON_COLOR,
            ButtonClass::Detect => DETECT_BUTTON_COLOR,
        }
    }
}

fn lighten(color: Color, amount: f32) -> Color {
    Color {
        r: (color.r + amount).clamp(0.0, 1.0),
        g: (color.g + amount).clamp(0.0, 1.0),
        b: (color.b + amount).clamp(0.0, 1.0),
        a: color.a,
    }
}

impl<'a> From<ButtonClass> for Box<dyn Fn(&Theme, button::Status) -> Style + 'a> {
    fn from(class: ButtonClass) -> Self {
        Box::new(move |_theme: &Theme, status: button::Status| {
            let base = class.color();
            let (background, text_color) = match status {
                button::Status::Active => (base, Color::WHITE),
                button::Status::Hovered => (lighten(base, 0.08), Color::WHITE),
                button::Status::Pressed => (lighten(base, -0.08), Color::WHITE),
                button::Status::Disabled => (Color { a: 0.4, ..base }, Color { a: 0.6, ..Color::WHITE }),
            };
            Style {
                background: Some(background.into()),
                text_color,
                border: Border {
                    color: Color::TRANSPARENT,
                    width: 0.0,
                    radius: Radius::new(5.0),
                },
                ..Default::default()
            }
        })
    }
}

fn sidebar_button<'a>(label: &'a str, class: ButtonClass) -> button::Button<'a, Message> {
    button(
        text(label)
            .size(BUTTON_FONT_SIZE)
            .width(Length::Fill)
            .align_x(Horizontal::Center)
    )
    .padding(10)
    .width(Length::Fill)
    .class(class)
}

fn build_sidebar(app: &ObjectDetectionApp) -> Element<'_, Message> {
    let upload = sidebar_button("Upload Image", ButtonClass::Upload)
        .on_press(Message::LoadImage);
    // Disabled until an image is loaded, and while a detection run is in flight
    let detect = sidebar_button("Detect Objects", ButtonClass::Detect)
        .on_press_maybe(app.can_detect().then_some(Message::Detect));

    let status = text(app.status.as_str())
        .size(STATUS_FONT_SIZE)
        .color(Color::WHITE);

    container(
        column![upload, detect, vertical_space(), status]
            .spacing(12)
    )
    .width(SIDEBAR_WIDTH)
    .height(Length::Fill)
    .padding(15)
    .style(|_theme: &Theme| container::Style {
        background: Some(SIDEBAR_COLOR.into()),
        ..container::Style::default()
    })
    .into()
}

fn build_image_area(app: &ObjectDetectionApp) -> Element<'_, Message> {
    let content: Element<'_, Message> = match app.scene.image() {
        Some(layer) => {
            let layers = stack![
                image(layer.handle.clone())
                    .content_fit(ContentFit::Contain)
                    .width(Length::Fill)
                    .height(Length::Fill),
                DetectionOverlay::new(app.scene.overlays(), layer.size, app.scene.hovered_index()),
            ]
            .width(Length::Fill)
            .height(Length::Fill);

            loading_overlay(layers, app.is_detecting().then_some(STATUS_DETECTING))
        }
        None => center(
            text("Upload an image to start")
                .size(18)
                .color(Color { a: 0.6, ..Color::WHITE })
        )
        .into(),
    };

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(2)
        .style(|_theme: &Theme| container::Style {
            border: Border {
                color: SIDEBAR_COLOR,
                width: 2.0,
                radius: Radius::new(0.0),
            },
            ..container::Style::default()
        })
        .into()
}

pub fn build_ui(app: &ObjectDetectionApp) -> Element<'_, Message> {
    container(
        row![build_sidebar(app), build_image_area(app)]
            .spacing(10)
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .padding(10)
    .style(|_theme: &Theme| container::Style {
        background: Some(BACKGROUND_COLOR.into()),
        ..container::Style::default()
    })
    .into()
}
