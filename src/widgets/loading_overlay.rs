use iced_core::{Border, Color, Element, Theme};
use iced_custom::Renderer;
use iced_widget::{center, container, opaque, stack, text};

const BACKDROP: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.45 };
const CARD: Color = Color { r: 0.173, g: 0.243, b: 0.314, a: 0.9 };

/// Covers `base` with a dimmed, input-blocking layer showing `message`.
/// With `None` the content is returned untouched.
pub fn loading_overlay<'a, Message>(
    base: impl Into<Element<'a, Message, Theme, Renderer>>,
    message: Option<&'a str>,
) -> Element<'a, Message, Theme, Renderer>
where
    Message: Clone + 'a,
{
    let Some(message) = message else {
        return base.into();
    };

    let card = container(text(message).size(18).color(Color::WHITE))
        .padding([12, 20])
        .style(|_theme| container::Style {
            background: Some(CARD.into()),
            border: Border {
                color: Color::WHITE,
                width: 1.0,
                radius: 6.0.into(),
            },
            ..container::Style::default()
        });

    stack![
        base.into(),
        opaque(center(card).style(|_theme| container::Style {
            background: Some(BACKDROP.into()),
            ..container::Style::default()
        })),
    ]
    .into()
}
