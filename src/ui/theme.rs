//! Fixed Rose Pine palette (https://rosepinetheme.com/) and the few style
//! helpers the views share.

use crate::models::parse_hex_color;
use crate::reorder::ReorderState;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

pub struct Palette;

impl Palette {
    pub const BASE: Color = Color::Rgb(25, 23, 36);
    pub const TEXT: Color = Color::Rgb(224, 222, 244);
    pub const SUBTLE: Color = Color::Rgb(144, 140, 170);
    pub const MUTED: Color = Color::Rgb(110, 106, 134);
    pub const LOVE: Color = Color::Rgb(235, 111, 146);
    pub const GOLD: Color = Color::Rgb(246, 193, 119);
    pub const PINE: Color = Color::Rgb(49, 116, 143);
    pub const FOAM: Color = Color::Rgb(156, 207, 216);
    pub const IRIS: Color = Color::Rgb(196, 167, 231);
    pub const HIGHLIGHT_HIGH: Color = Color::Rgb(82, 79, 103);
    pub const HIGHLIGHT_MED: Color = Color::Rgb(64, 61, 82);
}

/// A collection's stored `#RRGGBB` color, or iris when it doesn't parse
pub fn hex_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Palette::IRIS)
}

pub fn border() -> Style {
    Style::default().fg(Palette::HIGHLIGHT_HIGH)
}

pub fn selected_row() -> Style {
    Style::default()
        .bg(Palette::HIGHLIGHT_MED)
        .add_modifier(Modifier::BOLD)
}

/// Badge for a reorderable list's title: nothing when clean
pub fn order_badge(state: ReorderState, last_error: Option<&str>) -> Option<Span<'static>> {
    match (state, last_error) {
        (ReorderState::Clean, _) => None,
        (ReorderState::Dirty, Some(_)) => Some(Span::styled(
            " ● unsaved (save failed) ",
            Style::default().fg(Palette::BASE).bg(Palette::LOVE),
        )),
        (ReorderState::Dirty, None) => Some(Span::styled(
            " ● unsaved ",
            Style::default().fg(Palette::BASE).bg(Palette::GOLD),
        )),
        (ReorderState::Saving, _) => Some(Span::styled(
            " ◌ saving… ",
            Style::default().fg(Palette::BASE).bg(Palette::FOAM),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_fall_back_to_iris() {
        assert_eq!(hex_color("#F7DF1E"), Color::Rgb(0xF7, 0xDF, 0x1E));
        assert_eq!(hex_color("blue"), Palette::IRIS);
    }

    #[test]
    fn clean_lists_have_no_badge() {
        assert!(order_badge(ReorderState::Clean, None).is_none());
        assert!(order_badge(ReorderState::Saving, None).is_some());
    }
}
