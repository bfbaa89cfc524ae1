//! Where the popup and its launcher go.
//!
//! Both are pure functions of the viewport and the open flag and are
//! recomputed on every draw and every mouse event. Nothing is cached.

use ratatui::layout::Rect;

pub const POPUP_MAX_WIDTH: u16 = 42;
pub const POPUP_MIN_HEIGHT: u16 = 8;
pub const LAUNCHER_WIDTH: u16 = 6;
pub const LAUNCHER_HEIGHT: u16 = 3;

const RIGHT_MARGIN: u16 = 2;
const BOTTOM_MARGIN: u16 = 3;

/// The popup: half the screen tall, anchored bottom-right
pub fn popup_area(viewport: Rect) -> Rect {
    let width = POPUP_MAX_WIDTH.min(viewport.width.saturating_sub(4));
    let height = (viewport.height / 2)
        .max(POPUP_MIN_HEIGHT)
        .min(viewport.height.saturating_sub(BOTTOM_MARGIN + LAUNCHER_HEIGHT));
    let x = viewport.x + viewport.width.saturating_sub(width + RIGHT_MARGIN);
    let y = viewport.y + viewport.height.saturating_sub(height + BOTTOM_MARGIN);
    Rect::new(x, y, width, height).intersection(viewport)
}

/// The launcher button: centred on the right edge when closed, sitting on
/// top of the popup's right end when open
pub fn launcher_area(viewport: Rect, open: bool) -> Rect {
    let (x, y) = if open {
        let popup = popup_area(viewport);
        (
            popup.right().saturating_sub(LAUNCHER_WIDTH),
            popup.y.saturating_sub(LAUNCHER_HEIGHT),
        )
    } else {
        (
            viewport.right().saturating_sub(LAUNCHER_WIDTH + 1),
            viewport.y + (viewport.height / 2).saturating_sub(LAUNCHER_HEIGHT / 2 + 1),
        )
    };
    Rect::new(x, y, LAUNCHER_WIDTH, LAUNCHER_HEIGHT).intersection(viewport)
}
