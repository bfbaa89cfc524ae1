//! One chat surface: a session plus how it is presented.
//!
//! The docked panel and the popup widget run the exact same send cycle; they
//! only differ in the [`Presentation`] they are built with.

use ratatui::style::Color;
use tccv_core::{ChatSession, Composer, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceId {
    Panel,
    Widget,
}

pub trait Presentation {
    fn title(&self) -> &'static str;
    fn user_label(&self) -> &'static str;
    fn bot_label(&self) -> &'static str;
    fn user_color(&self) -> Color;
    fn send_label(&self) -> &'static str;

    /// Rows the input box takes for the current composer contents
    fn composer_height(&self, composer: &Composer) -> u16;

    fn shows_feature_icons(&self) -> bool {
        false
    }
}

/// The full-screen chat box
#[derive(Debug, Clone, Copy, Default)]
pub struct Panel;

impl Presentation for Panel {
    fn title(&self) -> &'static str {
        "TCCV Bot"
    }

    fn user_label(&self) -> &'static str {
        "Bạn"
    }

    fn bot_label(&self) -> &'static str {
        "TCCV Bot"
    }

    fn user_color(&self) -> Color {
        Color::Blue
    }

    fn send_label(&self) -> &'static str {
        "➤"
    }

    // Grows with line breaks, up to 5 rows
    fn composer_height(&self, composer: &Composer) -> u16 {
        composer.rows(5)
    }

    fn shows_feature_icons(&self) -> bool {
        true
    }
}

/// The floating popup
#[derive(Debug, Clone, Copy, Default)]
pub struct Widget;

impl Presentation for Widget {
    fn title(&self) -> &'static str {
        "Chat Bot"
    }

    fn user_label(&self) -> &'static str {
        "User"
    }

    fn bot_label(&self) -> &'static str {
        "Bot"
    }

    fn user_color(&self) -> Color {
        Color::Cyan
    }

    fn send_label(&self) -> &'static str {
        "Gửi"
    }

    fn composer_height(&self, _composer: &Composer) -> u16 {
        2
    }
}

pub struct Surface<P> {
    pub session: ChatSession,
    pub presentation: P,
    pub scroll: u16,
    content_height: u16,
    visible_height: u16,
    seen_revision: u64,
}

impl<P: Presentation> Surface<P> {
    pub fn new(presentation: P, config: &Config) -> Self {
        let session = ChatSession::new(config.send_policy()).with_error_text(config.error_text());
        let seen_revision = session.revision();
        Self {
            session,
            presentation,
            scroll: 0,
            content_height: 0,
            visible_height: 0,
            seen_revision,
        }
    }

    /// Called on every draw with the size of the chat content.
    ///
    /// Jumps to the bottom whenever the session changed since the last draw;
    /// otherwise keeps the user's scroll position.
    pub fn update_viewport(&mut self, content_height: u16, visible_height: u16) {
        self.content_height = content_height;
        self.visible_height = visible_height;

        let revision = self.session.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn content_height(&self) -> u16 {
        self.content_height
    }

    pub fn page(&self) -> u16 {
        (self.visible_height / 2).max(1)
    }

    fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.visible_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tccv_core::{ChatResponse, Reply};

    fn panel() -> Surface<Panel> {
        Surface::new(Panel, &Config::new())
    }

    fn send(surface: &mut Surface<Panel>, text: &str, reply: &str) {
        for c in text.chars() {
            surface.session.composer_mut().insert(c);
        }
        let outbound = surface.session.submit().unwrap();
        surface.session.resolve(Reply {
            id: outbound.id,
            outcome: Ok(ChatResponse {
                response: reply.to_string(),
            }),
        });
    }

    #[test]
    fn new_messages_scroll_to_bottom() {
        let mut surface = panel();
        surface.update_viewport(5, 10);
        assert_eq!(surface.scroll, 0);

        send(&mut surface, "hi", "hello");
        surface.update_viewport(30, 10);
        assert_eq!(surface.scroll, 20);
    }

    #[test]
    fn manual_scroll_sticks_until_next_change() {
        let mut surface = panel();
        send(&mut surface, "hi", "hello");
        surface.update_viewport(30, 10);

        surface.scroll_up(7);
        surface.update_viewport(30, 10);
        assert_eq!(surface.scroll, 13);

        surface.scroll_down(100);
        assert_eq!(surface.scroll, 20);

        surface.scroll_up(20);
        send(&mut surface, "again", "ok");
        surface.update_viewport(40, 10);
        assert_eq!(surface.scroll, 30);
    }

    #[test]
    fn presentations_size_the_composer_differently() {
        let mut composer = Composer::new();
        for c in "a\nb\nc\nd\ne\nf\ng".chars() {
            composer.insert(c);
        }
        assert_eq!(Panel.composer_height(&composer), 5);
        assert_eq!(Widget.composer_height(&composer), 2);

        composer.clear();
        assert_eq!(Panel.composer_height(&composer), 1);
    }
}
