use std::sync::Arc;

use ratatui::layout::Rect;
use tccv_core::{ChatBackend, Config, FeatureHooks, HttpChatClient, NoopHooks, Notice};

use crate::surface::{Panel, Surface, SurfaceId, Widget};

/// How many ticks a notice stays in the footer (~3s)
const NOTICE_TICKS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureIcon {
    Attach,
    SendFile,
    Language,
}

impl FeatureIcon {
    pub fn all() -> [FeatureIcon; 3] {
        [FeatureIcon::Attach, FeatureIcon::SendFile, FeatureIcon::Language]
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            FeatureIcon::Attach => "📎",
            FeatureIcon::SendFile => "📄",
            FeatureIcon::Language => "🌐",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            FeatureIcon::Attach => "Đính kèm",
            FeatureIcon::SendFile => "Gửi file",
            FeatureIcon::Language => "Ngôn ngữ",
        }
    }
}

pub struct App<B = HttpChatClient> {
    // Core state
    pub should_quit: bool,
    pub focus: SurfaceId,
    pub popup_open: bool,

    // Surfaces, each with its own conversation
    pub panel: Surface<Panel>,
    pub widget: Surface<Widget>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transient footer message and ticks left
    pub notice: Option<(Notice, u8)>,

    // Last drawn terminal size; popup geometry is derived from it
    pub viewport: Rect,

    // Panel areas for mouse hit-testing (updated during render)
    pub panel_chat_area: Option<Rect>,
    pub widget_chat_area: Option<Rect>,
    pub panel_input_area: Option<Rect>,
    pub widget_input_area: Option<Rect>,
    pub panel_send_area: Option<Rect>,
    pub widget_send_area: Option<Rect>,
    pub icon_areas: Vec<(FeatureIcon, Rect)>,

    // Collaborators
    pub backend: Arc<B>,
    pub hooks: Box<dyn FeatureHooks>,
}

impl<B: ChatBackend> App<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            should_quit: false,
            focus: SurfaceId::Panel,
            popup_open: false,

            panel: Surface::new(Panel, config),
            widget: Surface::new(Widget, config),

            animation_frame: 0,
            notice: None,
            viewport: Rect::default(),

            panel_chat_area: None,
            widget_chat_area: None,
            panel_input_area: None,
            widget_input_area: None,
            panel_send_area: None,
            widget_send_area: None,
            icon_areas: Vec::new(),

            backend: Arc::new(backend),
            hooks: Box::new(NoopHooks),
        }
    }

    pub fn toggle_popup(&mut self) {
        self.popup_open = !self.popup_open;
        self.focus = if self.popup_open {
            SurfaceId::Widget
        } else {
            SurfaceId::Panel
        };
    }

    /// Tab between the surfaces; the widget can only take focus while open
    pub fn cycle_focus(&mut self) {
        if self.popup_open {
            self.focus = match self.focus {
                SurfaceId::Panel => SurfaceId::Widget,
                SurfaceId::Widget => SurfaceId::Panel,
            };
        }
    }

    pub fn any_typing(&self) -> bool {
        self.panel.session.is_typing() || self.widget.session.is_typing()
    }

    /// Tick animation frame and expire notices (called by Tick event)
    pub fn tick(&mut self) {
        if self.any_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some((_, ticks)) = &mut self.notice {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.notice = None;
            }
        }
    }

    pub fn trigger(&mut self, icon: FeatureIcon) {
        let notice = match icon {
            FeatureIcon::Attach => self.hooks.attach(),
            FeatureIcon::SendFile => self.hooks.send_file(),
            FeatureIcon::Language => self.hooks.language(),
        };
        if let Some(notice) = notice {
            tracing::info!(?icon, notice = %notice.0, "feature hook");
            self.notice = Some((notice, NOTICE_TICKS));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(HttpChatClient::new("http://127.0.0.1:9/query"), &Config::new())
    }

    #[test]
    fn popup_toggle_moves_focus() {
        let mut app = app();
        assert_eq!(app.focus, SurfaceId::Panel);

        app.toggle_popup();
        assert!(app.popup_open);
        assert_eq!(app.focus, SurfaceId::Widget);

        app.toggle_popup();
        assert!(!app.popup_open);
        assert_eq!(app.focus, SurfaceId::Panel);
    }

    #[test]
    fn focus_stays_on_panel_while_popup_closed() {
        let mut app = app();
        app.cycle_focus();
        assert_eq!(app.focus, SurfaceId::Panel);

        app.toggle_popup();
        app.cycle_focus();
        assert_eq!(app.focus, SurfaceId::Panel);
    }

    #[test]
    fn feature_icons_show_a_notice_that_expires() {
        let mut app = app();
        app.trigger(FeatureIcon::Language);
        assert_eq!(app.notice.as_ref().map(|(n, _)| n.clone()), Some(Notice::upgrading()));

        for _ in 0..NOTICE_TICKS {
            app.tick();
        }
        assert!(app.notice.is_none());
    }

    #[test]
    fn custom_hooks_can_stay_silent() {
        struct Quiet;
        impl FeatureHooks for Quiet {
            fn attach(&self) -> Option<Notice> {
                None
            }
        }

        let mut app = app();
        app.hooks = Box::new(Quiet);
        app.trigger(FeatureIcon::Attach);
        assert!(app.notice.is_none());

        app.trigger(FeatureIcon::SendFile);
        assert!(app.notice.is_some());
    }
}
