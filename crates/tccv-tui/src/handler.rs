use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tccv_core::{dispatch, ChatBackend, ChatSession, Outbound};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, FeatureIcon};
use crate::layout;
use crate::surface::SurfaceId;
use crate::tui::AppEvent;

pub fn handle_event<B: ChatBackend>(
    app: &mut App<B>,
    event: AppEvent,
    tx: &UnboundedSender<AppEvent>,
) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse, tx),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Reply { surface, reply } => {
            if let Some(next) = session_mut(app, surface).resolve(reply) {
                spawn_send(app, surface, next, tx);
            }
        }
    }
    Ok(())
}

fn session_mut<B>(app: &mut App<B>, surface: SurfaceId) -> &mut ChatSession {
    match surface {
        SurfaceId::Panel => &mut app.panel.session,
        SurfaceId::Widget => &mut app.widget.session,
    }
}

/// Run the request off the event loop and post the reply back into it
fn spawn_send<B: ChatBackend>(
    app: &App<B>,
    surface: SurfaceId,
    outbound: Outbound,
    tx: &UnboundedSender<AppEvent>,
) {
    let backend = Arc::clone(&app.backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let reply = dispatch(backend.as_ref(), outbound).await;
        // The loop is gone when the app quits with a send still pending
        let _ = tx.send(AppEvent::Reply { surface, reply });
    });
}

fn submit<B: ChatBackend>(app: &mut App<B>, surface: SurfaceId, tx: &UnboundedSender<AppEvent>) {
    if let Some(outbound) = session_mut(app, surface).submit() {
        spawn_send(app, surface, outbound, tx);
    }
}

fn handle_key<B: ChatBackend>(app: &mut App<B>, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('t') if ctrl => {
            app.toggle_popup();
            return;
        }
        KeyCode::F(2) => {
            app.toggle_popup();
            return;
        }
        KeyCode::Esc => {
            if app.popup_open {
                app.toggle_popup();
            }
            return;
        }
        KeyCode::Tab => {
            app.cycle_focus();
            return;
        }
        _ => {}
    }

    // Icon shortcuts only exist on the panel
    if ctrl && app.focus == SurfaceId::Panel {
        let icon = match key.code {
            KeyCode::Char('a') => Some(FeatureIcon::Attach),
            KeyCode::Char('o') => Some(FeatureIcon::SendFile),
            KeyCode::Char('g') => Some(FeatureIcon::Language),
            _ => None,
        };
        if let Some(icon) = icon {
            app.trigger(icon);
            return;
        }
    }

    let surface = app.focus;
    match key.code {
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            session_mut(app, surface).composer_mut().insert_newline();
        }
        KeyCode::Enter => submit(app, surface, tx),
        KeyCode::PageUp => match surface {
            SurfaceId::Panel => app.panel.scroll_up(app.panel.page()),
            SurfaceId::Widget => app.widget.scroll_up(app.widget.page()),
        },
        KeyCode::PageDown => match surface {
            SurfaceId::Panel => app.panel.scroll_down(app.panel.page()),
            SurfaceId::Widget => app.widget.scroll_down(app.widget.page()),
        },
        KeyCode::Char(c) if !ctrl => session_mut(app, surface).composer_mut().insert(c),
        KeyCode::Backspace => session_mut(app, surface).composer_mut().backspace(),
        KeyCode::Delete => session_mut(app, surface).composer_mut().delete(),
        KeyCode::Left => session_mut(app, surface).composer_mut().move_left(),
        KeyCode::Right => session_mut(app, surface).composer_mut().move_right(),
        KeyCode::Home => session_mut(app, surface).composer_mut().move_home(),
        KeyCode::End => session_mut(app, surface).composer_mut().move_end(),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse<B: ChatBackend>(app: &mut App<B>, mouse: MouseEvent, tx: &UnboundedSender<AppEvent>) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    // The popup is drawn over the panel, so it wins any overlap
    let in_widget = app.popup_open && hit(app.widget_chat_area);
    let in_panel = !in_widget && hit(app.panel_chat_area);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_widget {
                app.widget.scroll_down(3);
            } else if in_panel {
                app.panel.scroll_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if in_widget {
                app.widget.scroll_up(3);
            } else if in_panel {
                app.panel.scroll_up(3);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if point_in_rect(x, y, layout::launcher_area(app.viewport, app.popup_open)) {
                app.toggle_popup();
            } else if app.popup_open && point_in_rect(x, y, layout::popup_area(app.viewport)) {
                app.focus = SurfaceId::Widget;
                if hit(app.widget_send_area) {
                    submit(app, SurfaceId::Widget, tx);
                }
            } else {
                app.focus = SurfaceId::Panel;
                let icon = app
                    .icon_areas
                    .iter()
                    .find(|(_, area)| point_in_rect(x, y, *area))
                    .map(|(icon, _)| *icon);
                if hit(app.panel_send_area) {
                    submit(app, SurfaceId::Panel, tx);
                } else if let Some(icon) = icon {
                    app.trigger(icon);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tccv_core::{ApiError, ChatResponse, Config, Message, Notice};
    use tokio::sync::mpsc;

    /// Replies with the sum for "a+b" inputs and fails otherwise
    struct Calculator;

    impl ChatBackend for Calculator {
        async fn send_message(&self, text: &str) -> Result<ChatResponse, ApiError> {
            let sum: Option<i64> = text
                .split('+')
                .map(|n| n.trim().parse::<i64>().ok())
                .sum();
            match sum {
                Some(sum) => Ok(ChatResponse {
                    response: sum.to_string(),
                }),
                None => Err(ApiError::Decode(
                    serde_json::from_str::<ChatResponse>("{}").unwrap_err(),
                )),
            }
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn type_text(
        app: &mut App<Calculator>,
        text: &str,
        tx: &UnboundedSender<AppEvent>,
    ) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)), tx).unwrap();
        }
    }

    #[tokio::test]
    async fn enter_sends_and_reply_lands_in_the_focused_surface() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        type_text(&mut app, "2+2", &tx);
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        assert!(app.panel.session.is_typing());
        assert_eq!(app.panel.session.composer().text(), "");

        let reply = rx.recv().await.unwrap();
        assert!(matches!(reply, AppEvent::Reply { surface: SurfaceId::Panel, .. }));
        handle_event(&mut app, reply, &tx).unwrap();

        assert!(!app.panel.session.is_typing());
        assert_eq!(
            app.panel.session.conversation().messages(),
            &[Message::user("2+2"), Message::bot("4")]
        );
        assert!(app.widget.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn surfaces_keep_separate_conversations() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        handle_event(&mut app, key(KeyCode::F(2)), &tx).unwrap();
        assert_eq!(app.focus, SurfaceId::Widget);

        type_text(&mut app, "1+1", &tx);
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();

        // Closing the popup does not cancel the pending send
        handle_event(&mut app, key(KeyCode::Esc), &tx).unwrap();
        assert!(!app.popup_open);

        let reply = rx.recv().await.unwrap();
        handle_event(&mut app, reply, &tx).unwrap();

        assert_eq!(
            app.widget.session.conversation().messages(),
            &[Message::user("1+1"), Message::bot("2")]
        );
        assert!(app.panel.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn blank_enter_sends_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        type_text(&mut app, "   ", &tx);
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::ALT), &tx).unwrap();
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();

        assert!(app.panel.session.conversation().is_empty());
        assert!(!app.panel.session.is_typing());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn shift_enter_inserts_a_newline() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        type_text(&mut app, "a", &tx);
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::SHIFT), &tx).unwrap();
        type_text(&mut app, "b", &tx);

        assert_eq!(app.panel.session.composer().text(), "a\nb");
        assert!(app.panel.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn failed_send_shows_error_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        type_text(&mut app, "hello", &tx);
        handle_event(&mut app, key(KeyCode::Enter), &tx).unwrap();
        let reply = rx.recv().await.unwrap();
        handle_event(&mut app, reply, &tx).unwrap();

        assert_eq!(
            app.panel.session.conversation().last(),
            Some(&Message::bot(tccv_core::DEFAULT_ERROR_TEXT))
        );
    }

    #[tokio::test]
    async fn ctrl_shortcuts_trigger_feature_hooks() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        handle_event(&mut app, key_with(KeyCode::Char('a'), KeyModifiers::CONTROL), &tx).unwrap();

        assert_eq!(app.notice.as_ref().map(|(n, _)| n.clone()), Some(Notice::upgrading()));
        assert_eq!(app.panel.session.composer().text(), "");
    }

    #[tokio::test]
    async fn resize_leaves_state_alone() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());
        type_text(&mut app, "1+2", &tx);

        handle_event(&mut app, AppEvent::Resize, &tx).unwrap();

        assert_eq!(app.panel.session.composer().text(), "1+2");
        assert_eq!(app.focus, SurfaceId::Panel);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Calculator, &Config::new());

        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL), &tx).unwrap();
        assert!(app.should_quit);
    }
}
