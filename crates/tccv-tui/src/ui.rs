use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, BorderType, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};
use tccv_core::render::view;
use tccv_core::{RowBody, Sender, View};

use crate::app::{App, FeatureIcon};
use crate::layout;
use crate::markdown::render_markdown;
use crate::surface::{Presentation, Surface, SurfaceId};

const INPUT_PLACEHOLDER: &str = "Nhập tin nhắn...";
const TYPING_TEXT: &str = "Đang soạn tin nhắn";

pub fn render<B>(app: &mut App<B>, frame: &mut Frame) {
    let area = frame.area();
    app.viewport = area;

    render_panel(app, frame, area);

    if app.popup_open {
        render_popup(app, frame, layout::popup_area(area));
    } else {
        app.widget_chat_area = None;
        app.widget_input_area = None;
        app.widget_send_area = None;
    }

    render_launcher(frame, layout::launcher_area(area, app.popup_open));
    place_cursor(app, frame);
}

/// Rows the chat paragraph takes once word-wrapped to `width`
fn wrapped_height(paragraph: &Paragraph, width: u16) -> u16 {
    u16::try_from(paragraph.line_count(width.max(1))).unwrap_or(u16::MAX)
}

/// Hard-wrap composer text to `width` columns.
///
/// Returns the visual rows and the cursor's (row, col) on them.
fn composer_rows(text: &str, cursor: usize, width: u16) -> (Vec<String>, (u16, u16)) {
    let width = width.max(1) as usize;
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut col = 0;
    let mut at = None;

    for (i, c) in text.chars().enumerate() {
        if c != '\n' && col == width {
            rows.push(std::mem::take(&mut current));
            col = 0;
        }
        if i == cursor {
            at = Some((rows.len(), col.min(width - 1)));
        }
        if c == '\n' {
            rows.push(std::mem::take(&mut current));
            col = 0;
        } else {
            current.push(c);
            col += 1;
        }
    }

    // A cursor after a full last row starts the next one
    if at.is_none() && col == width {
        rows.push(std::mem::take(&mut current));
        col = 0;
    }
    rows.push(current);

    let (row, col) = at.unwrap_or((rows.len() - 1, col));
    let clamp = |n: usize| u16::try_from(n).unwrap_or(u16::MAX);
    (rows, (clamp(row), clamp(col)))
}

fn chat_lines<P: Presentation>(surface: &Surface<P>, animation_frame: u8) -> Vec<Line<'static>> {
    let presentation = &surface.presentation;
    let session = &surface.session;

    let rows = match view(session.conversation(), session.is_typing()) {
        View::Placeholder(prompt) => {
            return vec![
                Line::default(),
                Line::from(Span::styled(
                    prompt,
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .centered(),
            ];
        }
        View::Rows(rows) => rows,
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    for row in rows {
        match row.sender {
            Sender::User => lines.push(
                Line::from(Span::styled(
                    presentation.user_label(),
                    Style::default()
                        .fg(presentation.user_color())
                        .add_modifier(Modifier::BOLD),
                ))
                .right_aligned(),
            ),
            Sender::Bot => lines.push(Line::from(Span::styled(
                presentation.bot_label(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))),
        }

        match row.body {
            RowBody::Plain(text) => {
                for line in text.split('\n') {
                    lines.push(Line::from(line.to_string()).right_aligned());
                }
            }
            RowBody::Markdown(text) => lines.extend(render_markdown(&text)),
            RowBody::Typing => {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("{TYPING_TEXT}{dots}"),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
        lines.push(Line::default());
    }
    lines
}

fn render_chat<P: Presentation>(
    surface: &mut Surface<P>,
    frame: &mut Frame,
    area: Rect,
    focused: bool,
    animation_frame: u8,
) {
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);

    let chat = Paragraph::new(Text::from(chat_lines(surface, animation_frame)))
        .wrap(Wrap { trim: false });
    surface.update_viewport(wrapped_height(&chat, inner.width), inner.height);

    let chat = chat.block(block).scroll((surface.scroll, 0));
    frame.render_widget(chat, area);

    if surface.content_height() > inner.height {
        let mut state = ScrollbarState::new(surface.content_height() as usize)
            .position(surface.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut state,
        );
    }
}

fn render_composer<P: Presentation>(
    surface: &Surface<P>,
    frame: &mut Frame,
    area: Rect,
    focused: bool,
) {
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let composer = surface.session.composer();
    let input = if composer.text().is_empty() {
        Paragraph::new(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        // Keep the cursor row in view once the text outgrows the box
        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2);
        let (rows, (row, _)) = composer_rows(composer.text(), composer.cursor(), inner_width);
        let scroll = row.saturating_sub(inner_height.saturating_sub(1));
        let lines: Vec<Line> = rows.into_iter().map(Line::from).collect();
        Paragraph::new(lines)
            .style(Style::default().fg(surface.presentation.user_color()))
            .scroll((scroll, 0))
    };

    frame.render_widget(input.block(block), area);
}

fn render_send_button(frame: &mut Frame, area: Rect, label: &str, bordered: bool) {
    let mut button = Paragraph::new(Span::styled(
        label.to_string(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .style(Style::default().bg(Color::Blue));
    if bordered {
        button = button.block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Blue)),
        );
    }
    frame.render_widget(button, area);
}

fn render_panel<B>(app: &mut App<B>, frame: &mut Frame, area: Rect) {
    let composer_height = app
        .panel
        .presentation
        .composer_height(app.panel.session.composer())
        + 2;

    let [header_area, chat_area, composer_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(composer_height),
        Constraint::Length(1),
    ])
    .areas(area);

    app.panel_chat_area = Some(chat_area);

    // Header
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.panel.presentation.title()),
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            if app.panel.session.is_typing() { " ● " } else { "" },
            Style::default().fg(Color::Yellow),
        ),
    ]));
    frame.render_widget(header, header_area);

    let panel_focused = app.focus == SurfaceId::Panel;
    render_chat(&mut app.panel, frame, chat_area, panel_focused, app.animation_frame);

    // Composer row: icons, input, send button
    let icons_width = if app.panel.presentation.shows_feature_icons() { 10 } else { 0 };
    let [icons_area, input_area, send_area] = Layout::horizontal([
        Constraint::Length(icons_width),
        Constraint::Min(0),
        Constraint::Length(5),
    ])
    .areas(composer_area);

    app.icon_areas.clear();
    if icons_width > 0 {
        let icon_y = icons_area.y + icons_area.height / 2;
        for (i, icon) in FeatureIcon::all().into_iter().enumerate() {
            let icon_area = Rect::new(icons_area.x + 1 + 3 * i as u16, icon_y, 2, 1)
                .intersection(icons_area);
            frame.render_widget(Paragraph::new(icon.symbol()), icon_area);
            app.icon_areas.push((icon, icon_area));
        }
    }

    render_composer(&app.panel, frame, input_area, panel_focused);
    app.panel_input_area = Some(input_area);
    render_send_button(frame, send_area, app.panel.presentation.send_label(), true);
    app.panel_send_area = Some(send_area);

    // Footer: notice if any, otherwise key hints
    let footer = match &app.notice {
        Some((notice, _)) => Line::from(Span::styled(
            format!(" {} ", notice.0),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        None => {
            let mut spans = vec![Span::styled(
                " Enter send · Alt+Enter newline · Ctrl+T chat bot · Tab focus · PgUp/PgDn scroll · Ctrl+C quit",
                Style::default().fg(Color::DarkGray),
            )];
            if app.panel.presentation.shows_feature_icons() {
                let tips: Vec<String> = FeatureIcon::all()
                    .iter()
                    .map(|icon| format!("{} {}", icon.symbol(), icon.tooltip()))
                    .collect();
                spans.push(Span::styled(
                    format!(" · {}", tips.join("  ")),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn render_popup<B>(app: &mut App<B>, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let composer_height = app
        .widget
        .presentation
        .composer_height(app.widget.session.composer())
        + 2;

    let [title_area, chat_area, composer_area, send_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(composer_height),
        Constraint::Length(1),
    ])
    .areas(area);

    app.widget_chat_area = Some(chat_area);
    app.widget_send_area = Some(send_area);

    let title = Paragraph::new(Span::styled(
        app.widget.presentation.title(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .style(Style::default().bg(Color::Blue));
    frame.render_widget(title, title_area);

    let widget_focused = app.focus == SurfaceId::Widget;
    render_chat(&mut app.widget, frame, chat_area, widget_focused, app.animation_frame);
    render_composer(&app.widget, frame, composer_area, widget_focused);
    app.widget_input_area = Some(composer_area);
    render_send_button(frame, send_area, app.widget.presentation.send_label(), false);
}

fn render_launcher(frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    frame.render_widget(Clear, area);
    let button = Paragraph::new("💬")
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Blue)),
        );
    frame.render_widget(button, area);
}

fn place_cursor<B>(app: &App<B>, frame: &mut Frame) {
    let (session, area) = match app.focus {
        SurfaceId::Widget if app.popup_open => (&app.widget.session, app.widget_input_area),
        _ => (&app.panel.session, app.panel_input_area),
    };
    let Some(area) = area else { return };

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return;
    }

    let composer = session.composer();
    let (_, (row, col)) = composer_rows(composer.text(), composer.cursor(), inner_width);
    let row = row.min(inner_height - 1);
    let col = col.min(inner_width - 1);
    frame.set_cursor_position((area.x + 1 + col, area.y + 1 + row));
}
