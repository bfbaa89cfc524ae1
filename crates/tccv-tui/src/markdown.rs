use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

fn code_style() -> Style {
    Style::default().fg(Color::Cyan)
}

fn math_style() -> Style {
    Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC)
}

/// Render bot markdown (with `$...$` / `$$...$$` math) into styled lines.
///
/// Terminals cannot typeset TeX, so math keeps its source and is only
/// highlighted.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);

    let mut renderer = Renderer::default();
    for event in Parser::new_ext(text, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    // None for bullet lists, Some(next number) for ordered ones
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl Renderer {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn push_text(&mut self, text: String) {
        let style = self.style();
        self.current.push(Span::styled(text, style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank_line(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.lines() {
                        self.current.push(Span::styled(format!("  {line}"), code_style()));
                        self.flush();
                    }
                } else {
                    self.push_text(text.into_string());
                }
            }
            Event::Code(code) => {
                self.current.push(Span::styled(code.into_string(), code_style()));
            }
            Event::InlineMath(math) => {
                self.current.push(Span::styled(math.into_string(), math_style()));
            }
            Event::DisplayMath(math) => {
                self.flush();
                for line in math.trim().lines() {
                    self.current.push(Span::styled(format!("    {}", line.trim()), math_style()));
                    self.flush();
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_text(html.into_string());
            }
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " }.to_string());
            }
            Event::SoftBreak | Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.blank_line();
                self.push_style(Modifier::BOLD | Modifier::UNDERLINED);
            }
            Tag::Strong => self.push_style(Modifier::BOLD),
            Tag::Emphasis => self.push_style(Modifier::ITALIC),
            Tag::Strikethrough => self.push_style(Modifier::CROSSED_OUT),
            Tag::Link { .. } => self.push_style(Modifier::UNDERLINED),
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.current.push(Span::raw(marker));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.blank_line();
            }
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough | TagEnd::Link => {
                self.styles.pop();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::Item => self.flush(),
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn plain_text_is_one_line() {
        assert_eq!(plain(&render_markdown("4")), vec!["4"]);
    }

    #[test]
    fn strong_and_emphasis_are_styled() {
        let lines = render_markdown("**bold** and *soft*");
        assert_eq!(plain(&lines), vec!["bold and soft"]);

        let spans = &lines[0].spans;
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(spans[2].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn lists_get_markers() {
        assert_eq!(plain(&render_markdown("- a\n- b")), vec!["• a", "• b"]);
        assert_eq!(plain(&render_markdown("1. x\n2. y")), vec!["1. x", "2. y"]);
    }

    #[test]
    fn nested_lists_are_indented() {
        let lines = render_markdown("- a\n  - b\n- c");
        assert_eq!(plain(&lines), vec!["• a", "  • b", "• c"]);
    }

    #[test]
    fn paragraphs_are_separated_by_a_blank_line() {
        assert_eq!(plain(&render_markdown("one\n\ntwo")), vec!["one", "", "two"]);
    }

    #[test]
    fn soft_breaks_keep_bot_line_breaks() {
        assert_eq!(plain(&render_markdown("one\ntwo")), vec!["one", "two"]);
    }

    #[test]
    fn inline_math_is_highlighted() {
        let lines = render_markdown("area is $\\pi r^2$ here");
        assert_eq!(plain(&lines), vec!["area is \\pi r^2 here"]);
        assert!(lines[0]
            .spans
            .iter()
            .any(|span| span.content == "\\pi r^2" && span.style == math_style()));
    }

    #[test]
    fn display_math_gets_its_own_line() {
        let lines = render_markdown("Sum:\n\n$$a + b = c$$");
        let text = plain(&lines);
        assert_eq!(text.last().map(String::as_str), Some("    a + b = c"));
        assert_eq!(lines.last().unwrap().spans[0].style, math_style());
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let lines = render_markdown("```\nlet x = 1;\nlet y = 2;\n```");
        assert_eq!(plain(&lines), vec!["  let x = 1;", "  let y = 2;"]);
        assert_eq!(lines[0].spans[0].style, code_style());
    }
}
