//! Maps a conversation to the rows a surface draws.
//!
//! This is pure: the typing row is synthesized here and never stored.

use crate::state::{Conversation, Sender};

/// Shown instead of an empty message list
pub const EMPTY_PROMPT: &str = "What can I help with?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowBody {
    /// Shown literally
    Plain(String),
    /// Handed to the markdown renderer
    Markdown(String),
    /// The transient "composing" indicator
    Typing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub sender: Sender,
    pub body: RowBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Placeholder(&'static str),
    Rows(Vec<Row>),
}

pub fn view(conversation: &Conversation, typing: bool) -> View {
    if conversation.is_empty() && !typing {
        return View::Placeholder(EMPTY_PROMPT);
    }

    let mut rows: Vec<Row> = conversation
        .messages()
        .iter()
        .map(|message| Row {
            sender: message.sender,
            body: match message.sender {
                Sender::User => RowBody::Plain(message.text.clone()),
                Sender::Bot => RowBody::Markdown(message.text.clone()),
            },
        })
        .collect();

    if typing {
        rows.push(Row {
            sender: Sender::Bot,
            body: RowBody::Typing,
        });
    }

    View::Rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Message;

    #[test]
    fn empty_conversation_shows_placeholder() {
        assert_eq!(view(&Conversation::new(), false), View::Placeholder(EMPTY_PROMPT));
    }

    #[test]
    fn typing_on_empty_conversation_shows_indicator_only() {
        assert_eq!(
            view(&Conversation::new(), true),
            View::Rows(vec![Row {
                sender: Sender::Bot,
                body: RowBody::Typing,
            }])
        );
    }

    #[test]
    fn bot_text_is_markdown_and_user_text_is_plain() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("2+2"));
        conversation.push(Message::bot("4"));

        let View::Rows(rows) = view(&conversation, false) else {
            panic!("expected rows");
        };
        assert_eq!(
            rows,
            vec![
                Row {
                    sender: Sender::User,
                    body: RowBody::Plain("2+2".to_string()),
                },
                Row {
                    sender: Sender::Bot,
                    body: RowBody::Markdown("4".to_string()),
                },
            ]
        );
    }

    #[test]
    fn typing_row_is_last_and_not_stored() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hello"));

        let View::Rows(rows) = view(&conversation, true) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].body, RowBody::Typing);
        assert_eq!(conversation.len(), 1);
    }
}
