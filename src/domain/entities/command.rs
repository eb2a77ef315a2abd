/// Prefix every command token starts with
pub const COMMAND_PREFIX: char = '/';

/// Which relay action a command triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Sentiment,
    Ask,
}

/// One entry of the command grammar
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: CommandKind,
    /// Without a payload the message falls through to plain text
    pub requires_payload: bool,
}

impl CommandSpec {
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// The commands the relay understands, in match priority order
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "sentiment",
        description: "Analyse the sentiment of a text",
        kind: CommandKind::Sentiment,
        requires_payload: true,
    },
    CommandSpec {
        name: "ask",
        description: "Ask a question about this chat",
        kind: CommandKind::Ask,
        requires_payload: true,
    },
];

/// Result of classifying one inbound text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sentiment(String),
    Ask(String),
    /// Plain text: persisted, never answered
    StoreOnly(String),
    /// Nothing worth storing
    Ignore,
}

impl Command {
    /// Classify a message body.
    ///
    /// The command token must be the whole first word. It is matched
    /// case-insensitively and an `@botname` suffix is dropped, so
    /// `/ASK@my_bot why?` is an ask. A known command without a payload is
    /// plain text.
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.trim_end().is_empty() {
            return Command::Ignore;
        }

        let (token, rest) = match trimmed.find(char::is_whitespace) {
            Some(idx) => trimmed.split_at(idx),
            None => (trimmed, ""),
        };

        if let Some(spec) = find_command(token) {
            let payload = rest.trim();
            if !payload.is_empty() || !spec.requires_payload {
                return match spec.kind {
                    CommandKind::Sentiment => Command::Sentiment(payload.to_string()),
                    CommandKind::Ask => Command::Ask(payload.to_string()),
                };
            }
        }

        Command::StoreOnly(text.to_string())
    }

    /// The text that gets persisted for this command
    pub fn stored_text(&self) -> Option<&str> {
        match self {
            Command::Sentiment(t) | Command::Ask(t) | Command::StoreOnly(t) => Some(t),
            Command::Ignore => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Command::Sentiment(_) => "sentiment",
            Command::Ask(_) => "ask",
            Command::StoreOnly(_) => "store",
            Command::Ignore => "ignore",
        }
    }
}

fn find_command(token: &str) -> Option<&'static CommandSpec> {
    let name = token.strip_prefix(COMMAND_PREFIX)?;
    let name = name.split_once('@').map_or(name, |(name, _bot)| name);
    COMMANDS.iter().find(|c| c.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_payload_is_trimmed() {
        assert_eq!(
            Command::classify("/sentiment   I love this  "),
            Command::Sentiment("I love this".to_string())
        );
    }

    #[test]
    fn test_ask_is_case_insensitive_and_ignores_bot_suffix() {
        assert_eq!(
            Command::classify("/ASK@relay_bot What time is it?"),
            Command::Ask("What time is it?".to_string())
        );
        assert_eq!(Command::classify("/Ask\nmultiline\nquestion"), Command::Ask("multiline\nquestion".to_string()));
    }

    #[test]
    fn test_command_without_payload_is_plain_text() {
        assert_eq!(Command::classify("/ask"), Command::StoreOnly("/ask".to_string()));
        assert_eq!(Command::classify("/sentiment@relay_bot   "), Command::StoreOnly("/sentiment@relay_bot   ".to_string()));
    }

    #[test]
    fn test_token_must_be_whole_word() {
        assert_eq!(Command::classify("/asking about"), Command::StoreOnly("/asking about".to_string()));
        assert_eq!(Command::classify("ask me"), Command::StoreOnly("ask me".to_string()));
        assert_eq!(Command::classify("/help"), Command::StoreOnly("/help".to_string()));
    }

    #[test]
    fn test_plain_text_is_kept_raw() {
        assert_eq!(Command::classify("  hello there "), Command::StoreOnly("  hello there ".to_string()));
    }

    #[test]
    fn test_blank_text_is_ignored() {
        assert_eq!(Command::classify(""), Command::Ignore);
        assert_eq!(Command::classify(" \t\n"), Command::Ignore);
        assert_eq!(Command::Ignore.stored_text(), None);
    }

    #[test]
    fn test_grammar_table() {
        assert!(COMMANDS.iter().all(|c| c.requires_payload));
        assert!(COMMANDS[0].matches("SENTIMENT"));
        assert_eq!(COMMANDS[1].kind, CommandKind::Ask);
    }
}
