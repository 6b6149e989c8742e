use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a message reached the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageScope {
    Direct,
    DirectMention,
    Mention,
    Ambient,
}

impl MessageScope {
    pub fn is_directed(&self) -> bool {
        !matches!(self, Self::Ambient)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct_message",
            Self::DirectMention => "direct_mention",
            Self::Mention => "mention",
            Self::Ambient => "ambient",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Greet,
    SetNickname { name: String },
    WhoAmI,
    Shutdown,
    Identify,
    NotHappy,
    WasIHappy,
    TeamHappiness,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Greet,
    SetNickname,
    WhoAmI,
    Shutdown,
    Identify,
    NotHappy,
    WasIHappy,
    TeamHappiness,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Greet => CommandKind::Greet,
            Self::SetNickname { .. } => CommandKind::SetNickname,
            Self::WhoAmI => CommandKind::WhoAmI,
            Self::Shutdown => CommandKind::Shutdown,
            Self::Identify => CommandKind::Identify,
            Self::NotHappy => CommandKind::NotHappy,
            Self::WasIHappy => CommandKind::WasIHappy,
            Self::TeamHappiness => CommandKind::TeamHappiness,
        }
    }
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid pattern `{pattern}` for {kind:?}: {source}")]
    InvalidPattern { kind: CommandKind, pattern: String, source: regex::Error },
}

struct Route {
    kind: CommandKind,
    patterns: Vec<Regex>,
}

/// Ordered phrase routes; the first matching route wins.
pub struct CommandRouter {
    routes: Vec<Route>,
}

const ROUTE_TABLE: &[(CommandKind, &[&str])] = &[
    (CommandKind::Greet, &[r"\bhello\b", r"\bhi\b"]),
    (CommandKind::SetNickname, &[r"\bcall me (.+)", r"\bmy name is (.+)"]),
    (CommandKind::WhoAmI, &[r"\bwhat is my name\b", r"\bwho am i\b"]),
    (CommandKind::Shutdown, &[r"\bshutdown\b"]),
    (
        CommandKind::Identify,
        &[r"\buptime\b", r"\bidentify yourself\b", r"\bwho are you\b", r"\bwhat is your name\b"],
    ),
    (CommandKind::NotHappy, &[r"\bnot happy\b", r"\bniet blij\b"]),
    (CommandKind::WasIHappy, &[r"\bwas ik blij\b\??"]),
    (CommandKind::TeamHappiness, &[r"\bis het team blij\b\??"]),
];

impl CommandRouter {
    pub fn new() -> Result<Self, RouterError> {
        let routes = ROUTE_TABLE
            .iter()
            .map(|(kind, patterns)| {
                let patterns = patterns
                    .iter()
                    .map(|pattern| {
                        RegexBuilder::new(pattern).case_insensitive(true).build().map_err(
                            |source| RouterError::InvalidPattern {
                                kind: *kind,
                                pattern: (*pattern).to_owned(),
                                source,
                            },
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Route { kind: *kind, patterns })
            })
            .collect::<Result<Vec<_>, RouterError>>()?;

        Ok(Self { routes })
    }

    /// Ambient text never routes; it belongs to the survey gate.
    pub fn route(&self, text: &str, scope: MessageScope) -> Option<Command> {
        if !scope.is_directed() {
            return None;
        }

        self.routes.iter().find_map(|route| {
            route.patterns.iter().find_map(|pattern| {
                let captures = pattern.captures(text)?;
                build_command(route.kind, captures.get(1).map(|m| m.as_str()))
            })
        })
    }
}

fn build_command(kind: CommandKind, capture: Option<&str>) -> Option<Command> {
    Some(match kind {
        CommandKind::Greet => Command::Greet,
        CommandKind::SetNickname => {
            let name = capture?.trim();
            if name.is_empty() {
                return None;
            }
            Command::SetNickname { name: name.to_owned() }
        }
        CommandKind::WhoAmI => Command::WhoAmI,
        CommandKind::Shutdown => Command::Shutdown,
        CommandKind::Identify => Command::Identify,
        CommandKind::NotHappy => Command::NotHappy,
        CommandKind::WasIHappy => Command::WasIHappy,
        CommandKind::TeamHappiness => Command::TeamHappiness,
    })
}
