use std::str::FromStr;
use std::time::Duration;

use humantime::parse_duration;
use toast_store::error::CommandError;
use toast_store::{Position, ToastId, ToastKind};

/// One line of driver input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(AddToast),
    Pause(ToastId),
    Resume(ToastId),
    Remove(ToastId),
    List,
}

/// `add <id> [kind] [position] [timeout] [--] <message...>`
///
/// Optional fields are recognised in that order; the first token that does
/// not parse as the next optional field starts the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToast {
    pub id: ToastId,
    pub kind: Option<ToastKind>,
    pub position: Option<Position>,
    pub timeout: Option<Duration>,
    pub message: String,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or(CommandError::Empty)?;
        match verb.to_ascii_lowercase().as_str() {
            "add" => parse_add(tokens).map(Self::Add),
            "pause" | "hover" => parse_id("pause", tokens).map(Self::Pause),
            "resume" | "leave" => parse_id("resume", tokens).map(Self::Resume),
            "remove" | "rm" | "dismiss" => parse_id("remove", tokens).map(Self::Remove),
            "list" | "ls" => Ok(Self::List),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_id<'a>(
    command: &'static str,
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<ToastId, CommandError> {
    let raw = tokens.next().ok_or(CommandError::MissingArgument { command, arg: "id" })?;
    raw.parse::<u64>()
        .map(ToastId)
        .map_err(|err| CommandError::InvalidArgument {
            arg: "id",
            message: format!("{raw}: {err}"),
        })
}

fn parse_add<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<AddToast, CommandError> {
    let mut tokens = tokens.peekable();
    let id = parse_id("add", &mut tokens)?;

    let kind = tokens.next_if_map_ok(|t| t.parse::<ToastKind>());
    let position = tokens.next_if_map_ok(|t| t.parse::<Position>());
    let timeout = tokens.next_if_map_ok(parse_duration);
    let _ = tokens.next_if_eq(&"--");

    let message = tokens.collect::<Vec<_>>().join(" ");
    if message.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "add",
            arg: "message",
        });
    }
    if timeout.is_some_and(|t| t.is_zero()) {
        return Err(CommandError::InvalidArgument {
            arg: "timeout",
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(AddToast {
        id,
        kind,
        position,
        timeout,
        message,
    })
}

trait NextIfMapOk<'a> {
    /// Consumes the next token only if `parse` accepts it.
    fn next_if_map_ok<T, E>(&mut self, parse: impl Fn(&'a str) -> Result<T, E>) -> Option<T>;
}

impl<'a, I> NextIfMapOk<'a> for std::iter::Peekable<I>
where
    I: Iterator<Item = &'a str>,
{
    fn next_if_map_ok<T, E>(&mut self, parse: impl Fn(&'a str) -> Result<T, E>) -> Option<T> {
        let value = parse(*self.peek()?).ok()?;
        self.next();
        Some(value)
    }
}
