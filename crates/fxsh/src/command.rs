//! # Command syntax
//!
//! One command per line. Words are separated by `_`, list elements by `&`:
//!
//! ```text
//! add_<text>
//! addFile_<path>
//! get_<id>
//! abi_<id>
//! deploy_<path>_<fx>&<fx>[_<type>&<type>]
//! call_<manifest>_<fx>[_<arg>&<arg>]
//! script_<path>
//! help
//! exit
//! ```
//!
//! `add` keeps everything after the first `_` verbatim, underscores and spaces
//! included. A type may carry a codec id as `name@<id>`.

use std::path::PathBuf;

use fxrun::TypeDescriptor;
use fxstore::ContentId;
use fxstore::ParseIdError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    AddFile(PathBuf),
    Get(ContentId),
    Abi(ContentId),
    Deploy {
        path: PathBuf,
        entrypoints: Vec<String>,
        args: Vec<TypeDescriptor>,
    },
    Call {
        manifest: ContentId,
        entrypoint: String,
        args: Vec<ContentId>,
    },
    Script(PathBuf),
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    /// A required operand is absent or blank.
    Missing { command: &'static str, operand: &'static str },
    TooManyOperands { command: &'static str, max: usize },
    EmptyListItem { command: &'static str },
    BadId { word: String, error: ParseIdError },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand(word) => write!(f, "unknown command '{}' (try help)", word),
            Self::Missing { command, operand } => write!(f, "{}: missing {}", command, operand),
            Self::TooManyOperands { command, max } => {
                write!(f, "{}: takes at most {} operands", command, max)
            }
            Self::EmptyListItem { command } => write!(f, "{}: empty list element", command),
            Self::BadId { word, error } => write!(f, "invalid id '{}': {}", word, error),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parses one input line.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let (head, rest) = match line.split_once('_') {
        Some((head, rest)) => (head.trim(), Some(rest)),
        None => (line.trim(), None),
    };

    match head {
        "help" => no_operands("help", rest).map(|_| Command::Help),
        "exit" => no_operands("exit", rest).map(|_| Command::Exit),
        "add" => rest
            .map(|text| Command::Add(text.to_string()))
            .ok_or(ParseError::Missing { command: "add", operand: "text" }),
        "addFile" => Ok(Command::AddFile(path("addFile", rest)?)),
        "script" => Ok(Command::Script(path("script", rest)?)),
        "get" => Ok(Command::Get(id(non_empty("get", "id", rest)?)?)),
        "abi" => Ok(Command::Abi(id(non_empty("abi", "id", rest)?)?)),
        "deploy" => parse_deploy(non_empty("deploy", "path", rest)?),
        "call" => parse_call(non_empty("call", "manifest id", rest)?),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_deploy(rest: &str) -> Result<Command> {
    const CMD: &str = "deploy";
    let words: Vec<&str> = rest.split('_').map(str::trim).collect();
    if words.len() > 3 {
        return Err(ParseError::TooManyOperands { command: CMD, max: 3 });
    }

    let path = non_empty(CMD, "path", words.first().copied())?;
    let entrypoints = list(CMD, non_empty(CMD, "entrypoints", words.get(1).copied())?)?
        .into_iter()
        .map(str::to_string)
        .collect();
    let args = match words.get(2) {
        Some(types) => list(CMD, types)?
            .into_iter()
            .map(type_descriptor)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Command::Deploy { path: PathBuf::from(path), entrypoints, args })
}

fn parse_call(rest: &str) -> Result<Command> {
    const CMD: &str = "call";
    let words: Vec<&str> = rest.split('_').map(str::trim).collect();
    if words.len() > 3 {
        return Err(ParseError::TooManyOperands { command: CMD, max: 3 });
    }

    let manifest = id(non_empty(CMD, "manifest id", words.first().copied())?)?;
    let entrypoint = non_empty(CMD, "entrypoint", words.get(1).copied())?.to_string();
    let args = match words.get(2) {
        Some(ids) => list(CMD, ids)?.into_iter().map(id).collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Command::Call { manifest, entrypoint, args })
}

fn type_descriptor(word: &str) -> Result<TypeDescriptor> {
    match word.split_once('@') {
        Some((name, codec)) => Ok(TypeDescriptor::with_codec(name, id(codec)?)),
        None => Ok(TypeDescriptor::new(word)),
    }
}

fn list<'a>(command: &'static str, word: &'a str) -> Result<Vec<&'a str>> {
    let items: Vec<&str> = word.split('&').map(str::trim).collect();
    if items.iter().any(|item| item.is_empty()) {
        return Err(ParseError::EmptyListItem { command });
    }
    Ok(items)
}

fn id(word: &str) -> Result<ContentId> {
    word.trim().parse().map_err(|error| ParseError::BadId { word: word.to_string(), error })
}

fn path(command: &'static str, rest: Option<&str>) -> Result<PathBuf> {
    non_empty(command, "path", rest).map(PathBuf::from)
}

fn non_empty<'a>(command: &'static str, operand: &'static str, word: Option<&'a str>) -> Result<&'a str> {
    match word.map(str::trim) {
        Some(word) if !word.is_empty() => Ok(word),
        _ => Err(ParseError::Missing { command, operand }),
    }
}

fn no_operands(command: &'static str, rest: Option<&str>) -> Result<()> {
    match rest {
        Some(rest) if !rest.trim().is_empty() => Err(ParseError::TooManyOperands { command, max: 0 }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_id(seed: &[u8]) -> ContentId {
        ContentId::of(seed)
    }

    #[test]
    fn test_add_keeps_text_verbatim() {
        assert_eq!(parse("add_Hello World!").unwrap(), Command::Add("Hello World!".into()));
        assert_eq!(parse("add_snake_case_text\n").unwrap(), Command::Add("snake_case_text".into()));
        assert_eq!(parse("add_").unwrap(), Command::Add(String::new()));
        assert!(matches!(parse("add"), Err(ParseError::Missing { command: "add", .. })));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("help").unwrap(), Command::Help);
        assert_eq!(parse("  exit  ").unwrap(), Command::Exit);
        assert_eq!(parse("addFile_data/in.txt").unwrap(), Command::AddFile("data/in.txt".into()));
        assert_eq!(parse("script_demo.fx").unwrap(), Command::Script("demo.fx".into()));

        let id = some_id(b"x");
        assert_eq!(parse(&format!("get_{}", id)).unwrap(), Command::Get(id));
        assert_eq!(parse(&format!("abi_{}", id)).unwrap(), Command::Abi(id));
    }

    #[test]
    fn test_deploy() {
        let codec = some_id(b"codec");
        let cmd = parse(&format!("deploy_echo.wasm_fx&fx2_string&bytes@{}", codec)).unwrap();
        assert_eq!(
            cmd,
            Command::Deploy {
                path: "echo.wasm".into(),
                entrypoints: vec!["fx".into(), "fx2".into()],
                args: vec![TypeDescriptor::new("string"), TypeDescriptor::with_codec("bytes", codec)],
            }
        );

        let bare = parse("deploy_const.wasm_fx").unwrap();
        assert!(matches!(bare, Command::Deploy { ref args, .. } if args.is_empty()));
    }

    #[test]
    fn test_call() {
        let fx = some_id(b"fx");
        let a = some_id(b"a");
        let b = some_id(b"b");

        let cmd = parse(&format!("call_{}_fx_{}&{}", fx, a, b)).unwrap();
        assert_eq!(cmd, Command::Call { manifest: fx, entrypoint: "fx".into(), args: vec![a, b] });

        let zero = parse(&format!("call_{}_fx", fx)).unwrap();
        assert_eq!(zero, Command::Call { manifest: fx, entrypoint: "fx".into(), args: vec![] });
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("frobnicate_x"), Err(ParseError::UnknownCommand("frobnicate".into())));
        assert_eq!(parse("help_me"), Err(ParseError::TooManyOperands { command: "help", max: 0 }));
        assert_eq!(parse("get_"), Err(ParseError::Missing { command: "get", operand: "id" }));
        assert_eq!(
            parse("deploy_echo.wasm"),
            Err(ParseError::Missing { command: "deploy", operand: "entrypoints" })
        );
        assert_eq!(parse("deploy_echo.wasm_fx&&fx2"), Err(ParseError::EmptyListItem { command: "deploy" }));
        assert!(matches!(
            parse("get_abc"),
            Err(ParseError::BadId { error: ParseIdError::Length(3), .. })
        ));

        let fx = some_id(b"fx");
        assert_eq!(
            parse(&format!("call_{}_fx_a_b", fx)),
            Err(ParseError::TooManyOperands { command: "call", max: 3 })
        );
        assert_eq!(
            parse(&format!("call_{}", fx)),
            Err(ParseError::Missing { command: "call", operand: "entrypoint" })
        );
    }
}
