//! The command line language.
//!
//! Each input line is one command: a bare word (`report`, `end`) or a word
//! followed by one or three quoted identifiers, separated by single spaces:
//!
//! ```text
//! addent "id"
//! delent "id"
//! addrel "from" "to" "type"
//! delrel "from" "to" "type"
//! report
//! end
//! ```
//!
//! Identifiers are non-empty runs of letters, digits, hyphen, and
//! underscore. Anything else (unknown command word, wrong arity, stray
//! bytes, unterminated quotes) parses to an error; the stream driver
//! ignores such lines rather than failing the run.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char as pchar,
    combinator::{all_consuming, value},
    sequence::delimited,
    IResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed command, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    AddEnt { id: String },
    DelEnt { id: String },
    AddRel { from: String, to: String, rel_type: String },
    DelRel { from: String, to: String, rel_type: String },
    Report,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command {word:?}")]
    UnknownCommand { word: String },
    #[error("malformed arguments for `{command}`")]
    BadArguments { command: &'static str },
}

fn is_ident_byte(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn quoted_ident(input: &str) -> IResult<&str, &str> {
    delimited(pchar('"'), take_while1(is_ident_byte), pchar('"'))(input)
}

fn parse_addent(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("addent ")(input)?;
    let (input, id) = quoted_ident(input)?;
    Ok((input, Command::AddEnt { id: id.to_string() }))
}

fn parse_delent(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("delent ")(input)?;
    let (input, id) = quoted_ident(input)?;
    Ok((input, Command::DelEnt { id: id.to_string() }))
}

fn parse_addrel(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("addrel ")(input)?;
    let (input, from) = quoted_ident(input)?;
    let (input, _) = pchar(' ')(input)?;
    let (input, to) = quoted_ident(input)?;
    let (input, _) = pchar(' ')(input)?;
    let (input, rel_type) = quoted_ident(input)?;
    Ok((
        input,
        Command::AddRel {
            from: from.to_string(),
            to: to.to_string(),
            rel_type: rel_type.to_string(),
        },
    ))
}

fn parse_delrel(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("delrel ")(input)?;
    let (input, from) = quoted_ident(input)?;
    let (input, _) = pchar(' ')(input)?;
    let (input, to) = quoted_ident(input)?;
    let (input, _) = pchar(' ')(input)?;
    let (input, rel_type) = quoted_ident(input)?;
    Ok((
        input,
        Command::DelRel {
            from: from.to_string(),
            to: to.to_string(),
            rel_type: rel_type.to_string(),
        },
    ))
}

fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        parse_addent,
        parse_delent,
        parse_addrel,
        parse_delrel,
        value(Command::Report, tag("report")),
        value(Command::End, tag("end")),
    ))(input)
}

/// Parse one input line (without its terminating newline).
pub fn parse_line(line: &str) -> Result<Command, CommandParseError> {
    if line.is_empty() {
        return Err(CommandParseError::Empty);
    }
    match all_consuming(parse_command)(line) {
        Ok((_, command)) => Ok(command),
        Err(_) => {
            let word = line.split(' ').next().unwrap_or(line);
            match word {
                "addent" => Err(CommandParseError::BadArguments { command: "addent" }),
                "delent" => Err(CommandParseError::BadArguments { command: "delent" }),
                "addrel" => Err(CommandParseError::BadArguments { command: "addrel" }),
                "delrel" => Err(CommandParseError::BadArguments { command: "delrel" }),
                "report" => Err(CommandParseError::BadArguments { command: "report" }),
                "end" => Err(CommandParseError::BadArguments { command: "end" }),
                _ => Err(CommandParseError::UnknownCommand {
                    word: word.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command_form() {
        assert_eq!(
            parse_line("addent \"alice\""),
            Ok(Command::AddEnt {
                id: "alice".to_string()
            })
        );
        assert_eq!(
            parse_line("delent \"a-b_c9\""),
            Ok(Command::DelEnt {
                id: "a-b_c9".to_string()
            })
        );
        assert_eq!(
            parse_line("addrel \"a\" \"b\" \"follows\""),
            Ok(Command::AddRel {
                from: "a".to_string(),
                to: "b".to_string(),
                rel_type: "follows".to_string()
            })
        );
        assert_eq!(
            parse_line("delrel \"a\" \"b\" \"follows\""),
            Ok(Command::DelRel {
                from: "a".to_string(),
                to: "b".to_string(),
                rel_type: "follows".to_string()
            })
        );
        assert_eq!(parse_line("report"), Ok(Command::Report));
        assert_eq!(parse_line("end"), Ok(Command::End));
    }

    #[test]
    fn self_loops_parse_like_any_relation() {
        assert_eq!(
            parse_line("addrel \"x\" \"x\" \"t\""),
            Ok(Command::AddRel {
                from: "x".to_string(),
                to: "x".to_string(),
                rel_type: "t".to_string()
            })
        );
    }

    #[test]
    fn unknown_words_are_reported_as_unknown() {
        assert_eq!(
            parse_line("frobnicate \"a\""),
            Err(CommandParseError::UnknownCommand {
                word: "frobnicate".to_string()
            })
        );
    }

    #[test]
    fn arity_and_quoting_errors_are_malformed_arguments() {
        for line in [
            "addent",
            "addent alice",
            "addent \"\"",
            "addent \"a\" \"b\"",
            "addrel \"a\" \"b\"",
            "addrel \"a\" \"b\" \"c\" \"d\"",
            "delrel \"a\" \"b\" \"c",
            "report now",
            "end ",
        ] {
            match parse_line(line) {
                Err(CommandParseError::BadArguments { .. }) => {}
                other => panic!("expected BadArguments for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_line_is_its_own_error() {
        assert_eq!(parse_line(""), Err(CommandParseError::Empty));
    }

    #[test]
    fn identifier_bytes_are_exact() {
        // No case folding, no trimming inside quotes.
        assert_eq!(
            parse_line("addent \"Alice\""),
            Ok(Command::AddEnt {
                id: "Alice".to_string()
            })
        );
        assert!(parse_line("addent \"al ice\"").is_err());
        assert!(parse_line("addent \"al\"ice\"").is_err());
    }
}
