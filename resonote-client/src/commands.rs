//! Line commands typed by the annotator

use resonote_common::Facet;
use std::str::FromStr;
use thiserror::Error;

/// Tag argument: a chip number from the displayed list or a tag name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef {
    /// 1-based position in the facet's displayed tags
    Position(usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle { facet: Facet, tag: TagRef },
    Filter { facet: Facet, query: String },
    Clear,
    Save,
    Skip,
    Export,
    ScaleUp,
    ScaleDown,
    ScaleReset,
    /// Show what the server stores for the current track
    Lookup,
    Help,
    /// Asks for confirmation while selections are unsaved
    Quit,
    /// Quit without confirmation
    ForceQuit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command \"{0}\" (h for help)")]
    Unknown(String),

    #[error("Unknown facet \"{0}\" (use 1-4 or a facet name)")]
    UnknownFacet(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
t <facet> <tag|#>   toggle a tag (facet 1-4 or name, tag by name or chip number)
f <facet> [query]   filter a facet's tags; no query shows all
c                   clear all selections
s                   save and continue
k                   skip this track
x                   export annotations (when completed)
+ / - / 0           larger, smaller, default text
v                   show the stored annotation for this track
h                   help
q                   quit (q! discards unsaved selections)";

/// Facet by number (1-4), key or label
pub fn parse_facet(input: &str) -> Result<Facet, ParseError> {
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| Facet::ALL.get(i).copied())
            .ok_or_else(|| ParseError::UnknownFacet(input.to_string()));
    }
    Facet::from_str(input).map_err(|_| ParseError::UnknownFacet(input.to_string()))
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_lowercase().as_str() {
        "t" | "toggle" => {
            let (facet, tag) = split_facet(rest, "t <facet> <tag|#>")?;
            if tag.is_empty() {
                return Err(ParseError::Usage("t <facet> <tag|#>"));
            }
            let tag = match tag.parse::<usize>() {
                Ok(n) if n > 0 => TagRef::Position(n),
                _ => TagRef::Name(tag.to_string()),
            };
            Command::Toggle { facet, tag }
        }
        "f" | "filter" => {
            let (facet, query) = split_facet(rest, "f <facet> [query]")?;
            Command::Filter {
                facet,
                query: query.to_string(),
            }
        }
        "c" | "clear" => Command::Clear,
        "s" | "save" => Command::Save,
        "k" | "skip" => Command::Skip,
        "x" | "export" => Command::Export,
        "+" => Command::ScaleUp,
        "-" => Command::ScaleDown,
        "0" => Command::ScaleReset,
        "v" | "view" => Command::Lookup,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "q!" => Command::ForceQuit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

/// Split `<facet> <remainder>`
fn split_facet<'a>(rest: &'a str, usage: &'static str) -> Result<(Facet, &'a str), ParseError> {
    if rest.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    let (facet, remainder) = match rest.split_once(char::is_whitespace) {
        Some((facet, remainder)) => (facet, remainder.trim()),
        None => (rest, ""),
    };
    Ok((parse_facet(facet)?, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letter_commands() {
        assert_eq!(parse("s"), Ok(Some(Command::Save)));
        assert_eq!(parse(" k "), Ok(Some(Command::Skip)));
        assert_eq!(parse("X"), Ok(Some(Command::Export)));
        assert_eq!(parse("+"), Ok(Some(Command::ScaleUp)));
        assert_eq!(parse("0"), Ok(Some(Command::ScaleReset)));
        assert_eq!(parse("q"), Ok(Some(Command::Quit)));
        assert_eq!(parse("q!"), Ok(Some(Command::ForceQuit)));
        assert_eq!(parse(""), Ok(None));
    }

    #[test]
    fn test_toggle_by_position_and_name() {
        assert_eq!(
            parse("t 1 3"),
            Ok(Some(Command::Toggle {
                facet: Facet::EmotionalTone,
                tag: TagRef::Position(3)
            }))
        );
        assert_eq!(
            parse("t theme coming of age"),
            Ok(Some(Command::Toggle {
                facet: Facet::ThematicContent,
                tag: TagRef::Name("coming of age".to_string())
            }))
        );
        assert_eq!(parse("t 2"), Err(ParseError::Usage("t <facet> <tag|#>")));
    }

    #[test]
    fn test_filter_keeps_query_text() {
        assert_eq!(
            parse("f Lyrical_Style  free verse"),
            Ok(Some(Command::Filter {
                facet: Facet::LyricalStyle,
                query: "free verse".to_string()
            }))
        );
        assert_eq!(
            parse("f 3"),
            Ok(Some(Command::Filter {
                facet: Facet::NarrativeStructure,
                query: String::new()
            }))
        );
    }

    #[test]
    fn test_facet_numbers_are_one_based() {
        assert_eq!(parse_facet("4"), Ok(Facet::LyricalStyle));
        assert_eq!(parse_facet("0"), Err(ParseError::UnknownFacet("0".to_string())));
        assert_eq!(parse_facet("5"), Err(ParseError::UnknownFacet("5".to_string())));
        assert_eq!(parse_facet("tone"), Ok(Facet::EmotionalTone));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse("dance"), Err(ParseError::Unknown("dance".to_string())));
    }
}
