//! Parsing of operator input lines.

use fieldlink_server::domain::{ConnectionId, Record};
use serde_json::json;

use crate::error::CommandError;

const UNICAST_PREFIX: &str = "cid:";

/// One parsed line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Push `{"DO": values}` to every device
    Broadcast(Vec<u8>),
    /// Push `{"DO": values}` to one device
    Unicast { id: ConnectionId, values: Vec<u8> },
    List,
    Help,
    Exit,
}

impl ConsoleCommand {
    /// Parse one input line.
    ///
    /// Keywords and the `cid:` prefix are case-insensitive. DO values are
    /// separated by whitespace or commas.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for a missing id, missing values, or a value
    /// other than `0`/`1`.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "list" => return Ok(Self::List),
            "help" => return Ok(Self::Help),
            "exit" | "quit" => return Ok(Self::Exit),
            _ => {}
        }

        let has_prefix = line
            .get(..UNICAST_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(UNICAST_PREFIX));
        if !has_prefix {
            return parse_values(line).map(Self::Broadcast);
        }

        let rest = &line[UNICAST_PREFIX.len()..];
        let (id, values) = match rest.split_once(char::is_whitespace) {
            Some((id, values)) => (id, values),
            None => (rest, ""),
        };
        let id = ConnectionId::try_from(id).map_err(|_| CommandError::MissingConnectionId)?;
        let values = parse_values(values)?;
        Ok(Self::Unicast { id, values })
    }
}

/// `{"DO": [..]}`
pub(crate) fn do_record(values: &[u8]) -> Record {
    let mut record = Record::new();
    record.insert("DO".to_string(), json!(values));
    record
}

fn parse_values(input: &str) -> Result<Vec<u8>, CommandError> {
    let values = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "0" => Ok(0),
            "1" => Ok(1),
            other => Err(CommandError::InvalidValue(other.to_string())),
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if values.is_empty() {
        return Err(CommandError::MissingValues);
    }
    Ok(values)
}
