//! Text formatting for console output.

use fieldlink_server::domain::{ConnectionId, ConnectionInfo, Record};
use fieldlink_shared::time::millis_to_rfc3339;
use serde_json::Value;

use crate::error::CommandError;

const RULE: &str = "============================================================";

/// Formatter for everything the console prints
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the list of connected devices
    ///
    /// One line per device: id, remote address, declared name and the time
    /// the connection was accepted.
    pub fn format_connections(connections: &[ConnectionInfo]) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push_str("\nConnected devices:\n");

        if connections.is_empty() {
            output.push_str("(No devices connected)\n");
        } else {
            for info in connections {
                let name = if info.name.is_empty() {
                    "-"
                } else {
                    info.name.as_str()
                };
                output.push_str(&format!(
                    "{} ({}) name={} - connected at {}\n",
                    info.id,
                    info.remote_addr,
                    name,
                    millis_to_rfc3339(info.created_at.value())
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the result of a broadcast
    pub fn format_broadcast(record: &Record, sent: usize) -> String {
        format!("broadcast {} to {} device(s)\n", render(record), sent)
    }

    /// Format the result of a unicast
    pub fn format_unicast(record: &Record, id: &ConnectionId, delivered: bool) -> String {
        if delivered {
            format!("sent {} to {}\n", render(record), id)
        } else {
            format!("could not deliver {} to {} (unknown or disconnected)\n", render(record), id)
        }
    }

    pub fn format_error(error: &CommandError) -> String {
        format!("error: {}\n", error)
    }

    pub fn format_help() -> String {
        "\
Commands:
  1 0 0 1               broadcast {\"DO\":[1,0,0,1]} to every device (commas also work)
  cid:<id> 1 0 0 1      send {\"DO\":[1,0,0,1]} to one device
  list                  show connected devices
  help                  show this help
  exit | quit           stop the server and leave (Ctrl-D / Ctrl-C also work)
"
        .to_string()
    }
}

fn render(record: &Record) -> String {
    Value::Object(record.clone()).to_string()
}
