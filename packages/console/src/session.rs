//! Interactive console loop.

use std::sync::{Arc, mpsc as std_mpsc};

use fieldlink_server::domain::DevicePusher;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    command::ConsoleCommand,
    executor::{Outcome, execute},
    formatter::ConsoleFormatter,
};

const PROMPT: &str = "DO> ";

/// Read operator input until `exit`, Ctrl-D or Ctrl-C.
///
/// rustyline blocks, so it runs on its own thread and hands each line over a
/// channel. The thread waits for the line to be handled before prompting
/// again, which keeps command output from interleaving with the prompt.
pub async fn run_console(pusher: Arc<dyn DevicePusher>) {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let (done_tx, done_rx) = std_mpsc::channel::<()>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if line_tx.send(line.to_string()).is_err() || done_rx.recv().is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    print!("{}", ConsoleFormatter::format_help());

    while let Some(line) = line_rx.recv().await {
        let output = match ConsoleCommand::parse(&line) {
            Ok(command) => match execute(command, pusher.as_ref()).await {
                Outcome::Print(text) => text,
                Outcome::Exit => break,
            },
            Err(e) => ConsoleFormatter::format_error(&e),
        };
        print!("{}", output);

        if done_tx.send(()).is_err() {
            break;
        }
    }
}
