//! Client execution logic.

use std::ops::ControlFlow;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tsudoi_shared::time::SystemClock;

use crate::{
    config::ClientConfig,
    controller::SessionController,
    error::ClientError,
    event::{Event, EventSender, TokioScheduler},
    terminal::{PROMPT, TerminalView},
    token_store::TokenStore,
    transport::WebSocketTransport,
};

/// Run the chat client until the user quits.
///
/// Connects immediately and keeps reconnecting according to the configured
/// policy. Only an exhausted reconnect cap ends the session with an error.
pub async fn run_client(
    config: ClientConfig,
    store: Box<dyn TokenStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let mut controller = SessionController::new(
        config,
        store,
        Box::new(TerminalView::new()),
        Box::new(WebSocketTransport::new(events_tx.clone())),
        Box::new(TokioScheduler::new(events_tx.clone())),
        Box::new(SystemClock),
    );

    spawn_line_reader(events_tx);
    controller.connect()?;

    while let Some(event) = events_rx.recv().await {
        match controller.handle(event) {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => {
                tracing::info!("Exiting");
                break;
            }
            Err(e @ ClientError::ReconnectExhausted(_)) => return Err(Box::new(e)),
            Err(e) => tracing::error!("{}", e),
        }
    }

    Ok(())
}

/// Lines that carry a password are kept out of the editor history
fn is_sensitive(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("/login ") || line.starts_with("/register ")
}

/// Read lines on a blocking thread (rustyline is synchronous) and post them
/// to the event loop.
fn spawn_line_reader(events: EventSender) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                events.send(Event::Quit).ok();
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() && !is_sensitive(&line) {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if events.send(Event::Input(line)).is_err() {
                        // Event loop gone, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    events.send(Event::Quit).ok();
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    events.send(Event::Quit).ok();
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    events.send(Event::Quit).ok();
                    break;
                }
            }
        }
    });
}
