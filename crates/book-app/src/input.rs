use book_core::types::AppEvent;
use kanal::AsyncSender;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// Maps a console command line onto an application event.
pub fn parse_command(line: &str) -> Option<AppEvent> {
    match line.trim() {
        "t" | "trigger" => Some(AppEvent::ManualTrigger),
        "o" | "ocr" => Some(AppEvent::ToggleRecognition),
        "d" | "debug" => Some(AppEvent::ShowStatus),
        "q" | "quit" => Some(AppEvent::Shutdown),
        _ => None,
    }
}

fn print_help() {
    tracing::info!(
        "commands: t/trigger (start projection), o/ocr (toggle recognition), \
         d/debug (status), h/help, q/quit"
    );
}

/// Stdin command reader. Forwards parsed commands to the event channel and
/// stops after a quit command or on cancellation.
pub async fn input_io(
    event_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed; keep the rest of the application running
                    cancel.cancelled().await;
                    break;
                };

                let trimmed = line.trim();
                if trimmed == "h" || trimmed == "help" {
                    print_help();
                    continue;
                }

                match parse_command(trimmed) {
                    Some(event) => {
                        let quit = matches!(event, AppEvent::Shutdown);
                        if let Err(e) = event_tx.send(event).await {
                            tracing::error!("failed to forward command: {e}");
                            break;
                        }
                        if quit {
                            break;
                        }
                    }
                    None if trimmed.is_empty() => {}
                    None => tracing::warn!(command = trimmed, "unknown command"),
                }
            }
        }
    }

    tracing::debug!("input reader stopping");
    Ok(())
}
