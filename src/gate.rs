//! Human-in-the-loop pause used by `--debug`.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use console::Term;
use std::io::IsTerminal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

const PROMPT: &str = "Debug mode: attach your debugger, then press Enter to continue";

/// Suspends the run until someone confirms. There is no timeout.
#[async_trait]
pub trait ConfirmGate: Send + Sync {
    async fn confirm(&self) -> Result<()>;
}

/// Waits for Enter on stdin: an interactive prompt on a terminal, a plain
/// line read when stdin or stderr is redirected.
pub struct StdinGate;

impl StdinGate {
    fn interactive() -> bool {
        Term::stderr().is_term() && std::io::stdin().is_terminal()
    }
}

#[async_trait]
impl ConfirmGate for StdinGate {
    async fn confirm(&self) -> Result<()> {
        if !Self::interactive() {
            eprintln!("{}", PROMPT);
            return read_confirmation(BufReader::new(tokio::io::stdin())).await;
        }
        tokio::task::spawn_blocking(|| {
            dialoguer::Input::<String>::new()
                .with_prompt(PROMPT)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .context("Confirmation prompt task panicked")?
        .context("Failed to read confirmation")?;
        Ok(())
    }
}

/// Wait for one line on `reader`. Fails if the input closes first.
pub async fn read_confirmation<R: AsyncBufRead + Unpin>(mut reader: R) -> Result<()> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .await
        .context("Failed to read confirmation")?;
    if read == 0 {
        bail!("Input closed before confirmation");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_newline_confirms() {
        read_confirmation(&b"\n"[..]).await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_input_is_error() {
        let err = read_confirmation(&b""[..]).await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn test_waits_until_line_arrives() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let confirm = tokio::spawn(read_confirmation(BufReader::new(reader)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!confirm.is_finished());

        writer.write_all(b"\n").await.unwrap();
        confirm.await.unwrap().unwrap();
    }
}
