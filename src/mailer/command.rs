use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Transport, TransportError};

/// Hands each message to a shell command, e.g. a `sendmail` wrapper.
///
/// The command sees `MAIL_TO`, `MAIL_FROM` and `MAIL_SUBJECT` in its
/// environment and reads the body from stdin. A non-zero exit fails the
/// send with whatever the command wrote to stderr.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    command: String,
    from: String,
}

impl CommandTransport {
    pub fn new(command: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Transport for CommandTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        log::debug!("Executing mail command for {}: {}", to, self.command);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("MAIL_TO", to)
            .env("MAIL_FROM", &self.from)
            .env("MAIL_SUBJECT", subject)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TransportError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(body.as_bytes()).await?;
            // closing stdin lets the command see EOF
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            return Ok(());
        }

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::debug!("Mail command exited with code {}", code);
        Err(TransportError::Failed { code, stderr })
    }
}
