//! Outbound delivery of reminder messages.

mod command;
mod message;

pub use command::CommandTransport;
pub use message::render_reminder;
#[cfg(test)]
pub use message::REMINDER_SUBJECT;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start mail command: {0}")]
    Spawn(std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mail command exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
    #[error("send timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("{0}")]
    Rejected(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        log::info!("mail to {} subject {:?}\n{}", to, subject, body);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        LogTransport
            .send("a@example.com", REMINDER_SUBJECT, "body")
            .await
            .unwrap();
    }
}
