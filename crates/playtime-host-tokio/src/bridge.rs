//! Host bridge: NDJSON over a byte stream (stdin/stdout in production)

use playtime_api::{Event, HostMessage, ProtocolError};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Reads [`HostMessage`]s, one per line
pub struct HostReader<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> HostReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Next well-formed message, or `None` at end of stream.
    ///
    /// Blank, malformed and non-UTF-8 lines are logged and skipped.
    /// Cancel-safe, so it can sit in a `select!` branch.
    pub async fn next_message(&mut self) -> BridgeResult<Option<HostMessage>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                // The offending line is already consumed, the stream stays usable
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    warn!(error = %e, "Skipping non-UTF-8 host message");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match HostMessage::from_line(&line) {
                Ok(message) => return Ok(Some(message)),
                Err(ProtocolError::Empty) => continue,
                Err(e) => warn!(error = %e, line = %line, "Skipping malformed host message"),
            }
        }
        debug!("Host stream closed");
        Ok(None)
    }
}

/// Writes [`Event`]s, one per line, flushing after each
pub struct EventWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> EventWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn send(&mut self, event: &Event) -> BridgeResult<()> {
        let mut json = event.to_line()?;
        json.push('\n');
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playtime_api::EventPayload;
    use playtime_util::UserId;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_reads_messages_and_skips_garbage() {
        let user = UserId::new();
        let input = format!(
            "{{\"type\":\"became_active\",\"user\":\"{user}\",\"name\":\"Steve\"}}\n\
             \n\
             not json\n\
             {{\"type\":\"shutdown\"}}\n"
        );
        let mut reader = HostReader::new(BufReader::new(input.as_bytes()));

        assert_eq!(
            reader.next_message().await.unwrap(),
            Some(HostMessage::BecameActive {
                user,
                name: "Steve".into()
            })
        );
        assert_eq!(reader.next_message().await.unwrap(), Some(HostMessage::Shutdown));
        assert_eq!(reader.next_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_skips_non_utf8_line_and_keeps_reading() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"type\":\"shutdown\"}\n");
        let mut reader = HostReader::new(BufReader::new(&input[..]));

        assert_eq!(reader.next_message().await.unwrap(), Some(HostMessage::Shutdown));
        assert_eq!(reader.next_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writes_one_event_per_line() {
        let mut writer = EventWriter::new(Vec::new());
        writer
            .send(&Event::new(EventPayload::DailyReset {
                date: "2025-06-15".into(),
                players_reset: 3,
            }))
            .await
            .unwrap();
        writer
            .send(&Event::new(EventPayload::DailyReset {
                date: "2025-06-16".into(),
                players_reset: 0,
            }))
            .await
            .unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"type\":\"daily_reset\""));
        assert!(lines[1].contains("2025-06-16"));
    }
}
