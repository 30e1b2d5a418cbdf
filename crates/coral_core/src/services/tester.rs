//! Connection probing against a live Redis server.
//!
//! The probe validates reachability the same way a real client session would
//! start: connect, AUTH when a password is set, then PING and expect a
//! positive reply. No client state survives the probe; the stream is dropped
//! as soon as the reply is read.

use crate::error::CoralError;
use crate::models::TestTarget;

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Probes whether a connection target is reachable.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    /// Attempt to reach the target. Succeeds with no payload.
    async fn test(&self, target: &TestTarget) -> Result<(), CoralError>;
}

/// Real tester: TCP connect plus an AUTH/PING exchange in RESP.
pub struct RedisTester {
    /// Applied to the TCP connect and to each reply read.
    connect_timeout: Duration,
}

impl RedisTester {
    /// Create a tester with the default 10 second timeout.
    pub fn new() -> Self {
        Self { connect_timeout: Duration::from_secs(10) }
    }

    /// Create a tester with a custom timeout.
    pub fn with_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Send one command and check the server's reply line.
    async fn roundtrip(
        &self,
        reader: &mut BufReader<OwnedReadHalf>,
        writer: &mut OwnedWriteHalf,
        parts: &[&str],
    ) -> Result<(), CoralError> {
        let command = parts[0];
        writer
            .write_all(&encode_command(parts))
            .await
            .map_err(|e| CoralError::connection_with_source(format!("Failed to send {command}"), e))?;

        let line = timeout(self.connect_timeout, read_reply(reader))
            .await
            .map_err(|_| CoralError::connection(format!("Timed out waiting for {command} reply")))??;

        check_reply(command, &line)
    }
}

impl Default for RedisTester {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionTester for RedisTester {
    async fn test(&self, target: &TestTarget) -> Result<(), CoralError> {
        let addr = format!("{}:{}", target.host, target.port);
        tracing::debug!(addr = %addr, "Testing Redis connection");

        let stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| CoralError::connection(format!("Connection to {addr} timed out")))?
            .map_err(|e| CoralError::connection_with_source(format!("Failed to reach {addr}"), e))?;

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        if !target.password.is_empty() {
            self.roundtrip(&mut reader, &mut write_half, &["AUTH", &target.password]).await?;
        }
        self.roundtrip(&mut reader, &mut write_half, &["PING"]).await?;

        tracing::debug!(addr = %addr, "Redis server answered PING");
        Ok(())
    }
}

/// Encode a command as a RESP array of bulk strings.
fn encode_command(parts: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(format!("*{}\r\n", parts.len()).as_bytes());
    for part in parts {
        buf.extend_from_slice(format!("${}\r\n", part.len()).as_bytes());
        buf.extend_from_slice(part.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Read one CRLF-terminated reply line. AUTH and PING replies are single-line.
async fn read_reply(reader: &mut BufReader<OwnedReadHalf>) -> Result<String, CoralError> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .await
        .map_err(|e| CoralError::connection_with_source("Failed to read reply", e))?;
    if n == 0 {
        return Err(CoralError::connection("Server closed the connection"));
    }
    Ok(line.trim_end().to_string())
}

/// Interpret a RESP reply line: `+` is success, `-` carries the server error.
fn check_reply(command: &str, line: &str) -> Result<(), CoralError> {
    match line.as_bytes().first() {
        Some(b'+') => Ok(()),
        Some(b'-') => {
            Err(CoralError::connection(format!("{command} rejected: {}", line[1..].trim())))
        }
        _ => Err(CoralError::connection(format!("Unexpected reply to {command}: {line}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_encode_command_resp_array() {
        let bytes = encode_command(&["AUTH", "secret"]);
        assert_eq!(bytes, b"*2\r\n$4\r\nAUTH\r\n$6\r\nsecret\r\n");
    }

    #[test]
    fn test_check_reply_accepts_simple_strings() {
        assert!(check_reply("PING", "+PONG").is_ok());
        assert!(check_reply("AUTH", "+OK").is_ok());
    }

    #[test]
    fn test_check_reply_surfaces_server_errors() {
        let err = check_reply("AUTH", "-ERR invalid password").unwrap_err();
        assert!(err.to_string().contains("AUTH rejected: ERR invalid password"));

        assert!(check_reply("PING", "$4").is_err());
    }

    async fn spawn_server(replies: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(replies).await.unwrap();
            // Hold the socket open until the client is done reading.
            let mut buf = [0u8; 256];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
        });
        port
    }

    #[tokio::test]
    async fn test_ping_against_fake_server() {
        let port = spawn_server(b"+PONG\r\n").await;
        let target =
            TestTarget { host: "127.0.0.1".to_string(), port, password: String::new() };

        let tester = RedisTester::with_timeout(Duration::from_secs(2));
        tester.test(&target).await.unwrap();
    }

    #[tokio::test]
    async fn test_auth_then_ping_against_fake_server() {
        let port = spawn_server(b"+OK\r\n+PONG\r\n").await;
        let target =
            TestTarget { host: "127.0.0.1".to_string(), port, password: "secret".to_string() };

        let tester = RedisTester::with_timeout(Duration::from_secs(2));
        tester.test(&target).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_auth_fails() {
        let port = spawn_server(b"-ERR invalid password\r\n").await;
        let target =
            TestTarget { host: "127.0.0.1".to_string(), port, password: "wrong".to_string() };

        let tester = RedisTester::with_timeout(Duration::from_secs(2));
        let err = tester.test(&target).await.unwrap_err();
        assert_eq!(err.category(), "Connection");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails() {
        // Bind and drop a listener so the port is very likely closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let target =
            TestTarget { host: "127.0.0.1".to_string(), port, password: String::new() };

        let tester = RedisTester::with_timeout(Duration::from_secs(2));
        assert!(tester.test(&target).await.is_err());
    }
}
