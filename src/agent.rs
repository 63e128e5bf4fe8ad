//! TCP transport for a remote decision process
//!
//! Newline-delimited JSON: a hello/model handshake, then one
//! `{"obs": [...]}` request and one `{"action": [...]}` reply per tick.
//! The transport holds no simulation logic; every failure surfaces as a
//! typed error for the driver to handle instead of crashing the loop.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::ACTION_DIM;
use crate::sim::Action;

/// Hard cap on a single incoming line
const MAX_LINE_BYTES: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("transport failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("agent disconnected")]
    Disconnected,
    #[error("malformed agent payload: {0}")]
    Protocol(String),
}

#[derive(Serialize)]
struct Hello<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct HelloReply {
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize)]
struct ObsRequest<'a> {
    obs: &'a [f32],
}

#[derive(Deserialize)]
struct ActionReply {
    action: Vec<f32>,
}

/// Blocking line-protocol client for one remote agent
pub struct AgentClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl AgentClient {
    pub fn connect(addr: &str) -> Result<Self, AgentError> {
        let stream = TcpStream::connect(addr)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }

    /// Exchange hello messages; returns the advertised model name
    pub fn handshake(&mut self) -> Result<String, AgentError> {
        self.send(&Hello { kind: "hello" })?;
        let line = self.recv_line()?;
        let reply: HelloReply =
            serde_json::from_str(&line).map_err(|e| AgentError::Protocol(e.to_string()))?;
        Ok(reply.model.unwrap_or_else(|| "unknown".to_string()))
    }

    /// Send one observation, receive one decoded action
    pub fn infer(&mut self, obs: &[f32], choosing: bool) -> Result<Action, AgentError> {
        self.send(&ObsRequest { obs })?;
        let line = self.recv_line()?;
        let reply: ActionReply =
            serde_json::from_str(&line).map_err(|e| AgentError::Protocol(e.to_string()))?;
        if reply.action.len() != ACTION_DIM {
            return Err(AgentError::Protocol(format!(
                "expected {ACTION_DIM} action channels, got {}",
                reply.action.len()
            )));
        }
        Action::from_channels(&reply.action, choosing)
            .map_err(|e| AgentError::Protocol(e.to_string()))
    }

    fn send<T: Serialize>(&mut self, msg: &T) -> Result<(), AgentError> {
        let mut payload =
            serde_json::to_string(msg).map_err(|e| AgentError::Protocol(e.to_string()))?;
        payload.push('\n');
        self.writer.write_all(payload.as_bytes())?;
        Ok(())
    }

    fn recv_line(&mut self) -> Result<String, AgentError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(AgentError::Disconnected);
        }
        if line.len() > MAX_LINE_BYTES {
            return Err(AgentError::Protocol("incoming message too large".into()));
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Minimal in-process agent speaking the line protocol
    fn spawn_stub_agent(replies: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            for reply in replies {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    return;
                }
                writer.write_all(reply.as_bytes()).unwrap();
                writer.write_all(b"\n").unwrap();
            }
        });
        addr
    }

    #[test]
    fn handshake_reads_the_model_name() {
        let addr = spawn_stub_agent(vec![r#"{"model":"ppo-v3"}"#.to_string()]);
        let mut client = AgentClient::connect(&addr).unwrap();
        assert_eq!(client.handshake().unwrap(), "ppo-v3");
    }

    #[test]
    fn infer_round_trips_an_action() {
        let addr = spawn_stub_agent(vec![
            r#"{"model":"stub"}"#.to_string(),
            r#"{"action":[1.0,0.0,0.5,-0.5,1.0,0.0,0.0,-1.0]}"#.to_string(),
        ]);
        let mut client = AgentClient::connect(&addr).unwrap();
        client.handshake().unwrap();
        let action = client.infer(&[0.0; 4], false).unwrap();
        assert_eq!(action.move_x, 1.0);
        assert!(action.shoot);
        assert!(!action.sprint);
        assert_eq!(action.upgrade_choice, -1);
    }

    #[test]
    fn malformed_payload_is_a_protocol_error() {
        let addr = spawn_stub_agent(vec![r#"{"not":"json-we-want"#.to_string()]);
        let mut client = AgentClient::connect(&addr).unwrap();
        assert!(matches!(
            client.handshake(),
            Err(AgentError::Protocol(_))
        ));
    }

    #[test]
    fn short_action_array_is_a_protocol_error() {
        let addr = spawn_stub_agent(vec![
            r#"{"model":"stub"}"#.to_string(),
            r#"{"action":[1.0,2.0]}"#.to_string(),
        ]);
        let mut client = AgentClient::connect(&addr).unwrap();
        client.handshake().unwrap();
        assert!(matches!(
            client.infer(&[0.0; 4], false),
            Err(AgentError::Protocol(_))
        ));
    }

    #[test]
    fn disconnect_is_reported_distinctly() {
        let addr = spawn_stub_agent(vec![]);
        let mut client = AgentClient::connect(&addr).unwrap();
        assert!(matches!(
            client.handshake(),
            Err(AgentError::Disconnected) | Err(AgentError::Io(_))
        ));
    }
}
