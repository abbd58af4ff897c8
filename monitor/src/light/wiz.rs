use log::info;
use samcamcore::prelude::{ActuationError, AlertAction};
use serde::Deserialize;
use serde_json::json;
use std::net::UdpSocket;
use std::time::Duration;

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// WiZ smart bulb driven over its local UDP JSON protocol.
pub struct WizLight {
    addr: String,
    timeout: Duration,
}

impl WizLight {
    pub fn new(ip: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", ip, port),
            timeout: REPLY_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn send_pilot(&self) -> Result<Vec<u8>, ActuationError> {
        let unreachable =
            |err: std::io::Error| ActuationError::Unreachable(format!("{}: {}", self.addr, err));

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(unreachable)?;
        socket
            .set_read_timeout(Some(self.timeout))
            .map_err(unreachable)?;
        socket
            .send_to(pilot_command().as_bytes(), &self.addr)
            .map_err(unreachable)?;

        let mut buf = [0u8; 1024];
        let (len, _) = socket.recv_from(&mut buf).map_err(unreachable)?;
        Ok(buf[..len].to_vec())
    }
}

impl AlertAction for WizLight {
    fn activate(&mut self) -> Result<(), ActuationError> {
        let reply = self.send_pilot()?;
        parse_reply(&reply)?;
        info!("light {} switched to alert colour", self.addr);
        Ok(())
    }
}

/// Full brightness, red.
fn pilot_command() -> String {
    json!({
        "method": "setPilot",
        "params": { "state": true, "dimming": 100, "r": 100, "g": 0, "b": 0 }
    })
    .to_string()
}

#[derive(Debug, Deserialize)]
struct PilotReply {
    result: Option<PilotResult>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PilotResult {
    success: bool,
}

fn parse_reply(bytes: &[u8]) -> Result<(), ActuationError> {
    let reply: PilotReply = serde_json::from_slice(bytes)
        .map_err(|err| ActuationError::Rejected(format!("unreadable reply: {}", err)))?;

    if let Some(error) = reply.error {
        return Err(ActuationError::Rejected(error.to_string()));
    }
    match reply.result {
        Some(PilotResult { success: true }) => Ok(()),
        _ => Err(ActuationError::Rejected("setPilot not acknowledged".into())),
    }
}
