use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use thiserror::Error;

use std::collections::{HashMap, HashSet};

use pcdice_types::{ConnectionState, OutputPort, ProgramChange};

const CLIENT_NAME: &str = "pcdice";
const CONNECTION_NAME: &str = "pcdice-output";

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI client unavailable: {0}")]
    Init(#[from] midir::InitError),
    #[error("no output named '{0}'")]
    UnknownPort(String),
    #[error("could not open '{port}': {reason}")]
    Connect { port: String, reason: String },
    #[error("send failed: {0}")]
    Send(#[from] midir::SendError),
}

/// Output side of the MIDI host: enumeration and sending.
pub trait MidiOutputs {
    /// Current enumeration of output ports.
    fn list_outputs(&mut self) -> Vec<OutputPort>;

    fn send(&mut self, port_id: &str, msg: &ProgramChange) -> Result<(), MidiError>;

    /// Drop any open connection to `port_id`.
    fn release(&mut self, _port_id: &str) {}
}

/// midir-backed output manager.
///
/// Ports are identified by name. midir consumes the client on connect, so the
/// client is recreated after each connection is opened or closed.
pub struct MidiOutputManager {
    midi_out: Option<MidiOutput>,
    connection: Option<(String, MidiOutputConnection)>,
}

impl MidiOutputManager {
    pub fn new() -> Self {
        let midi_out = match MidiOutput::new(CLIENT_NAME) {
            Ok(out) => Some(out),
            Err(e) => {
                log::warn!(target: "midi", "MIDI output unavailable: {}", e);
                None
            }
        };
        Self {
            midi_out,
            connection: None,
        }
    }

    pub fn connected_port(&self) -> Option<&str> {
        self.connection.as_ref().map(|(id, _)| id.as_str())
    }

    fn client(&mut self) -> Result<&MidiOutput, MidiError> {
        match &mut self.midi_out {
            Some(out) => Ok(out),
            slot @ None => Ok(slot.insert(MidiOutput::new(CLIENT_NAME)?)),
        }
    }

    fn connect(&mut self, port_id: &str) -> Result<(), MidiError> {
        self.disconnect();

        let client = self.client()?;
        let port = named_ports(client)
            .into_iter()
            .find(|(id, _)| id == port_id)
            .map(|(_, port)| port)
            .ok_or_else(|| MidiError::UnknownPort(port_id.to_string()))?;

        let Some(client) = self.midi_out.take() else {
            return Err(MidiError::UnknownPort(port_id.to_string()));
        };
        match client.connect(&port, CONNECTION_NAME) {
            Ok(conn) => {
                log::info!(target: "midi", "opened output '{}'", port_id);
                self.connection = Some((port_id.to_string(), conn));
                self.midi_out = MidiOutput::new(CLIENT_NAME).ok();
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.midi_out = Some(e.into_inner());
                Err(MidiError::Connect {
                    port: port_id.to_string(),
                    reason,
                })
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Some((id, conn)) = self.connection.take() {
            log::info!(target: "midi", "closed output '{}'", id);
            let client = conn.close();
            if self.midi_out.is_none() {
                self.midi_out = Some(client);
            }
        }
    }
}

impl Default for MidiOutputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl MidiOutputs for MidiOutputManager {
    fn list_outputs(&mut self) -> Vec<OutputPort> {
        let Ok(client) = self.client() else {
            return Vec::new();
        };
        let ids = named_ports(client).into_iter().map(|(id, _)| id).collect();
        port_list(ids, self.connected_port())
    }

    fn send(&mut self, port_id: &str, msg: &ProgramChange) -> Result<(), MidiError> {
        if self.connected_port() != Some(port_id) {
            self.connect(port_id)?;
        }
        let Some((_, conn)) = self.connection.as_mut() else {
            return Err(MidiError::UnknownPort(port_id.to_string()));
        };
        if let Err(e) = conn.send(&msg.to_bytes()) {
            log::warn!(target: "midi", "send to '{}' failed: {}", port_id, e);
            self.disconnect();
            return Err(e.into());
        }
        Ok(())
    }

    fn release(&mut self, port_id: &str) {
        if self.connected_port() == Some(port_id) {
            self.disconnect();
        }
    }
}

/// Enumerate ports with unique names. Repeated names get a ` #n` suffix so
/// every id resolves to exactly one port.
fn named_ports(client: &MidiOutput) -> Vec<(String, MidiOutputPort)> {
    let mut names = Vec::new();
    for port in client.ports() {
        if let Ok(name) = client.port_name(&port) {
            names.push((name, port));
        }
    }
    let raw: Vec<String> = names.iter().map(|(n, _)| n.clone()).collect();
    dedupe_names(&raw)
        .into_iter()
        .zip(names)
        .map(|(id, (_, port))| (id, port))
        .collect()
}

/// Build the enumeration from the client's port ids. An open connection whose
/// port is no longer enumerated is reported as disconnected so the tracker
/// drops it.
fn port_list(ids: Vec<String>, open: Option<&str>) -> Vec<OutputPort> {
    let mut ports: Vec<OutputPort> = ids
        .into_iter()
        .map(|id| OutputPort::connected(id.clone(), id))
        .collect();
    if let Some(open) = open {
        if !ports.iter().any(|p| p.id == open) {
            log::debug!(target: "midi", "open output '{}' no longer enumerated", open);
            ports.push(OutputPort {
                id: open.to_string(),
                name: open.to_string(),
                state: ConnectionState::Disconnected,
            });
        }
    }
    ports
}

fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let count = seen.entry(name.as_str()).or_insert(0);
        let mut id = name.clone();
        while taken.contains(&id) {
            *count += 1;
            id = format!("{} #{}", name, *count + 1);
        }
        taken.insert(id.clone());
        out.push(id);
    }
    out
}
