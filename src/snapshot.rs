//! Serializable circuit state.
//!
//! Stored `nodes` and `net_id` values are restored verbatim without going
//! through the connection merger, so a snapshot may carry gaps in its net
//! numbering. `compile` repairs those.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, ComponentId, ComponentKind, Wire, WireId};
use crate::error::CircuitError;
use crate::nets::NetId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    #[serde(default)]
    pub title: String,
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub wires: Vec<WireRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Kind-qualified name, e.g. `resistor-1`
    pub name: String,
    pub kind: ComponentKind,
    pub designator: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
    /// Stored net of each pin, pin 1 first
    #[serde(default)]
    pub nodes: Vec<Option<NetId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalRecord {
    /// Name of the component the pin belongs to
    pub component: String,
    pub pin: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    pub designator: String,
    pub net_id: Option<NetId>,
    pub sta: TerminalRecord,
    pub end: TerminalRecord,
}

impl Circuit {
    pub fn to_snapshot(&self) -> CircuitSnapshot {
        let components = self
            .components()
            .map(|c| ComponentRecord {
                name: c.name.clone(),
                kind: c.kind,
                designator: c.designator.clone(),
                attributes: c.attributes.clone(),
                nodes: c
                    .terminals()
                    .map(|t| {
                        if c.kind.is_ground() && self.nets.wire_count(t) == 0 {
                            None
                        } else {
                            self.terminal_net(t)
                        }
                    })
                    .collect(),
            })
            .collect();

        let terminal_record = |component: ComponentId, pin: u8| TerminalRecord {
            component: self
                .component(component)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            pin,
        };
        let wires = self
            .wires()
            .map(|w| WireRecord {
                designator: w.designator.clone(),
                net_id: w.net_id,
                sta: terminal_record(w.sta.component, w.sta.pin),
                end: terminal_record(w.end.component, w.end.pin),
            })
            .collect();

        CircuitSnapshot {
            title: self.title.clone(),
            components,
            wires,
        }
    }

    /// Rebuild a circuit from saved state. The result is `Unchecked`.
    pub fn from_snapshot(snapshot: &CircuitSnapshot) -> Result<Circuit, CircuitError> {
        let mut circuit = Circuit::new(snapshot.title.clone());
        let mut by_name: HashMap<&str, ComponentId> = HashMap::new();

        for record in &snapshot.components {
            if by_name.contains_key(record.name.as_str()) {
                return Err(CircuitError::DuplicateName(record.name.clone()));
            }
            let id = circuit.insert_component(
                record.name.clone(),
                record.designator.clone(),
                record.kind,
                record.attributes.clone(),
            );
            by_name.insert(record.name.as_str(), id);

            if record.kind.is_ground() {
                continue;
            }
            for (idx, node) in record.nodes.iter().enumerate() {
                let Some(net_id) = node else { continue };
                let pin = u8::try_from(idx + 1).unwrap_or(u8::MAX);
                let terminal = circuit.require_terminal(id, pin)?;
                circuit.nets.set_net(terminal, *net_id);
            }
        }

        for record in &snapshot.wires {
            let mut ends = Vec::with_capacity(2);
            for end in [&record.sta, &record.end] {
                let id = by_name
                    .get(end.component.as_str())
                    .copied()
                    .ok_or_else(|| CircuitError::UnknownComponent(end.component.clone()))?;
                ends.push(circuit.require_terminal(id, end.pin)?);
            }

            circuit.nets.register_wire(ends[0], ends[1]);
            let id = WireId(circuit.wires.len());
            circuit.wires.push(Some(Wire {
                id,
                designator: record.designator.clone(),
                net_id: record.net_id,
                sta: ends[0],
                end: ends[1],
            }));
        }

        Ok(circuit)
    }

    pub fn from_json_str(json: &str) -> Result<Circuit> {
        let snapshot: CircuitSnapshot = serde_json::from_str(json).context("Invalid circuit snapshot")?;
        Ok(Circuit::from_snapshot(&snapshot)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Circuit> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file '{}'", path.display()))?;
        let circuit = Circuit::from_json_str(&content)
            .with_context(|| format!("Failed to load circuit from '{}'", path.display()))?;
        info!("Loaded circuit '{}' from {}", circuit.title, path.display());
        Ok(circuit)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.to_snapshot())?;
        fs::write(path, content).with_context(|| format!("Failed to write '{}'", path.display()))?;
        info!("Saved circuit '{}' to {}", self.title, path.display());
        Ok(())
    }
}
