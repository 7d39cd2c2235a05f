use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use log::info;
use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, ComponentKind};
use crate::cli::OutputFormat;
use crate::error::NotChecked;
use crate::nets::{NetId, GROUND_NET};

/// One component as handed to a simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetlistRecord {
    pub designator: String,
    pub kind: ComponentKind,
    pub attributes: BTreeMap<String, f64>,
    /// Net of each pin, pin 1 first
    pub nodes: Vec<NetId>,
}

impl NetlistRecord {
    pub fn node(&self, pin: u8) -> Option<NetId> {
        let idx = usize::from(pin).checked_sub(1)?;
        self.nodes.get(idx).copied()
    }
}

/// Projects a checked circuit into netlist records.
pub struct NetlistExporter;

impl NetlistExporter {
    /// Records for every non-ground component, in insertion order.
    pub fn export(circuit: &Circuit) -> Result<Vec<NetlistRecord>, NotChecked> {
        if !circuit.is_checked() {
            return Err(NotChecked);
        }

        let records = circuit
            .components()
            .filter(|c| !c.kind.is_ground())
            .map(|c| NetlistRecord {
                designator: c.designator.clone(),
                kind: c.kind,
                attributes: c.attributes.clone(),
                // a checked circuit has every pin on a net
                nodes: c
                    .terminals()
                    .map(|t| circuit.terminal_net(t).unwrap_or(GROUND_NET))
                    .collect(),
            })
            .collect();
        Ok(records)
    }

    /// Export records to a file in the given format
    pub fn export_to_file(records: &[NetlistRecord], filename: &str, format: &OutputFormat) -> Result<()> {
        let file = File::create(filename)
            .with_context(|| format!("Failed to create '{}'", filename))?;

        match format {
            OutputFormat::Csv => Self::write_csv(records, file)?,
            OutputFormat::Json => Self::write_json(records, file)?,
        }
        info!("Netlist exported to {}", filename);
        Ok(())
    }

    /// CSV rows: designator, kind, node1..nodeN, then `key=value` attributes
    pub fn write_csv<W: Write>(records: &[NetlistRecord], writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

        for record in records {
            let mut row = vec![record.designator.clone(), record.kind.to_string()];
            row.extend(record.nodes.iter().map(|n| n.to_string()));
            row.extend(record.attributes.iter().map(|(k, v)| format!("{}={}", k, v)));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(records: &[NetlistRecord], writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, records)?;
        Ok(())
    }
}
