use std::collections::HashMap;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

use crate::circuit::{CheckState, Circuit};
use crate::error::ValidationError;
use crate::renumber::NetRenumberer;

lazy_static! {
    // Letters, one dash, positive integer: R-1, Uac-12
    static ref DESIGNATOR_PATTERN: Regex = Regex::new(r"^[A-Za-z]+-[1-9][0-9]*$").unwrap();
}

pub fn is_valid_designator(designator: &str) -> bool {
    DESIGNATOR_PATTERN.is_match(designator)
}

/// Gatekeeper between editing and netlist export.
pub struct TopologyValidator;

impl TopologyValidator {
    /// Check the circuit and mark it `Checked` on success.
    ///
    /// Drifted net numbering is repaired first. Every violation found is
    /// returned, in check order.
    pub fn compile(circuit: &mut Circuit) -> Result<(), Vec<ValidationError>> {
        if !NetRenumberer::is_canonical(circuit) {
            let mapping = NetRenumberer::refresh(circuit);
            debug!("Net renumbering during compile: {:?}", mapping);
        }

        let mut errors = Vec::new();
        errors.extend(Self::check_connections(circuit));
        errors.extend(Self::check_designators(circuit));
        errors.extend(Self::check_duplicates(circuit));
        if !Self::has_ground(circuit) {
            errors.push(ValidationError::MissingGround);
        }

        if errors.is_empty() {
            circuit.state = CheckState::Checked;
            info!("Compiled '{}': {} nets", circuit.title, circuit.net_ids().len());
            Ok(())
        } else {
            circuit.state = CheckState::Unchecked;
            warn!("Compile of '{}' found {} problem(s)", circuit.title, errors.len());
            Err(errors)
        }
    }

    /// Every pin of every non-ground component must be on a net.
    pub fn check_connections(circuit: &Circuit) -> Vec<ValidationError> {
        circuit
            .components()
            .filter(|c| !c.kind.is_ground())
            .flat_map(|c| {
                c.terminals()
                    .filter(|&t| circuit.terminal_net(t).is_none())
                    .map(|t| ValidationError::OpenConnection(c.designator.clone(), t.pin))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn check_designators(circuit: &Circuit) -> Vec<ValidationError> {
        circuit
            .components()
            .filter(|c| !c.kind.is_ground() && !is_valid_designator(&c.designator))
            .map(|c| ValidationError::MalformedDesignator(c.name.clone()))
            .collect()
    }

    /// One error per designator shared by two or more non-ground components.
    pub fn check_duplicates(circuit: &Circuit) -> Vec<ValidationError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for component in circuit.components().filter(|c| !c.kind.is_ground()) {
            let count = counts.entry(component.designator.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                order.push(component.designator.clone());
            }
        }
        order.into_iter().map(ValidationError::DuplicateDesignator).collect()
    }

    pub fn has_ground(circuit: &Circuit) -> bool {
        circuit.components().any(|c| c.kind.is_ground())
    }
}
