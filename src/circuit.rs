use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, ConflictError, NetIdError, NotChecked, ValidationError};
use crate::merger::ConnectionMerger;
use crate::netlist::{NetlistExporter, NetlistRecord};
use crate::nets::{NetId, NetTable, GROUND_NET};
use crate::validator::{is_valid_designator, TopologyValidator};

/// Handle of a component inside a [`Circuit`]. Never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component #{}", self.0)
    }
}

/// Handle of a wire inside a [`Circuit`]. Never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire #{}", self.0)
    }
}

/// One numbered pin of one component. Pins start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Terminal {
    pub component: ComponentId,
    pub pin: u8,
}

impl Terminal {
    pub fn new(component: ComponentId, pin: u8) -> Self {
        Terminal { component, pin }
    }
}

/// Types of schematic components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    VoltageDc,
    VoltageAc,
    CurrentDc,
    CurrentAc,
    Gap,
    Vcvs,
    Vccs,
    Ccvs,
    Cccs,
    Ground,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 14] = [
        ComponentKind::Resistor,
        ComponentKind::Capacitor,
        ComponentKind::Inductor,
        ComponentKind::Diode,
        ComponentKind::VoltageDc,
        ComponentKind::VoltageAc,
        ComponentKind::CurrentDc,
        ComponentKind::CurrentAc,
        ComponentKind::Gap,
        ComponentKind::Vcvs,
        ComponentKind::Vccs,
        ComponentKind::Ccvs,
        ComponentKind::Cccs,
        ComponentKind::Ground,
    ];

    /// Name used in component ids, scripts and snapshots, e.g. `voltage_dc`
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "resistor",
            ComponentKind::Capacitor => "capacitor",
            ComponentKind::Inductor => "inductor",
            ComponentKind::Diode => "diode",
            ComponentKind::VoltageDc => "voltage_dc",
            ComponentKind::VoltageAc => "voltage_ac",
            ComponentKind::CurrentDc => "current_dc",
            ComponentKind::CurrentAc => "current_ac",
            ComponentKind::Gap => "gap",
            ComponentKind::Vcvs => "vcvs",
            ComponentKind::Vccs => "vccs",
            ComponentKind::Ccvs => "ccvs",
            ComponentKind::Cccs => "cccs",
            ComponentKind::Ground => "ground",
        }
    }

    /// Letters in front of the `-N` of a generated designator
    pub fn designator_prefix(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "R",
            ComponentKind::Capacitor => "C",
            ComponentKind::Inductor => "L",
            ComponentKind::Diode => "D",
            ComponentKind::VoltageDc => "Udc",
            ComponentKind::VoltageAc => "Uac",
            ComponentKind::CurrentDc => "Idc",
            ComponentKind::CurrentAc => "Iac",
            ComponentKind::Gap => "Gap",
            ComponentKind::Vcvs => "VCVS",
            ComponentKind::Vccs => "VCCS",
            ComponentKind::Ccvs => "CCVS",
            ComponentKind::Cccs => "CCCS",
            ComponentKind::Ground => "G",
        }
    }

    /// Get the number of terminals for this kind
    pub fn pin_count(&self) -> u8 {
        match self {
            ComponentKind::Ground => 1,
            ComponentKind::Vcvs | ComponentKind::Vccs | ComponentKind::Ccvs | ComponentKind::Cccs => 4,
            _ => 2,
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, ComponentKind::Ground)
    }

    /// Returns true if this component is an independent source
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            ComponentKind::VoltageDc | ComponentKind::VoltageAc | ComponentKind::CurrentDc | ComponentKind::CurrentAc
        )
    }

    pub fn is_controlled_source(&self) -> bool {
        matches!(
            self,
            ComponentKind::Vcvs | ComponentKind::Vccs | ComponentKind::Ccvs | ComponentKind::Cccs
        )
    }

    /// Electrical attributes a new component starts with
    pub fn default_attributes(&self) -> BTreeMap<String, f64> {
        let values: &[(&str, f64)] = match self {
            ComponentKind::Resistor => &[("value", 10.0)],
            ComponentKind::Capacitor => &[("value", 1e-6), ("Uc", 0.0)],
            ComponentKind::Inductor => &[("value", 1e-6), ("Il", 0.0)],
            ComponentKind::VoltageDc => &[("value", 10.0)],
            ComponentKind::VoltageAc => &[("amp", 100.0), ("freq", 50.0), ("phase", 0.0)],
            ComponentKind::CurrentDc => &[("value", 1.0)],
            ComponentKind::CurrentAc => &[("amp", 1.0), ("freq", 50.0), ("phase", 0.0)],
            ComponentKind::Vcvs | ComponentKind::Vccs | ComponentKind::Ccvs | ComponentKind::Cccs => {
                &[("gain", 1.0)]
            }
            ComponentKind::Diode | ComponentKind::Gap | ComponentKind::Ground => &[],
        };

        let mut attributes: BTreeMap<String, f64> =
            values.iter().map(|(key, value)| (key.to_string(), *value)).collect();
        if !self.is_ground() {
            attributes.insert("vol_dir".to_string(), 1.0);
            attributes.insert("cur_dir".to_string(), 1.0);
        }
        attributes
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ComponentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| CircuitError::UnknownKind(s.to_string()))
    }
}

/// Schematic component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    /// Kind-qualified internal name, e.g. `resistor-3`
    pub name: String,
    pub designator: String,
    pub kind: ComponentKind,
    pub attributes: BTreeMap<String, f64>,
}

impl Component {
    pub fn has_pin(&self, pin: u8) -> bool {
        pin >= 1 && pin <= self.kind.pin_count()
    }

    pub fn terminal(&self, pin: u8) -> Terminal {
        Terminal::new(self.id, pin)
    }

    pub fn terminals(&self) -> impl Iterator<Item = Terminal> + '_ {
        (1..=self.kind.pin_count()).map(move |pin| self.terminal(pin))
    }
}

/// Connector between two terminals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: WireId,
    pub designator: String,
    pub net_id: Option<NetId>,
    pub sta: Terminal,
    pub end: Terminal,
}

/// Whether the circuit passed `compile` since its last change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
}

/// Counts shown by the command line front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitSummary {
    pub title: String,
    pub components: usize,
    pub grounds: usize,
    pub wires: usize,
    pub nets: usize,
    pub state: CheckState,
}

impl fmt::Display for CircuitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit: {}", self.title)?;
        writeln!(f, "Components: {} ({} ground)", self.components, self.grounds)?;
        writeln!(f, "Wires: {}", self.wires)?;
        writeln!(f, "Nets: {}", self.nets)?;
        write!(f, "State: {:?}", self.state)
    }
}

/// Schematic topology: components, wires and their nets
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub title: String,
    pub(crate) components: Vec<Option<Component>>,
    pub(crate) wires: Vec<Option<Wire>>,
    pub(crate) nets: NetTable,
    pub(crate) state: CheckState,
}

impl Circuit {
    pub fn new(title: String) -> Self {
        Circuit {
            title,
            ..Default::default()
        }
    }

    /// Add a component and return its handle. A missing designator is generated.
    pub fn add_component(&mut self, kind: ComponentKind, designator: Option<&str>) -> ComponentId {
        let name = self.next_component_name(kind);
        let designator = match designator {
            Some(designator) => designator.to_string(),
            None => self.next_designator(kind),
        };
        self.insert_component(name, designator, kind, kind.default_attributes())
    }

    pub(crate) fn insert_component(
        &mut self,
        name: String,
        designator: String,
        kind: ComponentKind,
        attributes: BTreeMap<String, f64>,
    ) -> ComponentId {
        let id = ComponentId(self.components.len());
        debug!("Adding {} as {} ({})", kind, designator, name);
        self.components.push(Some(Component {
            id,
            name,
            designator,
            kind,
            attributes,
        }));
        self.mark_unchecked();
        id
    }

    /// Remove a component. Refused while any of its terminals is wired.
    pub fn delete_component(&mut self, id: ComponentId) -> Result<(), CircuitError> {
        let component = self.require_component(id)?;
        if component.terminals().any(|t| self.nets.wire_count(t) > 0) {
            return Err(CircuitError::HasConnections(component.designator.clone()));
        }
        debug!("Deleting {}", component.designator);
        self.components[id.0] = None;
        self.mark_unchecked();
        Ok(())
    }

    /// Draw a wire between two terminals.
    pub fn add_connector(
        &mut self,
        sta_component: ComponentId,
        sta_pin: u8,
        end_component: ComponentId,
        end_pin: u8,
    ) -> Result<WireId, CircuitError> {
        let sta = self.require_terminal(sta_component, sta_pin)?;
        let end = self.require_terminal(end_component, end_pin)?;
        if sta == end {
            return Err(CircuitError::SelfLoop(self.label(sta_component), sta_pin));
        }

        let net_id = match self.propose(sta, end) {
            Ok(net_id) => net_id,
            Err(e) => {
                warn!(
                    "Rejected wire {}:{} -> {}:{}: {}",
                    self.label(sta_component),
                    sta_pin,
                    self.label(end_component),
                    end_pin,
                    e
                );
                return Err(e.into());
            }
        };

        for terminal in [sta, end] {
            if !self.is_ground_terminal(terminal) {
                self.nets.set_net(terminal, net_id);
            }
        }
        self.nets.register_wire(sta, end);

        let id = WireId(self.wires.len());
        let designator = self.next_wire_designator();
        debug!("Adding {} on net {}", designator, net_id);
        self.wires.push(Some(Wire {
            id,
            designator,
            net_id: Some(net_id),
            sta,
            end,
        }));
        self.mark_unchecked();
        Ok(id)
    }

    /// Remove a wire. An endpoint losing its last wire becomes unconnected.
    pub fn delete_connector(&mut self, id: WireId) -> Result<(), CircuitError> {
        let wire = self
            .wires
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| CircuitError::UnknownWire(id.to_string()))?;

        for terminal in [wire.sta, wire.end] {
            if self.nets.unregister_wire(terminal) == 0 {
                self.nets.clear_net(terminal);
            }
        }
        debug!("Deleted {}", wire.designator);
        self.mark_unchecked();
        Ok(())
    }

    /// Net id a new wire between `sta` and `end` would get. Never mutates.
    pub fn propose(&self, sta: Terminal, end: Terminal) -> Result<NetId, ConflictError> {
        ConnectionMerger::new(self).propose(sta, end)
    }

    /// Rename net `old` to the unused id `new`.
    pub fn change_net_id(&mut self, old: NetId, new: NetId) -> Result<(), NetIdError> {
        if !self.nets.contains_net(old) {
            return Err(NetIdError::NotFound(old));
        }
        if new == GROUND_NET {
            return Err(NetIdError::Reserved);
        }
        if self.nets.contains_net(new) {
            return Err(NetIdError::AlreadyExists(new));
        }

        self.nets.rename(old, new);
        for wire in self.wires.iter_mut().flatten() {
            if wire.net_id == Some(old) {
                wire.net_id = Some(new);
            }
        }
        debug!("Renamed net {} to {}", old, new);
        self.mark_unchecked();
        Ok(())
    }

    pub fn compile(&mut self) -> Result<(), Vec<ValidationError>> {
        TopologyValidator::compile(self)
    }

    pub fn get_netlist(&self) -> Result<Vec<NetlistRecord>, NotChecked> {
        NetlistExporter::export(self)
    }

    pub fn set_designator(&mut self, id: ComponentId, designator: &str) -> Result<(), CircuitError> {
        self.require_component_mut(id)?.designator = designator.to_string();
        self.mark_unchecked();
        Ok(())
    }

    pub fn set_attribute(&mut self, id: ComponentId, key: &str, value: f64) -> Result<(), CircuitError> {
        self.require_component_mut(id)?
            .attributes
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Give a fresh designator to every component whose designator is
    /// malformed or already taken by an earlier component.
    pub fn assign_designators(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut stale = Vec::new();
        for component in self.components() {
            if !is_valid_designator(&component.designator) || !seen.insert(component.designator.clone()) {
                stale.push((component.id, component.kind));
            }
        }

        for &(id, kind) in &stale {
            let designator = self.next_designator(kind);
            if let Some(component) = self.components[id.0].as_mut() {
                debug!("Re-designating {} as {}", component.designator, designator);
                component.designator = designator;
            }
        }
        if !stale.is_empty() {
            self.mark_unchecked();
        }
        stale.len()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0).and_then(Option::as_ref)
    }

    /// Live components in insertion order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().flatten()
    }

    pub fn component_by_designator(&self, designator: &str) -> Option<&Component> {
        self.components().find(|c| c.designator == designator)
    }

    /// Resolve a designator, or failing that a kind-qualified name.
    pub fn resolve(&self, reference: &str) -> Option<ComponentId> {
        self.component_by_designator(reference)
            .or_else(|| self.components().find(|c| c.name == reference))
            .map(|c| c.id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.0).and_then(Option::as_ref)
    }

    /// Live wires in insertion order
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter().flatten()
    }

    pub fn wire_by_designator(&self, designator: &str) -> Option<&Wire> {
        self.wires().find(|w| w.designator == designator)
    }

    /// Net of any terminal. Ground component terminals are always net 0.
    pub fn terminal_net(&self, terminal: Terminal) -> Option<NetId> {
        if self.is_ground_terminal(terminal) {
            Some(GROUND_NET)
        } else {
            self.nets.get_net(terminal)
        }
    }

    pub fn net_table(&self) -> &NetTable {
        &self.nets
    }

    /// In-use numbered net ids, ascending
    pub fn net_ids(&self) -> Vec<NetId> {
        self.nets.net_ids()
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn is_checked(&self) -> bool {
        self.state == CheckState::Checked
    }

    pub fn summary(&self) -> CircuitSummary {
        CircuitSummary {
            title: self.title.clone(),
            components: self.components().count(),
            grounds: self.components().filter(|c| c.kind.is_ground()).count(),
            wires: self.wires().count(),
            nets: self.nets.net_ids().len(),
            state: self.state,
        }
    }

    pub(crate) fn is_ground_terminal(&self, terminal: Terminal) -> bool {
        self.component(terminal.component)
            .map_or(false, |c| c.kind.is_ground())
    }

    pub(crate) fn mark_unchecked(&mut self) {
        self.state = CheckState::Unchecked;
    }

    pub(crate) fn require_component(&self, id: ComponentId) -> Result<&Component, CircuitError> {
        self.component(id)
            .ok_or_else(|| CircuitError::UnknownComponent(id.to_string()))
    }

    fn require_component_mut(&mut self, id: ComponentId) -> Result<&mut Component, CircuitError> {
        self.components
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| CircuitError::UnknownComponent(id.to_string()))
    }

    pub(crate) fn require_terminal(&self, id: ComponentId, pin: u8) -> Result<Terminal, CircuitError> {
        let component = self.require_component(id)?;
        if !component.has_pin(pin) {
            return Err(CircuitError::InvalidPin {
                component: component.designator.clone(),
                pin,
            });
        }
        Ok(component.terminal(pin))
    }

    fn label(&self, id: ComponentId) -> String {
        self.component(id)
            .map(|c| c.designator.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn next_component_name(&self, kind: ComponentKind) -> String {
        let taken: HashSet<&str> = self.components().map(|c| c.name.as_str()).collect();
        lowest_free(kind.name(), &taken)
    }

    /// Designators are unique across kinds, so every component counts as taken.
    fn next_designator(&self, kind: ComponentKind) -> String {
        let taken: HashSet<&str> = self.components().map(|c| c.designator.as_str()).collect();
        lowest_free(kind.designator_prefix(), &taken)
    }

    fn next_wire_designator(&self) -> String {
        let taken: HashSet<&str> = self.wires().map(|w| w.designator.as_str()).collect();
        lowest_free("wire", &taken)
    }
}

/// `prefix-N` with the smallest N >= 1 not in `taken`
fn lowest_free(prefix: &str, taken: &HashSet<&str>) -> String {
    (1..)
        .map(|i| format!("{}-{}", prefix, i))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_properties() {
        assert_eq!(ComponentKind::Ground.pin_count(), 1);
        assert_eq!(ComponentKind::Resistor.pin_count(), 2);
        assert_eq!(ComponentKind::Vccs.pin_count(), 4);
        assert!(ComponentKind::VoltageAc.is_source());
        assert!(ComponentKind::Cccs.is_controlled_source());
        assert_eq!("voltage_dc".parse::<ComponentKind>().unwrap(), ComponentKind::VoltageDc);
        assert_eq!("Resistor".parse::<ComponentKind>().unwrap(), ComponentKind::Resistor);
        assert!(matches!(
            "transistor".parse::<ComponentKind>(),
            Err(CircuitError::UnknownKind(_))
        ));
        assert!(ComponentKind::Ground.default_attributes().is_empty());
        assert_eq!(ComponentKind::Capacitor.default_attributes()["value"], 1e-6);
    }

    #[test]
    fn test_generated_names_and_designators() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, None);
        let r2 = circuit.add_component(ComponentKind::Resistor, None);
        let g1 = circuit.add_component(ComponentKind::Ground, None);

        assert_eq!(circuit.component(r1).unwrap().designator, "R-1");
        assert_eq!(circuit.component(r2).unwrap().designator, "R-2");
        assert_eq!(circuit.component(r2).unwrap().name, "resistor-2");
        assert_eq!(circuit.component(g1).unwrap().designator, "G-1");

        circuit.delete_component(r1).unwrap();
        let r3 = circuit.add_component(ComponentKind::Resistor, None);
        assert_eq!(circuit.component(r3).unwrap().designator, "R-1");
        assert_eq!(circuit.component(r3).unwrap().name, "resistor-1");
        assert_ne!(r3, r1);
        assert_eq!(circuit.resolve("resistor-2"), Some(r2));
        assert_eq!(circuit.resolve("R-1"), Some(r3));
    }

    #[test]
    fn test_generated_designator_skips_other_kinds() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        circuit.add_component(ComponentKind::Resistor, Some("C-1"));
        let c = circuit.add_component(ComponentKind::Capacitor, None);
        assert_eq!(circuit.component(c).unwrap().designator, "C-2");

        assert!(crate::validator::TopologyValidator::check_duplicates(&circuit).is_empty());
    }

    #[test]
    fn test_add_connector_checks_terminals() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, None);
        let g1 = circuit.add_component(ComponentKind::Ground, None);

        assert!(matches!(
            circuit.add_connector(r1, 3, g1, 1),
            Err(CircuitError::InvalidPin { pin: 3, .. })
        ));
        assert!(matches!(
            circuit.add_connector(r1, 1, g1, 2),
            Err(CircuitError::InvalidPin { pin: 2, .. })
        ));
        assert!(matches!(
            circuit.add_connector(r1, 1, ComponentId(42), 1),
            Err(CircuitError::UnknownComponent(_))
        ));
        assert!(matches!(
            circuit.add_connector(r1, 1, r1, 1),
            Err(CircuitError::SelfLoop(_, 1))
        ));
        assert_eq!(circuit.wires().count(), 0);
    }

    #[test]
    fn test_wire_designators_and_counts() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, None);
        let r2 = circuit.add_component(ComponentKind::Resistor, None);

        let w1 = circuit.add_connector(r1, 2, r2, 1).unwrap();
        let w2 = circuit.add_connector(r1, 1, r2, 2).unwrap();
        assert_eq!(circuit.wire(w1).unwrap().designator, "wire-1");
        assert_eq!(circuit.wire(w2).unwrap().designator, "wire-2");
        assert_eq!(circuit.wire(w2).unwrap().net_id, Some(2));
        assert_eq!(circuit.net_table().wire_count(Terminal::new(r1, 2)), 1);

        circuit.delete_connector(w1).unwrap();
        assert!(circuit.wire(w1).is_none());
        assert!(matches!(
            circuit.delete_connector(w1),
            Err(CircuitError::UnknownWire(_))
        ));
        assert_eq!(circuit.terminal_net(Terminal::new(r1, 2)), None);
    }

    #[test]
    fn test_delete_component_with_connections() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, None);
        let g1 = circuit.add_component(ComponentKind::Ground, None);
        let wire = circuit.add_connector(r1, 1, g1, 1).unwrap();

        assert_eq!(
            circuit.delete_component(g1),
            Err(CircuitError::HasConnections("G-1".to_string()))
        );
        circuit.delete_connector(wire).unwrap();
        circuit.delete_component(g1).unwrap();
        assert!(circuit.component(g1).is_none());
        assert!(circuit.delete_component(g1).is_err());
    }

    #[test]
    fn test_change_net_id() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, None);
        let r2 = circuit.add_component(ComponentKind::Resistor, None);
        let w1 = circuit.add_connector(r1, 2, r2, 1).unwrap();
        circuit.add_connector(r1, 1, r2, 2).unwrap();

        assert_eq!(circuit.change_net_id(7, 9), Err(NetIdError::NotFound(7)));
        assert_eq!(circuit.change_net_id(1, 0), Err(NetIdError::Reserved));
        assert_eq!(circuit.change_net_id(1, 2), Err(NetIdError::AlreadyExists(2)));
        assert_eq!(circuit.net_ids(), vec![1, 2]);

        circuit.change_net_id(1, 5).unwrap();
        assert_eq!(circuit.net_ids(), vec![2, 5]);
        assert_eq!(circuit.terminal_net(Terminal::new(r2, 1)), Some(5));
        assert_eq!(circuit.wire(w1).unwrap().net_id, Some(5));
    }

    #[test]
    fn test_assign_designators() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let a = circuit.add_component(ComponentKind::Resistor, Some("R-1"));
        let b = circuit.add_component(ComponentKind::Resistor, Some("R-1"));
        let c = circuit.add_component(ComponentKind::Capacitor, Some("cap"));

        assert_eq!(circuit.assign_designators(), 2);
        assert_eq!(circuit.component(a).unwrap().designator, "R-1");
        assert_eq!(circuit.component(b).unwrap().designator, "R-2");
        assert_eq!(circuit.component(c).unwrap().designator, "C-1");
        assert_eq!(circuit.assign_designators(), 0);
    }

    #[test]
    fn test_mutation_resets_check_state() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, None);
        let g1 = circuit.add_component(ComponentKind::Ground, None);
        circuit.add_connector(r1, 1, g1, 1).unwrap();
        circuit.add_connector(r1, 2, g1, 1).unwrap();

        circuit.compile().unwrap();
        assert!(circuit.is_checked());

        circuit.set_attribute(r1, "value", 47.0).unwrap();
        assert!(circuit.is_checked());

        circuit.set_designator(r1, "R-9").unwrap();
        assert_eq!(circuit.state(), CheckState::Unchecked);
        assert_eq!(circuit.summary().components, 2);
        assert_eq!(circuit.summary().grounds, 1);
    }
}
