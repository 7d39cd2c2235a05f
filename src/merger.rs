use crate::circuit::{Circuit, Terminal};
use crate::error::ConflictError;
use crate::nets::{NetId, GROUND_NET};

/// Decides which net a new wire joins.
///
/// Rules, in order of evaluation:
/// - a terminal of a ground component is always on net 0 and is never looked
///   up in the net table;
/// - two unconnected terminals start a fresh net, numbered one above the
///   highest id in use (the lowest unused id once that would overflow);
/// - an unconnected terminal joins the net of the other end;
/// - two terminals already on the same net keep it;
/// - two terminals on different nets are rejected. Unifying two existing nets
///   is only possible through an explicit rename.
pub struct ConnectionMerger<'a> {
    circuit: &'a Circuit,
}

impl<'a> ConnectionMerger<'a> {
    pub fn new(circuit: &'a Circuit) -> Self {
        ConnectionMerger { circuit }
    }

    pub fn propose(&self, sta: Terminal, end: Terminal) -> Result<NetId, ConflictError> {
        match (self.net_of(sta), self.net_of(end)) {
            (None, None) => self.circuit.nets.fresh_net_id().ok_or(ConflictError::Exhausted),
            (Some(net_id), None) | (None, Some(net_id)) => Ok(net_id),
            (Some(sta_net), Some(end_net)) if sta_net == end_net => Ok(sta_net),
            (Some(sta_net), Some(end_net)) => Err(ConflictError::DifferentNets(sta_net, end_net)),
        }
    }

    fn net_of(&self, terminal: Terminal) -> Option<NetId> {
        if self.circuit.is_ground_terminal(terminal) {
            Some(GROUND_NET)
        } else {
            self.circuit.nets.get_net(terminal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{ComponentId, ComponentKind};

    fn two_resistors() -> (Circuit, ComponentId, ComponentId) {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let r1 = circuit.add_component(ComponentKind::Resistor, Some("R-1"));
        let r2 = circuit.add_component(ComponentKind::Resistor, Some("R-2"));
        (circuit, r1, r2)
    }

    #[test]
    fn test_fresh_net() {
        let (mut circuit, r1, r2) = two_resistors();
        let sta = Terminal::new(r1, 2);
        let end = Terminal::new(r2, 1);
        assert_eq!(circuit.propose(sta, end), Ok(1));

        circuit.add_connector(r1, 2, r2, 1).unwrap();
        assert_eq!(circuit.terminal_net(sta), Some(1));
        assert_eq!(circuit.terminal_net(end), Some(1));
    }

    #[test]
    fn test_fresh_net_is_max_plus_one() {
        let (mut circuit, r1, r2) = two_resistors();
        circuit.add_connector(r1, 2, r2, 1).unwrap();
        circuit.change_net_id(1, 7).unwrap();
        assert_eq!(
            circuit.propose(Terminal::new(r1, 1), Terminal::new(r2, 2)),
            Ok(8)
        );
    }

    #[test]
    fn test_fresh_net_after_highest_id() {
        let (mut circuit, r1, r2) = two_resistors();
        let r3 = circuit.add_component(ComponentKind::Resistor, None);
        let r4 = circuit.add_component(ComponentKind::Resistor, None);
        circuit.add_connector(r1, 2, r2, 1).unwrap();
        circuit.change_net_id(1, NetId::MAX).unwrap();

        let sta = Terminal::new(r3, 2);
        let end = Terminal::new(r4, 1);
        assert_eq!(circuit.propose(sta, end), Ok(1));
        circuit.add_connector(r3, 2, r4, 1).unwrap();
        assert_eq!(circuit.terminal_net(sta), Some(1));
        assert_eq!(circuit.net_ids(), vec![1, NetId::MAX]);
    }

    #[test]
    fn test_propagation() {
        let (mut circuit, r1, r2) = two_resistors();
        let r3 = circuit.add_component(ComponentKind::Resistor, None);
        circuit.add_connector(r1, 2, r2, 1).unwrap();

        assert_eq!(
            circuit.propose(Terminal::new(r3, 1), Terminal::new(r2, 1)),
            Ok(1)
        );
        circuit.add_connector(r3, 1, r2, 1).unwrap();
        assert_eq!(circuit.terminal_net(Terminal::new(r3, 1)), Some(1));
    }

    #[test]
    fn test_same_net_is_idempotent() {
        let (mut circuit, r1, r2) = two_resistors();
        circuit.add_connector(r1, 2, r2, 1).unwrap();
        assert_eq!(
            circuit.propose(Terminal::new(r1, 2), Terminal::new(r2, 1)),
            Ok(1)
        );
        circuit.add_connector(r2, 1, r1, 2).unwrap();
        assert_eq!(circuit.net_ids(), vec![1]);
    }

    #[test]
    fn test_different_nets_rejected_without_mutation() {
        let (mut circuit, r1, r2) = two_resistors();
        circuit.add_connector(r1, 2, r2, 1).unwrap();
        circuit.add_connector(r1, 1, r2, 2).unwrap();
        let before = circuit.net_table().assigned();

        let sta = Terminal::new(r1, 1);
        let end = Terminal::new(r1, 2);
        assert_eq!(
            circuit.propose(sta, end),
            Err(ConflictError::DifferentNets(2, 1))
        );
        assert!(circuit.add_connector(r1, 1, r1, 2).is_err());
        assert_eq!(circuit.net_table().assigned(), before);
        assert_eq!(circuit.terminal_net(sta), Some(2));
        assert_eq!(circuit.wires().count(), 2);
    }

    #[test]
    fn test_ground_is_net_zero() {
        let (mut circuit, r1, r2) = two_resistors();
        let g1 = circuit.add_component(ComponentKind::Ground, None);
        circuit.add_connector(r1, 2, r2, 1).unwrap();

        assert_eq!(
            circuit.propose(Terminal::new(g1, 1), Terminal::new(r1, 1)),
            Ok(GROUND_NET)
        );
        circuit.add_connector(g1, 1, r1, 1).unwrap();
        assert_eq!(circuit.terminal_net(Terminal::new(r1, 1)), Some(GROUND_NET));
        assert_eq!(circuit.net_table().get_net(Terminal::new(g1, 1)), None);
        assert_eq!(circuit.net_ids(), vec![1]);

        assert_eq!(
            circuit.propose(Terminal::new(g1, 1), Terminal::new(r1, 2)),
            Err(ConflictError::DifferentNets(0, 1))
        );
    }

    #[test]
    fn test_two_grounds_share_net_zero() {
        let mut circuit = Circuit::new("Test Circuit".to_string());
        let g1 = circuit.add_component(ComponentKind::Ground, None);
        let g2 = circuit.add_component(ComponentKind::Ground, None);
        assert_eq!(
            circuit.propose(Terminal::new(g1, 1), Terminal::new(g2, 1)),
            Ok(GROUND_NET)
        );
    }

    #[test]
    fn test_self_loop_follows_general_rule() {
        let (mut circuit, r1, r2) = two_resistors();
        let sta = Terminal::new(r1, 1);
        assert_eq!(circuit.propose(sta, sta), Ok(1));

        circuit.add_connector(r1, 1, r2, 1).unwrap();
        assert_eq!(circuit.propose(sta, sta), Ok(1));
    }
}
