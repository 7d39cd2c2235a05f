//! Canonical net numbering.
//!
//! Deletions leave gaps in the id sequence and can split one net into two
//! islands that still share an id; loaded circuits may carry arbitrary ids.
//! The renumberer rebuilds the partition from the wires alone and assigns
//! `1..=K` in order of first discovery, with every ground-connected terminal
//! folded into net 0.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use log::{debug, info};

use crate::circuit::{Circuit, Terminal, WireId};
use crate::nets::{NetId, GROUND_NET};

/// Vertex standing for every ground component terminal
const GROUND_VERTEX: usize = 0;

/// Result of labelling the wire graph
#[derive(Debug, Default)]
struct Labelling {
    /// Wired non-ground-component terminals with their new net, in discovery order
    terminals: Vec<(Terminal, NetId)>,
    wires: Vec<(WireId, NetId)>,
    net_count: NetId,
}

pub(crate) struct NetRenumberer;

impl NetRenumberer {
    /// True when stored nets already match the wire graph with ids `1..=K`.
    pub(crate) fn is_canonical(circuit: &Circuit) -> bool {
        if !circuit.nets.is_contiguous() {
            return false;
        }

        let labelling = Self::label(circuit);
        if circuit.nets.assigned_count() != labelling.terminals.len()
            || circuit.nets.net_ids().len() != labelling.net_count as usize
        {
            return false;
        }

        // Planned and stored ids must correspond one to one.
        let mut forward: HashMap<NetId, NetId> = HashMap::new();
        let mut backward: HashMap<NetId, NetId> = HashMap::new();
        for &(terminal, planned) in &labelling.terminals {
            let Some(stored) = circuit.nets.get_net(terminal) else {
                return false;
            };
            if (planned == GROUND_NET) != (stored == GROUND_NET) {
                return false;
            }
            if *forward.entry(planned).or_insert(stored) != stored
                || *backward.entry(stored).or_insert(planned) != planned
            {
                return false;
            }
        }

        circuit.wires().all(|wire| {
            wire.net_id.is_some()
                && wire.net_id == circuit.terminal_net(wire.sta)
                && wire.net_id == circuit.terminal_net(wire.end)
        })
    }

    /// Rewrite every terminal and wire with canonical ids.
    ///
    /// Returns the old to new mapping of numbered nets that survived.
    pub(crate) fn refresh(circuit: &mut Circuit) -> BTreeMap<NetId, NetId> {
        let labelling = Self::label(circuit);

        let mut mapping = BTreeMap::new();
        for &(terminal, new) in &labelling.terminals {
            if let Some(old) = circuit.nets.get_net(terminal) {
                if old != GROUND_NET {
                    mapping.entry(old).or_insert(new);
                }
            }
        }

        let wired: HashSet<Terminal> = labelling.terminals.iter().map(|&(t, _)| t).collect();
        for terminal in circuit.nets.assigned() {
            if !wired.contains(&terminal) {
                debug!("Clearing stale net on {:?}", terminal);
                circuit.nets.clear_net(terminal);
            }
        }

        for &(terminal, net_id) in &labelling.terminals {
            circuit.nets.set_net(terminal, net_id);
        }
        for &(wire_id, net_id) in &labelling.wires {
            if let Some(wire) = circuit.wires.get_mut(wire_id.0).and_then(Option::as_mut) {
                wire.net_id = Some(net_id);
            }
        }

        info!("Renumbered nets to 1..={}", labelling.net_count);
        mapping
    }

    /// Breadth-first connected components over wire adjacency, O(T + W).
    fn label(circuit: &Circuit) -> Labelling {
        let mut index: HashMap<Terminal, usize> = HashMap::new();
        let mut vertices: Vec<Option<Terminal>> = vec![None];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new()];

        let mut edges = Vec::new();
        for wire in circuit.wires() {
            let mut ends = [GROUND_VERTEX; 2];
            for (slot, terminal) in ends.iter_mut().zip([wire.sta, wire.end]) {
                if !circuit.is_ground_terminal(terminal) {
                    *slot = *index.entry(terminal).or_insert_with(|| {
                        vertices.push(Some(terminal));
                        adjacency.push(Vec::new());
                        vertices.len() - 1
                    });
                }
            }
            adjacency[ends[0]].push(ends[1]);
            adjacency[ends[1]].push(ends[0]);
            edges.push((wire.id, ends[0]));
        }

        let mut labels: Vec<Option<NetId>> = vec![None; vertices.len()];
        let mut net_count: NetId = 0;
        for start in 0..vertices.len() {
            if labels[start].is_some() {
                continue;
            }
            let net_id = if start == GROUND_VERTEX {
                GROUND_NET
            } else {
                net_count += 1;
                net_count
            };

            labels[start] = Some(net_id);
            let mut queue = VecDeque::from([start]);
            while let Some(vertex) = queue.pop_front() {
                for &next in &adjacency[vertex] {
                    if labels[next].is_none() {
                        labels[next] = Some(net_id);
                        queue.push_back(next);
                    }
                }
            }
        }

        let terminals = vertices
            .iter()
            .zip(&labels)
            .filter_map(|(vertex, label)| Some(((*vertex)?, (*label)?)))
            .collect();
        let wires = edges
            .into_iter()
            .filter_map(|(wire_id, vertex)| Some((wire_id, labels[vertex]?)))
            .collect();

        Labelling {
            terminals,
            wires,
            net_count,
        }
    }
}
