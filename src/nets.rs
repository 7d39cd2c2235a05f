use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::circuit::Terminal;

/// Electrical net identifier. `0` is reserved for ground.
pub type NetId = u32;

/// The ground net.
pub const GROUND_NET: NetId = 0;

/// Storage of terminal/net associations.
///
/// Numbered nets and ground are kept apart: a terminal wired to ground lives in
/// the grounded set and never appears under net `0` in the numbered map. The
/// table performs no validation; callers keep wires and nets consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetTable {
    nets: HashMap<Terminal, NetId>,
    members: BTreeMap<NetId, BTreeSet<Terminal>>,
    grounded: BTreeSet<Terminal>,
    wire_counts: HashMap<Terminal, usize>,
}

impl NetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net of a terminal, `Some(0)` when it is wired to ground.
    pub fn get_net(&self, terminal: Terminal) -> Option<NetId> {
        if self.grounded.contains(&terminal) {
            Some(GROUND_NET)
        } else {
            self.nets.get(&terminal).copied()
        }
    }

    pub fn set_net(&mut self, terminal: Terminal, net_id: NetId) {
        self.clear_net(terminal);
        if net_id == GROUND_NET {
            self.grounded.insert(terminal);
        } else {
            self.nets.insert(terminal, net_id);
            self.members.entry(net_id).or_default().insert(terminal);
        }
    }

    pub fn clear_net(&mut self, terminal: Terminal) {
        self.grounded.remove(&terminal);
        if let Some(old) = self.nets.remove(&terminal) {
            if let Some(set) = self.members.get_mut(&old) {
                set.remove(&terminal);
                if set.is_empty() {
                    self.members.remove(&old);
                }
            }
        }
    }

    /// Number of registered wire ends sitting on this terminal.
    pub fn wire_count(&self, terminal: Terminal) -> usize {
        self.wire_counts.get(&terminal).copied().unwrap_or(0)
    }

    pub fn register_wire(&mut self, sta: Terminal, end: Terminal) {
        for terminal in [sta, end] {
            *self.wire_counts.entry(terminal).or_insert(0) += 1;
        }
    }

    /// Drop one wire end from a terminal and return how many remain.
    pub fn unregister_wire(&mut self, terminal: Terminal) -> usize {
        match self.wire_counts.get_mut(&terminal) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                self.wire_counts.remove(&terminal);
                0
            }
            None => 0,
        }
    }

    /// In-use numbered net ids, ascending. Ground is not included.
    pub fn net_ids(&self) -> Vec<NetId> {
        self.members.keys().copied().collect()
    }

    pub fn max_net_id(&self) -> NetId {
        self.members.keys().next_back().copied().unwrap_or(GROUND_NET)
    }

    /// Id for a brand new net: one above the highest id in use, or the lowest
    /// unused id >= 1 once that would overflow. `None` only if every id is taken.
    pub fn fresh_net_id(&self) -> Option<NetId> {
        if let Some(net_id) = self.max_net_id().checked_add(1) {
            return Some(net_id);
        }
        let mut candidate: NetId = 1;
        for &net_id in self.members.keys() {
            if net_id != candidate {
                break;
            }
            candidate = candidate.checked_add(1)?;
        }
        Some(candidate)
    }

    pub fn contains_net(&self, net_id: NetId) -> bool {
        self.members.contains_key(&net_id)
    }

    /// Terminals of a net. Net `0` yields the grounded terminals.
    pub fn members(&self, net_id: NetId) -> Vec<Terminal> {
        if net_id == GROUND_NET {
            self.grounded.iter().copied().collect()
        } else {
            self.members
                .get(&net_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        }
    }

    /// Every terminal currently holding a net, grounded ones included.
    pub fn assigned(&self) -> Vec<Terminal> {
        let mut terminals: Vec<Terminal> = self.nets.keys().copied().collect();
        terminals.extend(self.grounded.iter().copied());
        terminals.sort();
        terminals
    }

    pub fn assigned_count(&self) -> usize {
        self.nets.len() + self.grounded.len()
    }

    /// True when the in-use ids are exactly `1..=K`.
    pub fn is_contiguous(&self) -> bool {
        self.members
            .keys()
            .enumerate()
            .all(|(idx, &net_id)| net_id as usize == idx + 1)
    }

    /// Move every member of `old` to `new`. The caller checks that `new` is free.
    pub fn rename(&mut self, old: NetId, new: NetId) {
        if let Some(set) = self.members.remove(&old) {
            for terminal in &set {
                self.nets.insert(*terminal, new);
            }
            self.members.insert(new, set);
        }
    }
}
