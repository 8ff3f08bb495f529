//! Nets and their instance-pin connections.

use crate::{InstanceKey, PinKey};
use serde::{Deserialize, Serialize};
use strata_common::Named;

/// One endpoint of a net: a pin on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConnect {
    /// The connected instance.
    pub instance: InstanceKey,
    /// The pin on that instance.
    pub pin: PinKey,
}

/// A net connecting instance pins.
///
/// The connection list mirrors the per-instance pin-to-net table; the two
/// sides are kept consistent by [`Netlist::connect`](crate::Netlist::connect)
/// and must never be edited independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Net {
    /// Net name.
    pub name: String,
    /// Set when the net connects to a module port.
    pub is_port_net: bool,
    /// Set when the net distributes a clock.
    pub is_clock_net: bool,
    connections: Vec<NetConnect>,
}

impl Net {
    /// Creates a named net with no connections.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns `true` when `(instance, pin)` is already connected.
    pub fn has_connection(&self, instance: InstanceKey, pin: PinKey) -> bool {
        self.connections
            .iter()
            .any(|c| c.instance == instance && c.pin == pin)
    }

    /// Appends a connection without checking for duplicates.
    pub fn add_connection(&mut self, instance: InstanceKey, pin: PinKey) {
        self.connections.push(NetConnect { instance, pin });
    }

    /// Removes a connection. Returns `true` when one was removed.
    pub fn remove_connection(&mut self, instance: InstanceKey, pin: PinKey) -> bool {
        let before = self.connections.len();
        self.connections
            .retain(|c| !(c.instance == instance && c.pin == pin));
        self.connections.len() != before
    }

    /// Number of connections.
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }

    /// Iterates the connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &NetConnect> {
        self.connections.iter()
    }
}

impl Named for Net {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(i: u32, p: u32) -> (InstanceKey, PinKey) {
        (InstanceKey::from_raw(i), PinKey::from_raw(p))
    }

    #[test]
    fn add_and_query() {
        let mut net = Net::new("n1");
        let (i, p) = conn(0, 1);
        assert!(!net.has_connection(i, p));
        net.add_connection(i, p);
        assert!(net.has_connection(i, p));
        assert_eq!(net.num_connections(), 1);
    }

    #[test]
    fn remove_connection() {
        let mut net = Net::new("n1");
        let (i, p) = conn(3, 0);
        net.add_connection(i, p);
        assert!(net.remove_connection(i, p));
        assert!(!net.remove_connection(i, p));
        assert_eq!(net.num_connections(), 0);
    }

    #[test]
    fn connections_keep_insertion_order() {
        let mut net = Net::new("n1");
        net.add_connection(InstanceKey::from_raw(2), PinKey::from_raw(0));
        net.add_connection(InstanceKey::from_raw(0), PinKey::from_raw(1));
        let order: Vec<u32> = net.connections().map(|c| c.instance.as_raw()).collect();
        assert_eq!(order, vec![2, 0]);
    }
}
