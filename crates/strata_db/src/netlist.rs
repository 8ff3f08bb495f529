//! The netlist: instances, nets, and the connect/disconnect primitives
//! that keep their cross-references consistent.

use crate::{Instance, InstanceKey, Net, NetKey, PinKey};
use strata_common::{NamedStore, StrataError, StrataResult};

/// Instances and nets of one module.
///
/// Both sides of the instance-net relation store only keys; the
/// [`connect`](Netlist::connect) and [`disconnect`](Netlist::disconnect)
/// primitives are the only way to mutate the relation, which maintains the
/// invariant that a net lists `(instance, pin)` exactly when that instance
/// records the net on that pin.
#[derive(Debug)]
pub struct Netlist {
    /// Instance store.
    pub instances: NamedStore<InstanceKey, Instance>,
    /// Net store.
    pub nets: NamedStore<NetKey, Net>,
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self {
            instances: NamedStore::new("instance"),
            nets: NamedStore::new("net"),
        }
    }

    /// Removes all instances and nets.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.nets.clear();
    }

    /// Creates a net, or returns the existing key when the name is taken.
    pub fn create_net(&mut self, name: &str) -> StrataResult<NetKey> {
        if let Some(key) = self.nets.key_of(name) {
            return Ok(key);
        }
        self.nets.add(Net::new(name))
    }

    /// Connects `net` to pin `pin` of instance `ins`.
    ///
    /// Idempotent: connecting the same triple twice is a no-op. A pin that
    /// was connected to a different net is moved (the old net's connection
    /// entry is removed). Fails when either handle is invalid or the pin
    /// index is out of range.
    pub fn connect(&mut self, ins: InstanceKey, pin: PinKey, net: NetKey) -> StrataResult<()> {
        if self.nets.get(net).is_none() {
            return Err(StrataError::NotFound {
                kind: "net",
                name: format!("key {}", net.as_raw()),
            });
        }
        let instance = self.instances.at_mut(ins)?;
        let previous = instance.pin_net(pin);
        if previous == Some(net) {
            return Ok(());
        }
        if !instance.set_pin_net(pin, Some(net)) {
            return Err(StrataError::invalid_state(format!(
                "instance '{}' has no pin index {}",
                instance.name,
                pin.as_raw()
            )));
        }
        if let Some(old) = previous {
            if let Some(old_net) = self.nets.get_mut(old) {
                old_net.remove_connection(ins, pin);
            }
        }
        let net_obj = self.nets.get_mut(net).expect("checked above");
        if !net_obj.has_connection(ins, pin) {
            net_obj.add_connection(ins, pin);
        }
        Ok(())
    }

    /// Disconnects pin `pin` of instance `ins` from whatever net it is on.
    ///
    /// Returns `true` when a connection was removed.
    pub fn disconnect(&mut self, ins: InstanceKey, pin: PinKey) -> StrataResult<bool> {
        let instance = self.instances.at_mut(ins)?;
        let Some(net) = instance.pin_net(pin) else {
            return Ok(false);
        };
        instance.set_pin_net(pin, None);
        if let Some(net_obj) = self.nets.get_mut(net) {
            net_obj.remove_connection(ins, pin);
        }
        Ok(true)
    }
}
