//! Name-and-key indexed entity storage.
//!
//! A [`NamedStore`] owns all objects of one entity type and offers two
//! independent indices: an opaque monotonically-assigned key and a unique
//! string name. Iteration is in ascending key order, which makes every walk
//! over a store deterministic. Interested parties can subscribe to mutation
//! events through [`StoreListener`].

use crate::error::{StrataError, StrataResult};
use crate::keys::StoreKey;
use std::collections::{BTreeMap, HashMap};

/// Trait for objects that carry their own unique name.
pub trait Named {
    /// The object's name, unique within its store.
    fn name(&self) -> &str;
}

/// Mutation event delivered to store listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent<K> {
    /// An object was added under the given key.
    Added(K),
    /// The object with the given key was removed.
    Removed(K),
    /// The whole store was cleared.
    Cleared,
    /// A change that does not fit the other kinds.
    Unspecified,
}

/// Synchronous observer of a [`NamedStore`].
///
/// Notification happens from the mutating call, on the mutating thread.
pub trait StoreListener<K> {
    /// Called after every add, remove or clear.
    fn notify(&mut self, event: StoreEvent<K>);
}

/// Token returned by [`NamedStore::add_listener`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u32);

/// Container owning objects of one entity type, indexed by key and by name.
///
/// Keys are assigned in add order from a counter that is never rewound, so a
/// key is invalidated only by removing its object and can never alias a
/// later object - `clear()` included.
pub struct NamedStore<K: StoreKey, T: Named> {
    kind: &'static str,
    items: BTreeMap<u32, T>,
    name_index: HashMap<String, u32>,
    next_key: u32,
    listeners: Vec<(ListenerToken, Box<dyn StoreListener<K>>)>,
    next_token: u32,
}

impl<K: StoreKey, T: Named> NamedStore<K, T> {
    /// Creates an empty store. `kind` names the entity type in error
    /// messages ("cell", "net", ...).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: BTreeMap::new(),
            name_index: HashMap::new(),
            next_key: 0,
            listeners: Vec::new(),
            next_token: 0,
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds an object, assigning it the next key.
    ///
    /// Fails with [`StrataError::DuplicateName`] when an object of the same
    /// name is already present.
    pub fn add(&mut self, obj: T) -> StrataResult<K> {
        if self.name_index.contains_key(obj.name()) {
            return Err(StrataError::DuplicateName {
                kind: self.kind,
                name: obj.name().to_owned(),
            });
        }
        let raw = self.next_key;
        self.next_key += 1;
        self.name_index.insert(obj.name().to_owned(), raw);
        self.items.insert(raw, obj);
        let key = K::from_raw(raw);
        self.notify_all(StoreEvent::Added(key));
        Ok(key)
    }

    /// Removes the object with the given key. Returns `true` on success.
    pub fn remove(&mut self, key: K) -> bool {
        let raw = key.as_raw();
        match self.items.remove(&raw) {
            Some(obj) => {
                self.name_index.remove(obj.name());
                self.notify_all(StoreEvent::Removed(key));
                true
            }
            None => false,
        }
    }

    /// Removes the object with the given name. Returns `true` on success.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.name_index.remove(name) {
            Some(raw) => {
                self.items.remove(&raw);
                self.notify_all(StoreEvent::Removed(K::from_raw(raw)));
                true
            }
            None => false,
        }
    }

    /// Removes all objects. The key counter keeps running so old keys stay
    /// invalid forever.
    pub fn clear(&mut self) {
        self.items.clear();
        self.name_index.clear();
        self.notify_all(StoreEvent::Cleared);
    }

    /// Looks up an object by key.
    pub fn get(&self, key: K) -> Option<&T> {
        self.items.get(&key.as_raw())
    }

    /// Looks up an object by key, mutably.
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.items.get_mut(&key.as_raw())
    }

    /// Looks up an object by key, failing with [`StrataError::NotFound`].
    pub fn at(&self, key: K) -> StrataResult<&T> {
        self.get(key).ok_or_else(|| StrataError::NotFound {
            kind: self.kind,
            name: format!("key {}", key.as_raw()),
        })
    }

    /// Looks up an object by key, mutably, failing with
    /// [`StrataError::NotFound`].
    pub fn at_mut(&mut self, key: K) -> StrataResult<&mut T> {
        let kind = self.kind;
        self.get_mut(key).ok_or_else(|| StrataError::NotFound {
            kind,
            name: format!("key {}", key.as_raw()),
        })
    }

    /// Looks up an object by name.
    pub fn find_by_name(&self, name: &str) -> Option<(K, &T)> {
        let raw = *self.name_index.get(name)?;
        self.items.get(&raw).map(|obj| (K::from_raw(raw), obj))
    }

    /// Looks up an object by name, mutably.
    pub fn find_by_name_mut(&mut self, name: &str) -> Option<(K, &mut T)> {
        let raw = *self.name_index.get(name)?;
        self.items.get_mut(&raw).map(|obj| (K::from_raw(raw), obj))
    }

    /// Looks up an object by name, failing with [`StrataError::NotFound`].
    pub fn at_name(&self, name: &str) -> StrataResult<(K, &T)> {
        self.find_by_name(name).ok_or_else(|| StrataError::NotFound {
            kind: self.kind,
            name: name.to_owned(),
        })
    }

    /// Returns the key of the named object, if present.
    pub fn key_of(&self, name: &str) -> Option<K> {
        self.name_index.get(name).map(|&raw| K::from_raw(raw))
    }

    /// Returns `true` when an object of the given name exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Iterates `(key, &object)` in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.items.iter().map(|(&raw, obj)| (K::from_raw(raw), obj))
    }

    /// Iterates `(key, &mut object)` in ascending key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.items
            .iter_mut()
            .map(|(&raw, obj)| (K::from_raw(raw), obj))
    }

    /// Iterates object references in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Registers a listener; returns the token to unsubscribe with.
    pub fn add_listener(&mut self, listener: Box<dyn StoreListener<K>>) -> ListenerToken {
        let token = ListenerToken(self.next_token);
        self.next_token += 1;
        self.listeners.push((token, listener));
        token
    }

    /// Unregisters a listener. Returns `true` when the token was known.
    pub fn remove_listener(&mut self, token: ListenerToken) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(t, _)| *t != token);
        self.listeners.len() != before
    }

    fn notify_all(&mut self, event: StoreEvent<K>) {
        for (_, listener) in &mut self.listeners {
            listener.notify(event);
        }
    }
}

impl<K: StoreKey, T: Named + std::fmt::Debug> std::fmt::Debug for NamedStore<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedStore")
            .field("kind", &self.kind)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
