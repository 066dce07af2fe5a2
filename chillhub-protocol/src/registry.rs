//! Handler registry keyed by (category, symbol)
//!
//! Each key maps to at most one handler. Registering an existing key
//! replaces its handler, and any key can be removed.

use core::fmt;

use heapless::LinearMap;

/// Handler namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Category {
    /// Hub/fridge messages at or below the reserved boundary
    Device = 0,
    /// Cron alarm notifications, keyed by alarm id
    CronAlarm = 1,
    /// Time responses, always symbol 0
    Time = 2,
    /// User/cloud messages above the reserved boundary
    Cloud = 3,
}

/// Registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key {
    pub category: Category,
    pub symbol: u8,
}

impl Key {
    pub const fn new(category: Category, symbol: u8) -> Self {
        Self { category, symbol }
    }

    pub const fn device(msg_type: u8) -> Self {
        Self::new(Category::Device, msg_type)
    }

    pub const fn cloud(msg_type: u8) -> Self {
        Self::new(Category::Cloud, msg_type)
    }

    pub const fn alarm(id: u8) -> Self {
        Self::new(Category::CronAlarm, id)
    }

    pub const fn time() -> Self {
        Self::new(Category::Time, 0)
    }
}

/// Payload shape a handler accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    U8,
    U16,
    U32,
    Text,
    Bytes,
    Timestamp,
}

/// Application callback, one variant per payload shape
///
/// `C` is the application context passed to [`crate::Channel::poll`].
pub enum Handler<C> {
    U8(fn(&mut C, u8)),
    U16(fn(&mut C, u16)),
    U32(fn(&mut C, u32)),
    /// String payload; frames that are not UTF-8 are dropped
    Text(fn(&mut C, &str)),
    /// String payload as raw bytes, whatever the encoding
    Bytes(fn(&mut C, &[u8])),
    /// Raw 4-byte timestamp as sent by the hub
    Timestamp(fn(&mut C, [u8; 4])),
}

impl<C> Handler<C> {
    pub fn shape(&self) -> Shape {
        match self {
            Handler::U8(_) => Shape::U8,
            Handler::U16(_) => Shape::U16,
            Handler::U32(_) => Shape::U32,
            Handler::Text(_) => Shape::Text,
            Handler::Bytes(_) => Shape::Bytes,
            Handler::Timestamp(_) => Shape::Timestamp,
        }
    }
}

// Manual impls: derives would demand `C: Clone`/`C: Debug`
impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handler<C> {}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.shape())
    }
}

/// Returned when a new key does not fit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryFull;

/// Fixed-capacity handler table with `N` slots
pub struct Registry<C, const N: usize> {
    entries: LinearMap<Key, Handler<C>, N>,
}

impl<C, const N: usize> Default for Registry<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> fmt::Debug for Registry<C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<C, const N: usize> Registry<C, N> {
    pub const fn new() -> Self {
        Self {
            entries: LinearMap::new(),
        }
    }

    /// Install `handler` for `key`, returning the handler it replaced
    pub fn register(
        &mut self,
        key: Key,
        handler: Handler<C>,
    ) -> Result<Option<Handler<C>>, RegistryFull> {
        self.entries.insert(key, handler).map_err(|_| RegistryFull)
    }

    /// Handler installed for `key`
    pub fn lookup(&self, key: Key) -> Option<Handler<C>> {
        self.entries.get(&key).copied()
    }

    /// Unregister `key`, returning its handler if there was one
    pub fn remove(&mut self, key: Key) -> Option<Handler<C>> {
        self.entries.remove(&key)
    }

    /// True if `key` has a handler
    pub fn contains(&self, key: Key) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of installed handlers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unregister everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Seen {
        old: u32,
        new: u32,
    }

    fn old_handler(seen: &mut Seen, _: u8) {
        seen.old += 1;
    }

    fn new_handler(seen: &mut Seen, _: u8) {
        seen.new += 1;
    }

    fn invoke(handler: Handler<Seen>, seen: &mut Seen) {
        match handler {
            Handler::U8(f) => f(seen, 0),
            other => panic!("unexpected shape {:?}", other.shape()),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry: Registry<Seen, 4> = Registry::new();
        assert!(registry.lookup(Key::device(0x0D)).is_none());

        assert!(registry
            .register(Key::device(0x0D), Handler::U8(old_handler))
            .unwrap()
            .is_none());
        let handler = registry.lookup(Key::device(0x0D)).unwrap();
        assert_eq!(handler.shape(), Shape::U8);

        // Same symbol in another category is a different key
        assert!(registry.lookup(Key::cloud(0x0D)).is_none());
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry: Registry<Seen, 4> = Registry::new();
        registry
            .register(Key::device(0x0D), Handler::U8(old_handler))
            .unwrap();
        let replaced = registry
            .register(Key::device(0x0D), Handler::U8(new_handler))
            .unwrap();
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);

        let mut seen = Seen::default();
        invoke(registry.lookup(Key::device(0x0D)).unwrap(), &mut seen);
        assert_eq!(seen.old, 0);
        assert_eq!(seen.new, 1);
    }

    #[test]
    fn test_remove_only_entry() {
        let mut registry: Registry<Seen, 4> = Registry::new();
        registry
            .register(Key::time(), Handler::U8(old_handler))
            .unwrap();
        assert!(registry.remove(Key::time()).is_some());
        assert!(registry.lookup(Key::time()).is_none());
        assert!(registry.is_empty());
        assert!(registry.remove(Key::time()).is_none());
    }

    #[test]
    fn test_remove_most_recent_keeps_others() {
        let mut registry: Registry<Seen, 4> = Registry::new();
        registry
            .register(Key::alarm(1), Handler::U8(old_handler))
            .unwrap();
        registry
            .register(Key::alarm(2), Handler::U8(new_handler))
            .unwrap();

        assert!(registry.remove(Key::alarm(2)).is_some());
        assert!(registry.contains(Key::alarm(1)));
        assert!(!registry.contains(Key::alarm(2)));
    }

    #[test]
    fn test_full_registry_rejects_new_key_but_replaces() {
        let mut registry: Registry<Seen, 2> = Registry::new();
        registry
            .register(Key::device(1), Handler::U8(old_handler))
            .unwrap();
        registry
            .register(Key::device(2), Handler::U8(old_handler))
            .unwrap();
        assert_eq!(
            registry
                .register(Key::device(3), Handler::U8(old_handler))
                .unwrap_err(),
            RegistryFull
        );
        assert!(registry
            .register(Key::device(2), Handler::U8(new_handler))
            .is_ok());
        assert_eq!(registry.capacity(), 2);
    }
}
