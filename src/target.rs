use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

/// A managed thread as reported by the diagnostics layer.
#[derive(Debug, Clone)]
pub struct ThreadInfo {
    /// Operating-system thread id.
    pub os_id: u64,
    /// Runtime-assigned managed thread id.
    pub managed_id: u64,
    /// Thread name, if the runtime recorded one.
    pub name: Option<String>,
}

/// A single heap object record.
#[derive(Debug, Clone, Serialize)]
pub struct HeapObject {
    pub address: u64,
    pub type_name: String,
    pub size: u64,
    /// Addresses of objects this one references.
    pub references: Vec<u64>,
}

/// Read-only window onto the inspected process or crash dump.
///
/// Implementations wrap the diagnostics layer that walks live memory or a dump
/// file. Every call may block (file I/O, symbol download, memory reads) and
/// may fail; the dispatch loop contains whatever comes back.
pub trait TargetInspector {
    /// Human-readable description of what is attached, e.g. a dump path or a
    /// process name.
    fn description(&self) -> String;

    fn threads(&self) -> Result<Vec<ThreadInfo>>;

    fn heap_objects(&self) -> Result<Vec<HeapObject>>;

    /// The object starting at `address`, or `None` if the address does not
    /// point at a live heap object.
    fn object_at(&self, address: u64) -> Result<Option<HeapObject>>;

    /// Resolve a code address to a symbol name.
    fn symbol_at(&self, address: u64) -> Result<Option<String>>;
}

/// Memoizing front for symbol resolution.
///
/// Symbol lookups can hit symbol servers and are the slowest thing a command
/// does, so both hits and misses are cached: an address that failed to resolve
/// once is not retried for the rest of the session.
#[derive(Debug, Default)]
pub struct SymbolCache {
    resolved: HashMap<u64, Option<String>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        target: &dyn TargetInspector,
        address: u64,
    ) -> Result<Option<String>> {
        if let Some(cached) = self.resolved.get(&address) {
            return Ok(cached.clone());
        }
        let looked_up = target.symbol_at(address)?;
        self.resolved.insert(address, looked_up.clone());
        Ok(looked_up)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::FakeTarget;
    use super::*;

    #[test]
    fn test_symbol_cache_memoizes_hits_and_misses() {
        let target = FakeTarget::sample();
        let mut cache = SymbolCache::new();

        assert_eq!(
            cache.resolve(&target, 0x5000).unwrap(),
            Some("Program.Main".to_string())
        );
        assert_eq!(
            cache.resolve(&target, 0x5000).unwrap(),
            Some("Program.Main".to_string())
        );
        // One lookup despite two resolves.
        assert_eq!(target.symbol_lookups.get(), 1);

        assert_eq!(cache.resolve(&target, 0xdead).unwrap(), None);
        assert_eq!(cache.resolve(&target, 0xdead).unwrap(), None);
        assert_eq!(target.symbol_lookups.get(), 2);
        assert_eq!(cache.len(), 2);
    }
}
