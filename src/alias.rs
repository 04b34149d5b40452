use crate::error::SessionError;
use std::collections::HashMap;

/// Alias store shared by the whole session.
///
/// Two kinds live in the same table: persistent aliases created explicitly by
/// the user, and temporary ones minted whenever a clickable link is rendered.
/// Temporary names follow the reserved `a<N>` shape with a session-monotonic
/// counter, and persistent creation rejects that shape, so the two can never
/// collide.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
    temporary: Vec<String>,
    minted: usize,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a persistent alias.
    ///
    /// Names matching the reserved temporary shape (`a` followed by digits)
    /// are refused.
    pub fn set(&mut self, name: &str, expansion: impl Into<String>) -> Result<(), SessionError> {
        if is_reserved(name) {
            return Err(SessionError::ReservedAliasName(name.to_string()));
        }
        self.entries.insert(name.to_string(), expansion.into());
        Ok(())
    }

    /// Remove a persistent alias. Temporary aliases are only reclaimed in bulk
    /// via [`AliasTable::remove_temporary`], so a tracked temporary name is
    /// left alone here.
    pub fn remove(&mut self, name: &str) -> bool {
        if self.temporary.iter().any(|t| t == name) {
            return false;
        }
        self.entries.remove(name).is_some()
    }

    /// Look up the expansion for a name, persistent or temporary.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Persistent aliases, sorted by name for stable listings.
    pub fn persistent_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter(|(name, _)| !self.temporary.iter().any(|t| t == *name))
            .map(|(name, expansion)| (name.as_str(), expansion.as_str()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Outstanding temporary aliases, in mint order.
    pub fn temporary_entries(&self) -> Vec<(&str, &str)> {
        self.temporary
            .iter()
            .filter_map(|name| {
                self.entries
                    .get(name)
                    .map(|expansion| (name.as_str(), expansion.as_str()))
            })
            .collect()
    }

    /// Mint a temporary alias for a link target and return its name.
    ///
    /// Names are `a<N>` where N counts every temporary alias the session has
    /// ever created; the counter survives [`AliasTable::remove_temporary`], so
    /// names are never reused within a session.
    pub fn add_temporary(&mut self, command_text: impl Into<String>) -> String {
        let name = format!("a{}", self.minted);
        self.minted += 1;
        self.entries.insert(name.clone(), command_text.into());
        self.temporary.push(name.clone());
        name
    }

    /// Drop every tracked temporary alias and clear the tracking list.
    pub fn remove_temporary(&mut self) {
        for name in self.temporary.drain(..) {
            self.entries.remove(&name);
        }
    }

    /// Number of temporary aliases currently outstanding.
    pub fn temporary_len(&self) -> usize {
        self.temporary.len()
    }
}

fn is_reserved(name: &str) -> bool {
    match name.strip_prefix('a') {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
