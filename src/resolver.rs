use crate::registry::{CodeKey, CountryRegistry};
use tracing::warn;

/// Hand-curated alias table for names the border table spells differently
/// from the canonical list. Iteration order is significant: the first
/// fragment contained in the raw name wins, so this is an ordered slice and
/// not a map.
pub const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[
    ("Macedonia", "Macedonia"),
    ("Czech", "Czechia"),
    ("Côte", "Ivory Coast"),
    ("Cyprus", "Cyprus"),
    ("Denmark", "Denmark"),
    ("Netherlands", "Netherlands"),
    ("New Zealand", "New Zealand"),
    ("Norway", "Norway"),
    ("Macau", "Macao"),
];

/// Maps free-text country names to canonical codes: exact display-name match
/// first, then the corrections table, else unresolved.
pub struct NameResolver<'a> {
    registry: &'a CountryRegistry,
    corrections: &'a [(&'a str, &'a str)],
}

impl<'a> NameResolver<'a> {
    pub fn new(registry: &'a CountryRegistry) -> Self {
        Self {
            registry,
            corrections: DEFAULT_CORRECTIONS,
        }
    }

    pub fn with_corrections(
        registry: &'a CountryRegistry,
        corrections: &'a [(&'a str, &'a str)],
    ) -> Self {
        Self { registry, corrections }
    }

    /// Resolves a raw name to the requested code variant. The correction tier
    /// uses substring containment, not whole-token matching, and returns on
    /// the first fragment whose canonical name is present in the registry.
    pub fn resolve(&self, raw_name: &str, key: CodeKey) -> Option<&'a str> {
        if let Some(country) = self.registry.lookup_by_name(raw_name) {
            return Some(country.code(key));
        }
        for (fragment, canonical_name) in self.corrections {
            if raw_name.contains(fragment) {
                if let Some(country) = self.registry.lookup_by_name(canonical_name) {
                    return Some(country.code(key));
                }
            }
        }
        None
    }

    /// Like `resolve`, logging a warning when the name stays unresolved.
    pub fn resolve_or_warn(&self, raw_name: &str, key: CodeKey) -> Option<&'a str> {
        let code = self.resolve(raw_name, key);
        if code.is_none() {
            warn!("Unresolved country name: {}", raw_name);
        }
        code
    }
}
