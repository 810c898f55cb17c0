//! Team display-name canonicalization.
//!
//! Upstream renders some clubs under their full registered name while the
//! downstream database keys on the short form. The alias table is applied
//! after whitespace collapse so every component past the extractor sees one
//! spelling per club.

use std::collections::HashMap;

/// Finite alias table plus whitespace normalization.
#[derive(Debug, Clone)]
pub struct TeamNameNormalizer {
    aliases: HashMap<String, String>,
}

impl Default for TeamNameNormalizer {
    fn default() -> Self {
        let mut aliases = HashMap::new();
        aliases.insert(
            "Intercontinental Football Academy of New England".to_string(),
            "IFA".to_string(),
        );
        Self { aliases }
    }
}

impl TeamNameNormalizer {
    /// Add an alias. Later entries win over earlier ones for the same key.
    pub fn with_alias(mut self, long: impl Into<String>, short: impl Into<String>) -> Self {
        self.aliases.insert(long.into(), short.into());
        self
    }

    /// Canonicalize a raw display name: collapse internal whitespace, trim,
    /// then apply the alias table.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        match self.aliases.get(&collapsed) {
            Some(short) => short.clone(),
            None => collapsed,
        }
    }
}
