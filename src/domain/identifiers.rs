//! Identifier normalization between the legacy and current user suffixes.

pub const DEFAULT_LEGACY_SUFFIX: &str = "@c.us";
pub const DEFAULT_CURRENT_SUFFIX: &str = "@s.whatsapp.net";

/// Rewrite rule from the legacy identifier suffix to the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixRule {
    legacy: String,
    current: String,
}

impl SuffixRule {
    pub fn new(legacy: impl Into<String>, current: impl Into<String>) -> Self {
        Self {
            legacy: legacy.into(),
            current: current.into(),
        }
    }

    /// Rewrites `id` when it ends with the legacy suffix.
    ///
    /// Only the first occurrence of the suffix is replaced, so an identifier
    /// that embeds the suffix more than once keeps its later occurrences.
    pub fn normalize(&self, id: &str) -> String {
        if self.legacy.is_empty() || !id.ends_with(&self.legacy) {
            return id.to_owned();
        }

        id.replacen(&self.legacy, &self.current, 1)
    }

    pub fn normalize_in_place(&self, id: &mut String) {
        if id.ends_with(&self.legacy) {
            *id = self.normalize(id);
        }
    }

    pub fn normalize_all(&self, ids: &mut [String]) {
        for id in ids {
            self.normalize_in_place(id);
        }
    }
}

impl Default for SuffixRule {
    fn default() -> Self {
        Self::new(DEFAULT_LEGACY_SUFFIX, DEFAULT_CURRENT_SUFFIX)
    }
}
