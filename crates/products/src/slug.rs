//! Slug normalization.

/// Normalize a slug candidate: lower-case, spaces become `_`, apostrophes are dropped.
///
/// Applied to the title when a product is created without a slug, and to the
/// current slug on every create and update.
pub fn normalize_slug(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "_").replace('\'', "")
}
