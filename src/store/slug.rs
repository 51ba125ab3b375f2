//! URL slugs for projects.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Project;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid slug pattern"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").expect("valid slug pattern"));

/// Used when a name contains nothing sluggable.
pub const FALLBACK_SLUG: &str = "project";

/// Turn `text` into a lowercase, hyphen-separated slug.
///
/// Characters other than ASCII letters, digits, whitespace, `_` and `-` are
/// dropped; runs of separators collapse to one `-`; edge hyphens are
/// trimmed.
pub fn generate_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = DISALLOWED.replace_all(lowered.trim(), "");
    let hyphenated = SEPARATORS.replace_all(&cleaned, "-");
    hyphenated.trim_matches('-').to_string()
}

/// A slug for `name` not used by any project other than `exclude_id`.
///
/// Collisions are resolved by appending `-1`, `-2`, ...
pub fn unique_slug(name: &str, projects: &[Project], exclude_id: Option<&str>) -> String {
    let mut base = generate_slug(name);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let taken = |candidate: &str| {
        projects.iter().any(|p| p.slug == candidate && Some(p.id.as_str()) != exclude_id)
    };

    let mut slug = base.clone();
    let mut counter = 1;
    while taken(&slug) {
        slug = format!("{base}-{counter}");
        counter += 1;
    }
    slug
}
