//! Tag-list cleaning.
//!
//! `any_tags`/`all_tags`/`not_tags` and the authoritative `any_languages`
//! branch (spec.md §9: the source has two `any_languages` cases, the
//! second unreachable; the first, tag-cleaned, branch is authoritative)
//! all pass their values through this before building terms clauses.

#[must_use]
pub fn clean_tags(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
