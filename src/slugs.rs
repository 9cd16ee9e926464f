//! Slug derivation and collision handling.
//!
//! Slugs are derived deterministically from display names. On collision the
//! first save wins the natural slug and later ones get a numeric suffix
//! (`base`, `base-2`, `base-3`, ...).

use std::collections::HashSet;

/// Lowercase, transliterated, hyphen-separated form of `input`.
pub fn slugify(input: &str) -> String {
    slug::slugify(input)
}

/// Picks the first slug of `base`, `base-2`, `base-3`, ... not in `taken`.
pub fn disambiguate(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("AirPods Pro"), "airpods-pro");
        assert_eq!(slugify("AirPods Pro-Apple"), "airpods-pro-apple");
    }

    #[test]
    fn slugify_transliterates_accents() {
        assert_eq!(slugify("Électronique"), "electronique");
        assert_eq!(slugify("Imprimantes jet d'encre"), "imprimantes-jet-d-encre");
    }

    #[test]
    fn disambiguate_leaves_free_slug_alone() {
        let taken = HashSet::new();
        assert_eq!(disambiguate("audio", &taken), "audio");
    }

    #[test]
    fn disambiguate_appends_numeric_suffix() {
        let mut taken = HashSet::new();
        taken.insert("audio".to_string());
        assert_eq!(disambiguate("audio", &taken), "audio-2");
        taken.insert("audio-2".to_string());
        assert_eq!(disambiguate("audio", &taken), "audio-3");
    }
}
