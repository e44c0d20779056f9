//! Collision-free naming for uploads.
//!
//! A name already present in the storage listing gets a `(n)` counter
//! inserted before its extension: `report.pdf`, `report(1).pdf`,
//! `report(2).pdf`, ... The listing is only a hint; the caller still creates
//! the file exclusively and resolves again if it loses a race.

use std::collections::HashSet;

use crate::utils::validation::MAX_FILENAME_BYTES;

/// Splits a name at its last `.` into `(stem, extension)`, where the
/// extension keeps its leading dot. Names without a dot have an empty extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// `stem(counter).ext`, with the stem shortened on a char boundary when the
/// result would exceed [`MAX_FILENAME_BYTES`].
pub fn candidate(name: &str, counter: u64) -> String {
    let (stem, ext) = split_name(name);
    let suffix = format!("({})", counter);

    let budget = MAX_FILENAME_BYTES.saturating_sub(suffix.len() + ext.len());
    let mut end = stem.len().min(budget);
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}{}", &stem[..end], suffix, ext)
}

/// Returns `desired` if it is free, otherwise the first free `stem(n).ext`.
pub fn resolve(desired: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(desired) {
        return desired.to_string();
    }

    // At most `taken.len()` candidates can be occupied, so this terminates.
    (1u64..)
        .map(|n| candidate(desired, n))
        .find(|c| !taken.contains(c))
        .unwrap_or_else(|| desired.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_free_name_is_unchanged() {
        assert_eq!(resolve("report.pdf", &set(&["other.pdf"])), "report.pdf");
    }

    #[test]
    fn test_first_collision_gets_counter() {
        assert_eq!(resolve("report.pdf", &set(&["report.pdf"])), "report(1).pdf");
    }

    #[test]
    fn test_skips_taken_counters() {
        let taken = set(&["a.txt", "a(1).txt", "a(2).txt", "a(4).txt"]);
        assert_eq!(resolve("a.txt", &taken), "a(3).txt");
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(resolve("Makefile", &set(&["Makefile"])), "Makefile(1)");
    }

    #[test]
    fn test_last_dot_splits() {
        assert_eq!(
            resolve("backup.tar.gz", &set(&["backup.tar.gz"])),
            "backup.tar(1).gz"
        );
    }

    #[test]
    fn test_empty_stem_is_preserved() {
        assert_eq!(resolve(".bashrc", &set(&[".bashrc"])), "(1).bashrc");
    }

    #[test]
    fn test_spaces_and_parentheses() {
        let taken = set(&["my photo (old).jpg"]);
        assert_eq!(resolve("my photo (old).jpg", &taken), "my photo (old)(1).jpg");
    }

    #[test]
    fn test_repeated_resolution_is_pairwise_distinct() {
        let mut taken = HashSet::new();
        let mut produced = Vec::new();
        for _ in 0..5 {
            let name = resolve("data.csv", &taken);
            assert!(!taken.contains(&name));
            taken.insert(name.clone());
            produced.push(name);
        }
        assert_eq!(
            produced,
            vec!["data.csv", "data(1).csv", "data(2).csv", "data(3).csv", "data(4).csv"]
        );
    }

    #[test]
    fn test_counter_fits_longest_name() {
        let longest = format!("{}.txt", "n".repeat(251));
        let resolved = resolve(&longest, &set(&[longest.as_str()]));
        assert_eq!(resolved, format!("{}(1).txt", "n".repeat(248)));
        assert_eq!(resolved.len(), MAX_FILENAME_BYTES);

        let taken = set(&[longest.as_str(), resolved.as_str()]);
        assert_eq!(resolve(&longest, &taken), format!("{}(2).txt", "n".repeat(248)));
    }

    #[test]
    fn test_shortened_stem_keeps_whole_chars() {
        let name = format!("{}.txt", "é".repeat(125));
        let resolved = candidate(&name, 10);
        assert_eq!(resolved, format!("{}(10).txt", "é".repeat(123)));
        assert!(resolved.len() <= MAX_FILENAME_BYTES);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a.b.c"), ("a.b", ".c"));
        assert_eq!(split_name("plain"), ("plain", ""));
        assert_eq!(split_name(".env"), ("", ".env"));
        assert_eq!(split_name("trailing."), ("trailing", "."));
    }
}
