//! Resolve the fixed curriculum topic labels to the labels a dataset export
//! actually uses.
//!
//! Resolution for each canonical label, in order:
//!
//! 1. a dataset label equal to it after case and accent folding;
//! 2. otherwise the first dataset label whose first four folded characters
//!    match ("Óxidos" finds "OXIDOS (binarios)");
//! 3. otherwise the label itself.
//!
//! Step 1 means this is not a pure first-match rule: with "Hidróxidos" listed
//! before "Hidruros", the canonical "Hidruros" still resolves to "Hidruros"
//! although "Hidróxidos" is the first prefix match. The same holds for
//! "Sales Dobles" and "Sales Ácidas".

use serde::{Deserialize, Serialize};

use crate::drill_engine::normalizer::fold_for_name_comparison;

/// The nine topic labels offered on the configuration screen, in display order.
pub const CANONICAL_TOPICS: [&str; 9] = [
    "Óxidos",
    "Hidruros",
    "Hidróxidos",
    "Compuestos Binarios",
    "Sales Dobles",
    "Oxoácidos",
    "Oxosales",
    "Sales Ácidas",
    "Oxosales Ácidas",
];

const PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMap {
    /// (canonical label, dataset label) in canonical order.
    entries: Vec<(String, String)>,
}

fn prefix_key(label: &str) -> String {
    fold_for_name_comparison(label).chars().take(PREFIX_LEN).collect()
}

/// Build the canonical → dataset mapping.
pub fn build_topic_map<C, D>(canonical: &[C], dataset_labels: &[D]) -> TopicMap
where
    C: AsRef<str>,
    D: AsRef<str>,
{
    let entries = canonical
        .iter()
        .map(|c| {
            let c = c.as_ref();
            let folded = fold_for_name_comparison(c);
            let key = prefix_key(c);
            let resolved = dataset_labels
                .iter()
                .map(AsRef::as_ref)
                .find(|d| fold_for_name_comparison(d) == folded)
                .or_else(|| {
                    dataset_labels
                        .iter()
                        .map(AsRef::as_ref)
                        .find(|d| prefix_key(d) == key)
                })
                .unwrap_or(c);
            (c.to_string(), resolved.to_string())
        })
        .collect();
    TopicMap { entries }
}

impl TopicMap {
    /// Dataset label for a canonical label. Labels outside the vocabulary map
    /// to themselves.
    pub fn resolve<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(c, _)| c == canonical)
            .map(|(_, d)| d.as_str())
            .unwrap_or(canonical)
    }

    /// Translate a whole selection, dropping duplicates.
    pub fn resolve_all<S: AsRef<str>>(&self, canonical: &[S]) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(canonical.len());
        for c in canonical {
            let d = self.resolve(c.as_ref()).to_string();
            if !out.contains(&d) {
                out.push(d);
            }
        }
        out
    }

    pub fn contains_canonical(&self, label: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == label)
    }

    pub fn canonical_labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accented_label_matches_upper_case_export() {
        let map = build_topic_map(&["Óxidos"], &["OXIDOS (binarios)", "Hidruros"]);
        assert_eq!(map.resolve("Óxidos"), "OXIDOS (binarios)");
    }

    #[test]
    fn unmatched_label_maps_to_itself() {
        let map = build_topic_map(&CANONICAL_TOPICS, &["Óxidos"]);
        assert_eq!(map.resolve("Sales Dobles"), "Sales Dobles");
        assert_eq!(map.resolve("Óxidos"), "Óxidos");
    }

    #[test]
    fn first_matching_dataset_label_wins() {
        let map = build_topic_map(&["Oxosales Ácidas"], &["Oxosales", "OXOSALES (ácidas)"]);
        assert_eq!(map.resolve("Oxosales Ácidas"), "Oxosales");
    }

    #[test]
    fn exact_label_beats_earlier_prefix_match() {
        let dataset = ["Hidróxidos", "Hidruros", "Sales Ácidas", "Sales Dobles"];
        let map = build_topic_map(&CANONICAL_TOPICS, &dataset);
        assert_eq!(map.resolve("Hidruros"), "Hidruros");
        assert_eq!(map.resolve("Hidróxidos"), "Hidróxidos");
        assert_eq!(map.resolve("Sales Dobles"), "Sales Dobles");
        assert_eq!(map.resolve("Sales Ácidas"), "Sales Ácidas");
    }

    #[test]
    fn short_labels_compare_whole() {
        let map = build_topic_map(&["Sal"], &["Salt", "SAL"]);
        assert_eq!(map.resolve("Sal"), "SAL");
    }

    #[test]
    fn resolve_all_drops_duplicates() {
        let map = build_topic_map(&["Hidruros", "Hidróxidos"], &["Hidruros"]);
        assert_eq!(map.resolve_all(&["Hidruros", "Hidróxidos"]), vec!["Hidruros".to_string()]);
    }

    #[test]
    fn unknown_canonical_label_resolves_to_itself() {
        let map = build_topic_map(&CANONICAL_TOPICS, &["Óxidos"]);
        assert!(!map.contains_canonical("Peróxidos"));
        assert_eq!(map.resolve("Peróxidos"), "Peróxidos");
    }
}
