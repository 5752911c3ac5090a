//! Heading normalization
//!
//! Maps free-text section headings to canonical snake_case keys, so that
//! "Zdravotní přínosy", "zdravotni přínosy" and "ZDRAVOTNÍ PŘÍNOSY" all land
//! on `zdravotni_prinosy`.

use std::collections::HashMap;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Known heading variants of the source site, keyed by their cleaned form
const SYNONYMS: &[(&str, &str)] = &[
    ("zdravotni prinosy", "zdravotni_prinosy"),
    ("prinosy pro zdravi", "zdravotni_prinosy"),
    ("ucinky na zdravi", "zdravotni_prinosy"),
    ("lecive ucinky", "zdravotni_prinosy"),
    ("skladovani", "skladovani"),
    ("uchovavani", "skladovani"),
    ("kde a kdy sbirat", "kde_kdy_sbirat"),
    ("kde kdy sbirat", "kde_kdy_sbirat"),
    ("kdy a kde sbirat", "kde_kdy_sbirat"),
    ("sber", "kde_kdy_sbirat"),
    ("pouziti v kuchyni", "pouziti_v_kuchyni"),
    ("vyuziti v kuchyni", "pouziti_v_kuchyni"),
    ("kulinarske pouziti", "pouziti_v_kuchyni"),
    ("pouziti", "pouziti_v_kuchyni"),
    ("masti", "masti"),
];

/// Lower-cases, strips diacritics and collapses whitespace
///
/// This is the form synonym lookups are made in.
pub fn clean_heading(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces every run of non-alphanumeric ASCII with one underscore
fn transliterate(cleaned: &str) -> String {
    let mut key = String::with_capacity(cleaned.len());
    let mut pending_separator = false;
    for c in cleaned.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(c);
        } else {
            pending_separator = true;
        }
    }
    key
}

/// Synonym-table backed heading normalizer
#[derive(Debug, Clone)]
pub struct HeadingNormalizer {
    table: HashMap<String, String>,
}

impl HeadingNormalizer {
    /// Creates a normalizer with the built-in synonym table
    pub fn new() -> Self {
        let table = SYNONYMS
            .iter()
            .map(|(heading, key)| (heading.to_string(), key.to_string()))
            .collect();
        Self { table }
    }

    /// Adds synonym entries; headings are cleaned before insertion and
    /// override built-in entries with the same cleaned form
    pub fn with_synonyms<I, K, V>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (heading, key) in synonyms {
            let cleaned = clean_heading(heading.as_ref());
            if !cleaned.is_empty() {
                self.table.insert(cleaned, key.into());
            }
        }
        self
    }

    /// Maps a heading to its canonical key
    ///
    /// Total and deterministic: unknown headings fall back to an ASCII
    /// snake_case transliteration, and empty input gives an empty key.
    pub fn normalize(&self, heading: &str) -> String {
        let cleaned = clean_heading(heading);
        if cleaned.is_empty() {
            return String::new();
        }
        match self.table.get(&cleaned) {
            Some(key) => key.clone(),
            None => transliterate(&cleaned),
        }
    }

    /// Number of synonym entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for HeadingNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes a heading with the built-in synonym table
///
/// # Examples
///
/// ```
/// use herbar::normalize_heading;
///
/// assert_eq!(normalize_heading("ZDRAVOTNÍ PŘÍNOSY"), "zdravotni_prinosy");
/// assert_eq!(normalize_heading("Pěstování a péče"), "pestovani_a_pece");
/// assert_eq!(normalize_heading(""), "");
/// ```
pub fn normalize_heading(heading: &str) -> String {
    static DEFAULT: OnceLock<HeadingNormalizer> = OnceLock::new();
    DEFAULT.get_or_init(HeadingNormalizer::new).normalize(heading)
}
