// src/normalize.rs
//! Raw scraped rows → canonical, keyed, deduplicated tournament records.
//! Pure: no I/O, no clock.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::record::{ClubDateTimeName, IdentityKey, KeyStrategy, RawRecord, TournamentRecord};

const CLUB: &[&str] = &["club"];
const DATE: &[&str] = &["date"];
const TIME: &[&str] = &["heure", "time"];
const NAME: &[&str] = &["nom", "name"];
const TIER: &[&str] = &["tier", "niveau", "level"];
const DETAILS: &[&str] = &["details", "format_ouverture", "caracteristiques"];
const URL: &[&str] = &["url", "link"];

/// Decode entities, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// `17h00` → `17:00`. Anything else is returned as-is; hours are not padded
/// so keys recorded before this normalization still match.
pub fn normalize_time(s: &str) -> String {
    static RE_H: OnceCell<Regex> = OnceCell::new();
    let re = RE_H.get_or_init(|| Regex::new(r"^(\d{1,2})\s*[hH]\s*(\d{2})$").expect("time regex"));
    match re.captures(s) {
        Some(c) => format!("{}:{}", &c[1], &c[2]),
        None => s.to_string(),
    }
}

/// Optional tier allow-list; empty means every tier passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierFilter {
    allowed: BTreeSet<String>,
}

impl TierFilter {
    pub fn new<I, S>(tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = tiers
            .into_iter()
            .map(|t| t.as_ref().trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn allows(&self, tier: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&tier.trim().to_ascii_uppercase())
    }

    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

/// Output of one normalization pass plus what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub records: Vec<TournamentRecord>,
    /// Missing club, date, heure or nom.
    pub skipped_malformed: usize,
    pub filtered_tier: usize,
    pub duplicates: usize,
}

pub struct Normalizer {
    tiers: TierFilter,
    keys: Box<dyn KeyStrategy>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(TierFilter::allow_all(), Box::new(ClubDateTimeName))
    }
}

impl Normalizer {
    pub fn new(tiers: TierFilter, keys: Box<dyn KeyStrategy>) -> Self {
        Self { tiers, keys }
    }

    pub fn tiers(&self) -> &TierFilter {
        &self.tiers
    }

    pub fn key_strategy(&self) -> &dyn KeyStrategy {
        self.keys.as_ref()
    }

    /// Canonicalize one row; `None` when a key-forming field is empty.
    pub fn canonicalize(&self, raw: &RawRecord) -> Option<TournamentRecord> {
        let get = |names: &[&str]| raw.field(names).map(normalize_text).unwrap_or_default();
        let optional = |names: &[&str]| raw.field(names).map(normalize_text).filter(|s| !s.is_empty());

        let club = get(CLUB);
        let date = get(DATE);
        let heure = normalize_time(&get(TIME));
        let nom = get(NAME);
        if club.is_empty() || date.is_empty() || heure.is_empty() || nom.is_empty() {
            return None;
        }

        let mut record = TournamentRecord {
            key: IdentityKey::new(Vec::<String>::new()),
            tier: get(TIER).to_ascii_uppercase(),
            club,
            nom,
            date,
            heure,
            details: optional(DETAILS),
            url: optional(URL),
        };
        record.key = self.keys.derive(&record);
        Some(record)
    }

    /// Validate, tier-filter, dedup by key (first wins), then sort by start
    /// time, club and name. Rows whose date/time do not parse sort first.
    pub fn normalize(&self, raw: Vec<RawRecord>) -> Normalized {
        let mut out = Normalized::default();
        let mut seen = HashSet::with_capacity(raw.len());

        for row in &raw {
            let Some(record) = self.canonicalize(row) else {
                out.skipped_malformed += 1;
                continue;
            };
            if !self.tiers.allows(&record.tier) {
                out.filtered_tier += 1;
                continue;
            }
            if !seen.insert(record.key.clone()) {
                out.duplicates += 1;
                continue;
            }
            out.records.push(record);
        }

        out.records.sort_by(|a, b| {
            (a.starts_at(), &a.club, &a.nom).cmp(&(b.starts_at(), &b.club, &b.nom))
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tier: &str, club: &str, nom: &str, date: &str, heure: &str) -> RawRecord {
        RawRecord::new()
            .with("niveau", tier)
            .with("club", club)
            .with("nom", nom)
            .with("date", date)
            .with("heure", heure)
    }

    #[test]
    fn normalize_text_collapses_ws_and_entities() {
        assert_eq!(normalize_text("  4PADEL&nbsp;  Marville \n"), "4PADEL Marville");
    }

    #[test]
    fn time_with_h_becomes_colon() {
        assert_eq!(normalize_time("17h00"), "17:00");
        assert_eq!(normalize_time("9h30"), "9:30");
        assert_eq!(normalize_time("20:15"), "20:15");
    }

    #[test]
    fn tier_filter_is_case_insensitive() {
        let f = TierFilter::new(["p100", " P250 "]);
        assert!(f.allows("P100"));
        assert!(f.allows("p250"));
        assert!(!f.allows("P500"));
        assert!(TierFilter::allow_all().allows("anything"));
    }

    #[test]
    fn drops_malformed_filters_and_dedups() {
        let n = Normalizer::new(TierFilter::new(["P100", "P250"]), Box::new(ClubDateTimeName));
        let raw = vec![
            row("P100", "Club A", "Soirée", "10/01/2026", "19h00"),
            row("P100", "Club A", "Soirée", "10/01/2026", "19:00"),
            row("P500", "Club B", "Open", "11/01/2026", "10:00"),
            row("P250", "", "Open", "11/01/2026", "10:00"),
        ];
        let out = n.normalize(raw);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.duplicates, 1);
        assert_eq!(out.filtered_tier, 1);
        assert_eq!(out.skipped_malformed, 1);
        assert_eq!(out.records[0].heure, "19:00");
    }

    #[test]
    fn sorted_chronologically_with_unparsed_first() {
        let n = Normalizer::default();
        let raw = vec![
            row("P100", "B", "Late", "02/02/2026", "20:00"),
            row("P100", "A", "Early", "01/02/2026", "09:00"),
            row("P100", "C", "Odd", "bientôt", "?"),
        ];
        let names: Vec<_> = n.normalize(raw).records.into_iter().map(|r| r.nom).collect();
        assert_eq!(names, vec!["Odd", "Early", "Late"]);
    }
}
