// src/record.rs
//! Tournament records, raw scraped rows and the identity key used to decide
//! whether two scrapes saw the same tournament.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One scraped row before validation. Column names are whatever the source
/// produced; lookups go through [`RawRecord::field`] with aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    pub fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by fixtures and tests.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    /// First non-empty value among `names` (case-insensitive column match).
    pub fn field(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|wanted| {
            self.fields
                .iter()
                .find(|(k, v)| k.trim().eq_ignore_ascii_case(wanted) && !v.trim().is_empty())
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Derived identity of a tournament. Serialized as a plain JSON array of
/// strings, which is also how the earlier tool stored its seen-keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(Vec<String>);

impl IdentityKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|p| p.trim().is_empty())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" | "))
    }
}

/// A validated, canonical tournament entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub key: IdentityKey,
    #[serde(default)]
    pub tier: String,
    pub club: String,
    pub nom: String,
    pub date: String,
    pub heure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TournamentRecord {
    /// Rebuild a display record from a legacy `[club, date, heure, nom]` key.
    pub fn from_legacy_key(parts: Vec<String>) -> Option<Self> {
        let [club, date, heure, nom]: [String; 4] = parts.try_into().ok()?;
        Some(Self {
            key: IdentityKey::new([club.clone(), date.clone(), heure.clone(), nom.clone()]),
            tier: String::new(),
            club,
            nom,
            date,
            heure,
            details: None,
            url: None,
        })
    }

    /// Date + time when both parse (`dd/mm/yyyy`, `HH:MM`).
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%d/%m/%Y").ok()?;
        let time = NaiveTime::parse_from_str(&self.heure, "%H:%M").ok()?;
        Some(date.and_time(time))
    }

    /// Evening slot: starts at 18h or later, or the name says "soir"/"soirée".
    pub fn is_evening(&self) -> bool {
        static RE_HOUR: OnceCell<Regex> = OnceCell::new();
        let re = RE_HOUR.get_or_init(|| Regex::new(r"\b(\d{1,2})\b").expect("hour regex"));
        let late = re
            .captures(&self.heure)
            .and_then(|c| c[1].parse::<u32>().ok())
            .is_some_and(|h| h >= 18);
        late || self.nom.to_lowercase().contains("soir")
    }

    /// One-line summary used by every notification channel.
    pub fn headline(&self) -> String {
        format!(
            "{} {} — {} le {} à {}",
            self.tier, self.nom, self.club, self.date, self.heure
        )
        .trim_start()
        .to_string()
    }
}

impl fmt::Display for TournamentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline())
    }
}

/// Derives an [`IdentityKey`] from a canonical record. Swapping the strategy
/// does not touch the delta engine, which only compares keys.
pub trait KeyStrategy: Send + Sync {
    fn derive(&self, record: &TournamentRecord) -> IdentityKey;
    fn name(&self) -> &'static str;
}

/// `(club, date, heure, nom)`. An edit to any of these on the site yields a
/// new key and therefore a "new" tournament.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClubDateTimeName;

impl KeyStrategy for ClubDateTimeName {
    fn derive(&self, r: &TournamentRecord) -> IdentityKey {
        IdentityKey::new([
            r.club.as_str(),
            r.date.as_str(),
            r.heure.as_str(),
            r.nom.as_str(),
        ])
    }

    fn name(&self) -> &'static str {
        "club_date_time_name"
    }
}

/// Source URL when the scraper provides one, otherwise the 4-tuple.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceUrl;

impl KeyStrategy for SourceUrl {
    fn derive(&self, r: &TournamentRecord) -> IdentityKey {
        match r.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => IdentityKey::new(["url", url]),
            _ => ClubDateTimeName.derive(r),
        }
    }

    fn name(&self) -> &'static str {
        "source_url"
    }
}

/// Resolve a strategy by its config name.
pub fn key_strategy_by_name(name: &str) -> Option<Box<dyn KeyStrategy>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "club_date_time_name" | "tuple" | "" => Some(Box::new(ClubDateTimeName)),
        "source_url" | "url" => Some(Box::new(SourceUrl)),
        _ => None,
    }
}
