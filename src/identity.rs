//! Commit Identity
//!
//! Human-readable, timestamp-ordered identifiers for history entries.
//! The canonical string form `<timestamp>-<slug>` doubles as the storage
//! file stem, and sorts chronologically because the timestamp prefix is
//! fixed width.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Result, VaultError};

/// Fixed-width timestamp format used in commit names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%6f";

/// Second-precision format accepted when reading older stores.
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Number of hyphen-joined tokens that make up a slug.
const SLUG_TOKENS: usize = 2;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "brisk", "calm", "clever", "cosmic", "crisp", "dusty", "eager",
    "early", "fancy", "fuzzy", "gentle", "giddy", "golden", "hazy", "humble", "icy", "jolly",
    "keen", "lazy", "little", "lively", "lucky", "mellow", "misty", "noble", "odd", "proud",
    "quick", "quiet", "rapid", "rusty", "shy", "silent", "sleepy", "snappy", "steady", "stormy",
    "sunny", "swift", "tidy", "urban", "vivid", "wild", "witty", "young",
];

const ANIMALS: &[&str] = &[
    "badger", "beaver", "bison", "camel", "condor", "coyote", "crane", "eel", "falcon", "ferret",
    "finch", "gecko", "gibbon", "heron", "ibis", "jackal", "koala", "lemur", "lynx", "magpie",
    "marmot", "mole", "moose", "newt", "ocelot", "okapi", "osprey", "otter", "panda", "parrot",
    "pelican", "puffin", "quail", "raven", "salmon", "seal", "shrew", "sloth", "stoat", "swan",
    "tapir", "toad", "trout", "turtle", "vole", "walrus", "wombat", "yak",
];

/// Opaque label for a commit: a random slug plus its creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId {
    /// Word-like token, e.g. `quick-otter`.
    pub slug: String,

    /// Creation time, microsecond precision.
    pub timestamp: DateTime<Utc>,
}

impl CommitId {
    /// Create a commit id from its parts.
    pub fn new(slug: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            slug: slug.into(),
            timestamp,
        }
    }

    /// Generate a fresh id stamped with the current time.
    pub fn generate() -> Self {
        Self::new(random_slug(&mut rand::thread_rng()), now())
    }

    /// Generate a fresh id whose timestamp sorts strictly after `previous`.
    ///
    /// Two commits created within the same microsecond would otherwise sort
    /// by slug rather than by creation order once persisted.
    pub fn generate_after(previous: Option<&CommitId>) -> Self {
        let mut timestamp = now();
        if let Some(previous) = previous {
            if timestamp <= previous.timestamp {
                timestamp = previous.timestamp + Duration::microseconds(1);
            }
        }
        Self::new(random_slug(&mut rand::thread_rng()), timestamp)
    }

    /// Reconstruct an id from a persisted file name such as
    /// `2024-11-10-12-30-00-000000-quick-otter.json`.
    ///
    /// The last two hyphen-joined tokens form the slug, the remainder the
    /// timestamp.
    pub fn parse_from_storage_name(name: &str) -> Result<Self> {
        let invalid = || VaultError::InvalidCommitName {
            name: name.to_string(),
        };

        let stem = name.split('.').next().unwrap_or_default();
        let tokens: Vec<&str> = stem.split('-').collect();
        if tokens.len() <= SLUG_TOKENS || tokens.iter().any(|t| t.is_empty()) {
            return Err(invalid());
        }

        let split = tokens.len() - SLUG_TOKENS;
        let slug = tokens[split..].join("-");
        let raw_timestamp = tokens[..split].join("-");

        let naive = NaiveDateTime::parse_from_str(&raw_timestamp, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw_timestamp, LEGACY_TIMESTAMP_FORMAT))
            .map_err(|_| invalid())?;

        Ok(Self::new(slug, Utc.from_utc_datetime(&naive)))
    }

    /// File name this commit is stored under.
    pub fn storage_name(&self) -> String {
        format!("{}.json", self)
    }

    /// Compact display name derived from the slug, e.g. `qck-ott`.
    pub fn short_name(&self) -> String {
        self.slug
            .split('-')
            .map(abbreviate)
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.slug
        )
    }
}

/// Draw an `adjective-animal` slug.
pub fn random_slug<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("plain");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("cat");
    format!("{}-{}", adjective, animal)
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Keep the first character, drop vowels from the rest, take three.
fn abbreviate(segment: &str) -> String {
    const WIDTH: usize = 3;

    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut clean = String::from(first);
    clean.extend(chars.filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')));

    if clean.chars().count() >= WIDTH {
        clean.chars().take(WIDTH).collect()
    } else {
        segment.chars().take(WIDTH).collect()
    }
}
