//! Per-track output levels with solo/mute helpers.

use serde::{Deserialize, Serialize};

/// Ordered track name → dry level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    levels: Vec<(String, f64)>,
}

impl Levels {
    /// Every named track at full level.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            levels: names
                .iter()
                .map(|name| (name.as_ref().to_string(), 1.0))
                .collect(),
        }
    }

    /// Level for a track; unknown tracks play at full level.
    pub fn get(&self, name: &str) -> f64 {
        self.levels
            .iter()
            .find(|(n, _)| n == name)
            .map_or(1.0, |(_, level)| *level)
    }

    pub fn set(&mut self, name: &str, level: f64) -> &mut Self {
        match self.levels.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = level,
            None => self.levels.push((name.to_string(), level)),
        }
        self
    }

    /// Only `key` audible.
    pub fn solo(&mut self, key: &str) -> &mut Self {
        for (name, level) in self.levels.iter_mut() {
            *level = if name == key { 1.0 } else { 0.0 };
        }
        self
    }

    /// Everything but `key` audible.
    pub fn mute(&mut self, key: &str) -> &mut Self {
        for (name, level) in self.levels.iter_mut() {
            *level = if name == key { 0.0 } else { 1.0 };
        }
        self
    }

    /// Exactly one track audible.
    pub fn is_solo(&self) -> bool {
        self.levels.iter().filter(|(_, level)| *level > 0.0).count() == 1
    }

    /// First three characters of the soloed track.
    pub fn solo_key(&self) -> Option<String> {
        if !self.is_solo() {
            return None;
        }
        self.levels
            .iter()
            .find(|(_, level)| *level > 0.0)
            .map(|(name, _)| name.chars().take(3).collect())
    }

    /// File-name suffix: the solo key, or `all`.
    pub fn short_code(&self) -> String {
        self.solo_key().unwrap_or_else(|| "all".to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.levels.iter().map(|(name, level)| (name.as_str(), *level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Levels {
        Levels::new(&["kick", "snare", "hat"])
    }

    #[test]
    fn test_default_full_level() {
        let levels = levels();
        assert_eq!(levels.get("snare"), 1.0);
        assert_eq!(levels.get("unknown"), 1.0);
        assert!(!levels.is_solo());
        assert_eq!(levels.short_code(), "all");
    }

    #[test]
    fn test_solo() {
        let mut levels = levels();
        levels.solo("snare");
        assert_eq!(levels.get("kick"), 0.0);
        assert!(levels.is_solo());
        assert_eq!(levels.solo_key().as_deref(), Some("sna"));
        assert_eq!(levels.short_code(), "sna");
    }

    #[test]
    fn test_mute() {
        let mut levels = levels();
        levels.mute("hat");
        assert_eq!(levels.get("hat"), 0.0);
        assert_eq!(levels.get("kick"), 1.0);
        assert!(!levels.is_solo());
    }

    #[test]
    fn test_order_preserved() {
        let mut levels = levels();
        levels.set("bass", 0.5);
        let names: Vec<&str> = levels.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["kick", "snare", "hat", "bass"]);
    }
}
