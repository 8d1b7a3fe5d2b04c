use std::env;
use std::path::PathBuf;

use log::warn;

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_YIELD_EVERY, MAX_DIFFICULTY, MAX_YIELD_EVERY};

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    pub store_path: PathBuf,
    pub yield_every: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            difficulty: DEFAULT_DIFFICULTY,
            store_path: PathBuf::from("blockchain_data.json"),
            yield_every: DEFAULT_YIELD_EVERY,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let difficulty = match lookup("DIFFICULTY").map(|v| v.parse::<u32>()) {
            None => defaults.difficulty,
            Some(Ok(d)) if (1..=MAX_DIFFICULTY).contains(&d) => d,
            Some(_) => {
                warn!(
                    "DIFFICULTY must be 1..={MAX_DIFFICULTY}, using {}",
                    defaults.difficulty
                );
                defaults.difficulty
            }
        };

        let store_path = lookup("CHAIN_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let yield_every = lookup("MINING_YIELD_EVERY")
            .and_then(|v| v.parse::<u64>().ok())
            .map(|n| n.clamp(1, MAX_YIELD_EVERY))
            .unwrap_or(defaults.yield_every);

        Self {
            host,
            port,
            difficulty,
            store_path,
            yield_every,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(cfg(&[]), Config::default());
    }

    #[test]
    fn reads_all_keys() {
        let c = cfg(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("DIFFICULTY", "2"),
            ("CHAIN_STORE_PATH", "/tmp/c.json"),
            ("MINING_YIELD_EVERY", "250"),
        ]);
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.port, 9000);
        assert_eq!(c.difficulty, 2);
        assert_eq!(c.store_path, PathBuf::from("/tmp/c.json"));
        assert_eq!(c.yield_every, 250);
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let c = cfg(&[
            ("DIFFICULTY", "0"),
            ("PORT", "abc"),
            ("MINING_YIELD_EVERY", "1000000"),
        ]);
        assert_eq!(c.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(c.port, 8080);
        assert_eq!(c.yield_every, MAX_YIELD_EVERY);
        assert_eq!(cfg(&[("DIFFICULTY", "65")]).difficulty, DEFAULT_DIFFICULTY);
    }
}
