// Environment variable loading

use crate::Result;
use std::collections::HashMap;
use std::env;

/// Prefix of the variables `MailSettings` reads.
pub const DEFAULT_PREFIX: &str = "MAILIT";

/// Environment variable loader.
///
/// With a prefix, only `PREFIX_*` variables are picked up and the prefix is
/// stripped, so `MAILIT_API_KEY` becomes `api_key`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables, keys lowercased.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.collect(env::vars()))
    }

    fn collect(&self, vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match self.prefix {
                Some(ref prefix) => {
                    if let Some(rest) = key
                        .strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('_'))
                        && !rest.is_empty()
                    {
                        config.insert(rest.to_lowercase(), value);
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Iterator<Item = (String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_prefix_is_stripped_and_lowercased() {
        let loader = EnvLoader::new(Some(DEFAULT_PREFIX.to_string()));
        let config = loader.collect(vars(&[
            ("MAILIT_API_KEY", "secret"),
            ("MAILIT_SITE_DOMAIN", "example.org"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(config.get("api_key").map(String::as_str), Some("secret"));
        assert_eq!(
            config.get("site_domain").map(String::as_str),
            Some("example.org")
        );
        assert!(!config.contains_key("path"));
    }

    #[test]
    fn test_prefix_requires_separator() {
        let loader = EnvLoader::new(Some(DEFAULT_PREFIX.to_string()));
        let config = loader.collect(vars(&[("MAILITX_KEY", "nope"), ("MAILIT_", "empty")]));

        assert!(config.is_empty());
    }

    #[test]
    fn test_no_prefix_keeps_everything() {
        let loader = EnvLoader::default();
        let config = loader.collect(vars(&[("HOME", "/root"), ("MAILIT_API_KEY", "k")]));

        assert_eq!(config.len(), 2);
        assert!(config.contains_key("mailit_api_key"));
    }
}
