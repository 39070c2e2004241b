//! Environment value resolution for spec env entries.
//!
//! `$NAME` and `${NAME}` expand to the value of `NAME` (empty when unset).
//! A leading `$$` escapes to a literal `$`. Other values pass through.

use std::collections::HashMap;

/// Looks up ambient environment variables.
pub trait EnvResolver {
    /// Value of `name`, if set.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Resolve a raw env value string.
    fn resolve(&self, raw: &str) -> String {
        if let Some(escaped) = raw.strip_prefix("$$") {
            return format!("${escaped}");
        }

        let rest = match raw.strip_prefix('$') {
            Some(rest) => rest,
            None => return raw.to_string(),
        };
        let name = match rest.strip_prefix('{') {
            Some(braced) => match braced.strip_suffix('}') {
                Some(name) => name,
                None => return raw.to_string(),
            },
            None => rest,
        };

        if name.is_empty() {
            return raw.to_string();
        }

        self.lookup(name).unwrap_or_default()
    }
}

/// Resolver backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvResolver for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Resolver backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for MapEnv {
    fn from(pairs: [(K, V); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl EnvResolver for MapEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> MapEnv {
        MapEnv::from([("HOME", "/home/eru"), ("EMPTY", "")])
    }

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(env().resolve("production"), "production");
        assert_eq!(env().resolve(""), "");
        assert_eq!(env().resolve("a$HOME"), "a$HOME");
    }

    #[test]
    fn test_dollar_reference() {
        assert_eq!(env().resolve("$HOME"), "/home/eru");
    }

    #[test]
    fn test_braced_reference() {
        assert_eq!(env().resolve("${HOME}"), "/home/eru");
    }

    #[test]
    fn test_unset_reference_is_empty() {
        assert_eq!(env().resolve("$MISSING"), "");
        assert_eq!(env().resolve("$EMPTY"), "");
    }

    #[test]
    fn test_escaped_dollar() {
        assert_eq!(env().resolve("$$HOME"), "$HOME");
    }

    #[test]
    fn test_lone_dollar() {
        assert_eq!(env().resolve("$"), "$");
        assert_eq!(env().resolve("${}"), "${}");
        assert_eq!(env().resolve("${HOME"), "${HOME");
    }

    #[test]
    fn test_process_env() {
        std::env::set_var("ERU_IMAGE_ENV_TEST", "from-process");
        assert_eq!(ProcessEnv.resolve("$ERU_IMAGE_ENV_TEST"), "from-process");
    }
}
