//! Environment variable snapshot.
//!
//! Recognized variables: `RABBITMQ_URL`, `AUDIT_DIR`, `STATE_FILE`,
//! `LOG_LEVEL`, `HEADLESS`, `BROWSER_TIMEOUT`.

use camino::Utf8PathBuf;
use matchscraper_utils::error::ConfigError;

/// Parsed environment layer. Captured once at startup so resolution stays
/// deterministic and testable.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub rabbitmq_url: Option<String>,
    pub audit_dir: Option<Utf8PathBuf>,
    pub state_file: Option<Utf8PathBuf>,
    pub log_level: Option<String>,
    pub headless: Option<bool>,
    pub browser_timeout_ms: Option<u64>,
}

impl EnvConfig {
    /// Snapshot the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from a lookup function. Tests supply a closure over a map so
    /// nothing touches process-global state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let headless = match lookup("HEADLESS") {
            Some(raw) => Some(parse_bool("HEADLESS", &raw)?),
            None => None,
        };
        let browser_timeout_ms = match lookup("BROWSER_TIMEOUT") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidEnv {
                    var: "BROWSER_TIMEOUT".to_string(),
                    value: raw,
                }
            })?),
            None => None,
        };
        Ok(Self {
            rabbitmq_url: lookup("RABBITMQ_URL").filter(|v| !v.trim().is_empty()),
            audit_dir: lookup("AUDIT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(Utf8PathBuf::from),
            state_file: lookup("STATE_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(Utf8PathBuf::from),
            log_level: lookup("LOG_LEVEL").filter(|v| !v.trim().is_empty()),
            headless,
            browser_timeout_ms,
        })
    }
}

/// Parse a boolean environment value. Accepts `1/true/yes/on` and
/// `0/false/no/off`, case-insensitively.
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |var| map.get(var).map(|v| (*v).to_string())
    }

    #[test]
    fn empty_environment_yields_all_none() {
        let env = EnvConfig::from_lookup(|_| None).unwrap();
        assert!(env.rabbitmq_url.is_none());
        assert!(env.headless.is_none());
        assert!(env.browser_timeout_ms.is_none());
    }

    #[test]
    fn boolean_forms_are_accepted() {
        for (raw, expected) in [
            ("1", true),
            ("true", true),
            ("YES", true),
            ("On", true),
            ("0", false),
            ("false", false),
            ("No", false),
            ("OFF", false),
        ] {
            let map = HashMap::from([("HEADLESS", raw)]);
            let env = EnvConfig::from_lookup(lookup_from(&map)).unwrap();
            assert_eq!(env.headless, Some(expected), "for {raw:?}");
        }
    }

    #[test]
    fn garbage_boolean_is_an_error() {
        let map = HashMap::from([("HEADLESS", "maybe")]);
        let err = EnvConfig::from_lookup(lookup_from(&map)).unwrap_err();
        assert!(err.to_string().contains("HEADLESS"));
    }

    #[test]
    fn browser_timeout_parses_as_millis() {
        let map = HashMap::from([("BROWSER_TIMEOUT", "45000")]);
        let env = EnvConfig::from_lookup(lookup_from(&map)).unwrap();
        assert_eq!(env.browser_timeout_ms, Some(45000));

        let map = HashMap::from([("BROWSER_TIMEOUT", "soon")]);
        assert!(EnvConfig::from_lookup(lookup_from(&map)).is_err());
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let map = HashMap::from([("RABBITMQ_URL", "  "), ("AUDIT_DIR", "")]);
        let env = EnvConfig::from_lookup(lookup_from(&map)).unwrap();
        assert!(env.rabbitmq_url.is_none());
        assert!(env.audit_dir.is_none());
    }
}
