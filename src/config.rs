const DEFAULT_API_HOST: &str = "http://rancher.local:8080/v1";
const DEFAULT_ACCESS_KEY: &str = "userid";
const DEFAULT_SECRET_KEY: &str = "password";
const API_VERSION: &str = "/v1";

/// Environment variables consulted at startup. Later entries override
/// earlier ones for the same setting.
const ACCESS_KEY_VARS: [&str; 2] = ["CATTLE_ACCESS_KEY", "RANCHER_ACCESS_KEY"];
const SECRET_KEY_VARS: [&str; 2] = ["CATTLE_SECRET_KEY", "RANCHER_SECRET_KEY"];
const URL_VARS: [&str; 2] = ["CATTLE_URL", "RANCHER_URL"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    api_host: String,
    access_key: String,
    secret_key: String,
}

impl CliConfig {
    pub fn init() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let last_set = |keys: &[&str], default: &str| {
            keys.iter()
                .filter_map(|&key| lookup(key))
                .last()
                .unwrap_or_else(|| default.to_string())
        };

        let config = CliConfig::new(
            &last_set(&URL_VARS, DEFAULT_API_HOST),
            last_set(&ACCESS_KEY_VARS, DEFAULT_ACCESS_KEY),
            last_set(&SECRET_KEY_VARS, DEFAULT_SECRET_KEY),
        );
        log::debug!("Using API host: {}", config.api_host);
        config
    }

    pub fn new(api_host: &str, access_key: String, secret_key: String) -> Self {
        CliConfig {
            api_host: normalize_host(api_host),
            access_key,
            secret_key,
        }
    }

    /// Apply command line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        api_host: Option<&String>,
        access_key: Option<&String>,
        secret_key: Option<&String>,
    ) -> Self {
        if let Some(host) = api_host {
            self.api_host = normalize_host(host);
        }
        if let Some(key) = access_key {
            self.access_key = key.clone();
        }
        if let Some(secret) = secret_key {
            self.secret_key = secret.clone();
        }
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_host, path)
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains(API_VERSION) {
        host.to_string()
    } else {
        format!("{host}{API_VERSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.api_host(), "http://rancher.local:8080/v1");
        assert_eq!(config.access_key(), "userid");
        assert_eq!(config.secret_key(), "password");
    }

    #[test]
    fn rancher_variables_override_cattle_variables() {
        let config = config_from(&[
            ("CATTLE_ACCESS_KEY", "cattle-key"),
            ("CATTLE_SECRET_KEY", "cattle-secret"),
            ("CATTLE_URL", "http://cattle:8080/v1"),
            ("RANCHER_ACCESS_KEY", "rancher-key"),
            ("RANCHER_URL", "http://rancher:8080"),
        ]);
        assert_eq!(config.access_key(), "rancher-key");
        assert_eq!(config.secret_key(), "cattle-secret");
        assert_eq!(config.api_host(), "http://rancher:8080/v1");
    }

    #[test]
    fn version_segment_is_not_duplicated() {
        let config = config_from(&[("CATTLE_URL", "http://cattle:8080/v1/projects/1a5")]);
        assert_eq!(config.api_host(), "http://cattle:8080/v1/projects/1a5");
        assert_eq!(
            config.url("/services/1s3"),
            "http://cattle:8080/v1/projects/1a5/services/1s3"
        );
    }

    #[test]
    fn trailing_slash_is_dropped_before_appending_version() {
        let config = config_from(&[("RANCHER_URL", "http://rancher:8080/")]);
        assert_eq!(config.api_host(), "http://rancher:8080/v1");
    }

    #[test]
    fn flags_override_environment() {
        let host = "http://flag:9000".to_string();
        let key = "flag-key".to_string();
        let config = config_from(&[("RANCHER_URL", "http://rancher:8080")]).with_overrides(
            Some(&host),
            Some(&key),
            None,
        );
        assert_eq!(config.api_host(), "http://flag:9000/v1");
        assert_eq!(config.access_key(), "flag-key");
        assert_eq!(config.secret_key(), "password");
    }
}
