use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration key holding the Reclaim application id.
pub const APP_ID_KEY: &str = "ReclaimAppId";
/// Configuration key holding the Reclaim application secret.
pub const APP_SECRET_KEY: &str = "ReclaimAppSecret";
/// Object in a host manifest that carries the credential keys.
pub const MANIFEST_SECTION: &str = "ReclaimInAppSDKParam";

/// Read-only key lookup into the host application's packaging metadata.
pub trait AppConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory configuration, mostly for tests and embedding hosts.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    entries: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl AppConfigStore for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Looks keys up verbatim in the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl AppConfigStore for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Credentials read from a JSON manifest of the form
/// `{"ReclaimInAppSDKParam": {"ReclaimAppId": "...", "ReclaimAppSecret": "..."}}`.
///
/// A manifest without the section parses fine and simply has no entries, so the
/// request builder reports the missing key rather than the loader.
#[derive(Debug, Clone, Default)]
pub struct ManifestConfig {
    entries: HashMap<String, String>,
}

impl ManifestConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read manifest at {}: {}", path.display(), e))?;
        Self::from_json_str(&contents)
            .map_err(|e| format!("Failed to parse manifest at {}: {}", path.display(), e))
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let json: serde_json::Value = serde_json::from_str(contents).map_err(|e| e.to_string())?;
        let entries = json
            .get(MANIFEST_SECTION)
            .and_then(|section| section.as_object())
            .map(|section| {
                section
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self { entries })
    }
}

impl AppConfigStore for ManifestConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Runtime knobs for the session controller.
#[derive(Debug, Clone, Default)]
pub struct VerifierSettings {
    /// Resolve a session as expired if no completion arrives in time.
    /// `None` waits indefinitely.
    pub session_timeout: Option<Duration>,
}

impl VerifierSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Zero or an unparsable value means no timeout.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let session_timeout = lookup("RECLAIM_SESSION_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self { session_timeout }
    }
}

/// Settings for the demo host binary.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub port: u16,
    pub provider_id: String,
    pub manifest_path: Option<String>,
    pub verifier: VerifierSettings,
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(4004);
        let provider_id = lookup("RECLAIM_PROVIDER_ID").unwrap_or_default();
        let manifest_path = lookup("RECLAIM_MANIFEST").filter(|p| !p.is_empty());

        Self {
            port,
            provider_id,
            manifest_path,
            verifier: VerifierSettings::from_lookup(&lookup),
        }
    }

    /// The credential source selected by the environment: the manifest when one
    /// is configured, the process environment otherwise.
    pub fn app_config(&self) -> Result<Box<dyn AppConfigStore>, String> {
        match &self.manifest_path {
            Some(path) => Ok(Box::new(ManifestConfig::load(Path::new(path))?)),
            None => Ok(Box::new(EnvConfig)),
        }
    }
}
