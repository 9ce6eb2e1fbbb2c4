use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{AppConfigStore, APP_ID_KEY, APP_SECRET_KEY};
use crate::error::VerificationError;

/// Session identity supplied by the caller. Any field left empty is filled in
/// by the controller or the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInformation {
    pub timestamp: String,
    pub session_id: String,
    pub signature: String,
}

/// Structured verification parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub app_id: String,
    pub secret: String,
    pub provider_id: String,
    pub session: Option<SessionInformation>,
    pub context: String,
    /// Prefill values handed to the provider flow.
    pub parameters: BTreeMap<String, String>,
    pub hide_landing: bool,
    pub auto_submit: bool,
    pub accept_ai_providers: bool,
    pub webhook_url: Option<String>,
    /// Ask the engine for verbose diagnostics.
    pub debug: bool,
}

impl fmt::Debug for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParams")
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .field("provider_id", &self.provider_id)
            .field("session", &self.session)
            .field("context", &self.context)
            .field("parameters", &self.parameters)
            .field("hide_landing", &self.hide_landing)
            .field("auto_submit", &self.auto_submit)
            .field("accept_ai_providers", &self.accept_ai_providers)
            .field("webhook_url", &self.webhook_url)
            .field("debug", &self.debug)
            .finish()
    }
}

/// An immutable verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationRequest {
    Params(RequestParams),
    /// Opaque entry URL, bypassing structured params.
    Url(String),
}

/// Optional request fields. `Default` carries the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOptions {
    pub session: Option<SessionInformation>,
    pub context: String,
    pub parameters: BTreeMap<String, String>,
    pub hide_landing: bool,
    pub auto_submit: bool,
    pub accept_ai_providers: bool,
    pub webhook_url: Option<String>,
    /// Ask the engine for verbose diagnostics.
    pub debug: bool,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            session: None,
            context: String::new(),
            parameters: BTreeMap::new(),
            hide_landing: true,
            auto_submit: false,
            accept_ai_providers: false,
            webhook_url: None,
            debug: false,
        }
    }
}

impl VerificationOptions {
    pub fn with_session(mut self, session: SessionInformation) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_hide_landing(mut self, hide_landing: bool) -> Self {
        self.hide_landing = hide_landing;
        self
    }

    pub fn with_auto_submit(mut self, auto_submit: bool) -> Self {
        self.auto_submit = auto_submit;
        self
    }

    pub fn with_accept_ai_providers(mut self, accept: bool) -> Self {
        self.accept_ai_providers = accept;
        self
    }

    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl VerificationRequest {
    /// Build a request from explicit credentials. Never fails.
    pub fn from_explicit(
        app_id: impl Into<String>,
        secret: impl Into<String>,
        provider_id: impl Into<String>,
        options: VerificationOptions,
    ) -> Self {
        let VerificationOptions {
            session,
            context,
            parameters,
            hide_landing,
            auto_submit,
            accept_ai_providers,
            webhook_url,
            debug,
        } = options;

        Self::Params(RequestParams {
            app_id: app_id.into(),
            secret: secret.into(),
            provider_id: provider_id.into(),
            session,
            context,
            parameters,
            hide_landing,
            auto_submit,
            accept_ai_providers,
            webhook_url,
            debug,
        })
    }

    /// Build a request whose credentials come from the app configuration.
    ///
    /// A key that is absent or empty yields `ConfigurationMissing` naming it;
    /// the app id is checked first.
    pub fn from_config(
        config: &dyn AppConfigStore,
        provider_id: impl Into<String>,
        options: VerificationOptions,
    ) -> Result<Self, VerificationError> {
        let app_id = required(config, APP_ID_KEY)?;
        let secret = required(config, APP_SECRET_KEY)?;
        Ok(Self::from_explicit(app_id, secret, provider_id, options))
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn provider_id(&self) -> Option<&str> {
        match self {
            Self::Params(params) => Some(&params.provider_id),
            Self::Url(_) => None,
        }
    }

    pub fn app_id(&self) -> Option<&str> {
        match self {
            Self::Params(params) => Some(&params.app_id),
            Self::Url(_) => None,
        }
    }

    pub fn session(&self) -> Option<&SessionInformation> {
        match self {
            Self::Params(params) => params.session.as_ref(),
            Self::Url(_) => None,
        }
    }
}

fn required(config: &dyn AppConfigStore, key: &str) -> Result<String, VerificationError> {
    match config.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VerificationError::ConfigurationMissing(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn full_config() -> MapConfig {
        MapConfig::new()
            .with(APP_ID_KEY, "0xapp")
            .with(APP_SECRET_KEY, "0xsecret")
    }

    fn params(request: &VerificationRequest) -> &RequestParams {
        match request {
            VerificationRequest::Params(params) => params,
            VerificationRequest::Url(_) => panic!("expected params request"),
        }
    }

    #[test]
    fn test_explicit_defaults() {
        let request = VerificationRequest::from_explicit(
            "0xapp",
            "0xsecret",
            "google-login",
            VerificationOptions::default(),
        );
        let p = params(&request);
        assert_eq!(p.provider_id, "google-login");
        assert!(p.hide_landing);
        assert!(!p.auto_submit);
        assert!(!p.accept_ai_providers);
        assert_eq!(p.context, "");
        assert!(p.parameters.is_empty());
        assert!(p.session.is_none());
        assert!(p.webhook_url.is_none());
        assert!(!p.debug);
    }

    #[test]
    fn test_explicit_overrides() {
        let options = VerificationOptions::default()
            .with_context("order-42")
            .with_parameter("email", "alice@example.com")
            .with_hide_landing(false)
            .with_auto_submit(true)
            .with_accept_ai_providers(true)
            .with_webhook_url("https://host.example/hook")
            .with_debug(true)
            .with_session(SessionInformation {
                timestamp: "1700000000000".to_string(),
                session_id: "s-1".to_string(),
                signature: "0xsig".to_string(),
            });
        let request = VerificationRequest::from_explicit("a", "s", "github-login", options);
        let p = params(&request);
        assert_eq!(p.context, "order-42");
        assert_eq!(p.parameters.get("email").map(String::as_str), Some("alice@example.com"));
        assert!(!p.hide_landing);
        assert!(p.auto_submit);
        assert!(p.accept_ai_providers);
        assert_eq!(p.webhook_url.as_deref(), Some("https://host.example/hook"));
        assert!(p.debug);
        assert_eq!(request.session().unwrap().session_id, "s-1");
    }

    #[test]
    fn test_from_config_google_login_defaults() {
        let request = VerificationRequest::from_config(
            &full_config(),
            "google-login",
            VerificationOptions::default(),
        )
        .unwrap();
        let p = params(&request);
        assert_eq!(p.app_id, "0xapp");
        assert_eq!(p.secret, "0xsecret");
        assert!(p.hide_landing);
        assert!(!p.auto_submit);
    }

    #[test]
    fn test_from_config_missing_secret() {
        let config = MapConfig::new().with(APP_ID_KEY, "0xapp");
        let result =
            VerificationRequest::from_config(&config, "google-login", VerificationOptions::default());
        assert_eq!(
            result.unwrap_err(),
            VerificationError::ConfigurationMissing(APP_SECRET_KEY.to_string())
        );
    }

    #[test]
    fn test_from_config_missing_app_id_reported_first() {
        let result = VerificationRequest::from_config(
            &MapConfig::new(),
            "google-login",
            VerificationOptions::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            VerificationError::ConfigurationMissing(APP_ID_KEY.to_string())
        );
    }

    #[test]
    fn test_from_config_empty_value_is_missing() {
        let config = MapConfig::new().with(APP_ID_KEY, "0xapp").with(APP_SECRET_KEY, "  ");
        let result =
            VerificationRequest::from_config(&config, "google-login", VerificationOptions::default());
        assert!(matches!(result, Err(VerificationError::ConfigurationMissing(_))));
    }

    #[test]
    fn test_url_variant_accessors() {
        let request = VerificationRequest::from_url("https://share.reclaimprotocol.org/verify/abc");
        assert_eq!(request.provider_id(), None);
        assert_eq!(request.app_id(), None);
        assert!(request.session().is_none());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let request = VerificationRequest::from_explicit(
            "0xapp",
            "super-secret",
            "google-login",
            VerificationOptions::default(),
        );
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_params_serialize_camel_case() {
        let request = VerificationRequest::from_explicit(
            "0xapp",
            "0xsecret",
            "google-login",
            VerificationOptions::default(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["params"]["providerId"], "google-login");
        assert_eq!(json["params"]["hideLanding"], true);
        assert_eq!(json["params"]["acceptAiProviders"], false);
        assert_eq!(json["params"]["debug"], false);
    }
}
