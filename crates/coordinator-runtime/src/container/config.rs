//! # Runtime Configuration
//!
//! Unified configuration for the coordinator process: the gateway's own
//! `CoordinatorConfig` plus the few knobs that belong to process wiring
//! rather than the RPC surface (the timeout scan interval, the dev bearer
//! token).
//!
//! ## Security Requirements
//!
//! - `dev_bearer_token` MUST NOT be the default placeholder in production

use ceremony_api_gateway::CoordinatorConfig;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// HTTP/rate-limit/CORS configuration consumed by the gateway.
    pub gateway: CoordinatorConfig,
    /// Ceremony setup configuration (bucket naming).
    pub setup: ceremony_setup::SetupConfig,
    /// Multi-part upload configuration (chunk size, presigned URL TTL).
    pub upload: ceremony_upload::UploadConfig,
    /// Scheduler/auth wiring.
    pub scheduling: SchedulingConfig,
}

impl RuntimeConfig {
    /// Validate configuration for production readiness.
    ///
    /// # Panics
    ///
    /// Panics if the dev bearer token is still the default placeholder.
    pub fn validate_for_production(&self) {
        if self.scheduling.dev_bearer_token == "dev-coordinator-token" {
            panic!(
                "SECURITY VIOLATION: dev_bearer_token is the default placeholder. \
                 Set COORDINATOR_DEV_TOKEN or provide a real Authenticator."
            );
        }
    }

    /// Load from environment, falling back to defaults for unset vars.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("COORDINATOR_HTTP_PORT") {
            if let Ok(port) = port.parse() {
                config.gateway.http.port = port;
            }
        }
        if let Ok(token) = std::env::var("COORDINATOR_DEV_TOKEN") {
            config.scheduling.dev_bearer_token = token;
        }
        if let Ok(secs) = std::env::var("COORDINATOR_TIMEOUT_SCAN_SECS") {
            if let Ok(secs) = secs.parse() {
                config.scheduling.timeout_scan_interval_secs = secs;
            }
        }
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gateway: CoordinatorConfig::default(),
            setup: ceremony_setup::SetupConfig::default(),
            upload: ceremony_upload::UploadConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

/// Scheduler and auth wiring configuration.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Interval between periodic timeout scans (must be `>= 60s`).
    pub timeout_scan_interval_secs: u64,
    /// Bearer token the dev `Authenticator` resolves to `Principal::Coordinator(None)`.
    /// Any other (or missing) token resolves to `Principal::Anonymous`. A
    /// placeholder standing in for the external auth system the workspace
    /// deliberately leaves unimplemented (see DESIGN.md).
    pub dev_bearer_token: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timeout_scan_interval_secs: 60,
            dev_bearer_token: "dev-coordinator-token".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_scan_interval() {
        let config = RuntimeConfig::default();
        assert!(config.scheduling.timeout_scan_interval_secs >= 60);
    }

    #[test]
    #[should_panic(expected = "dev_bearer_token is the default placeholder")]
    fn validate_rejects_default_dev_token() {
        let config = RuntimeConfig::default();
        config.validate_for_production();
    }

    #[test]
    fn validate_accepts_overridden_dev_token() {
        let mut config = RuntimeConfig::default();
        config.scheduling.dev_bearer_token = "a-real-secret".to_string();
        config.validate_for_production();
    }
}
