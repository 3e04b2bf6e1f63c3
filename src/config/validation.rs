//! Credential format validation.
//!
//! # Responsibilities
//! - Check each backend's identifier/secret pair before its connect
//!   action is enabled
//! - Collect one inline message per failing backend, not just the first
//!
//! Validation is a pure function over the loaded config; it performs no
//! network calls and can be re-run at any time.

use std::collections::HashMap;

use crate::backend::BackendKind;
use crate::config::schema::MuxConfig;

/// Per-backend validation outcome. A backend absent from the map passed
/// its checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: HashMap<BackendKind, String>,
}

impl ValidationReport {
    /// Whether this backend's connect action may be enabled.
    pub fn is_valid(&self, backend: BackendKind) -> bool {
        !self.errors.contains_key(&backend)
    }

    /// The inline message for a failing backend.
    pub fn message(&self, backend: BackendKind) -> Option<&str> {
        self.errors.get(&backend).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BackendKind, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Format-check every backend's credentials.
pub fn validate_credentials(config: &MuxConfig) -> ValidationReport {
    let mut errors = HashMap::new();

    // Embedded: lowercase alphanumeric app id, at least 20 characters.
    if config.embedded.app_id.is_empty() {
        errors.insert(
            BackendKind::Embedded,
            "embedded app id is missing".to_string(),
        );
    } else if config.embedded.app_id.len() < 20
        || !config
            .embedded
            .app_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        errors.insert(
            BackendKind::Embedded,
            "invalid embedded app id format".to_string(),
        );
    } else if config.embedded.app_key.is_empty() {
        errors.insert(
            BackendKind::Embedded,
            "embedded app key is missing".to_string(),
        );
    }

    // Hosted: UUID-shaped environment id.
    if config.hosted.app_id.is_empty() {
        errors.insert(BackendKind::Hosted, "hosted environment id is missing".to_string());
    } else if !is_uuid(&config.hosted.app_id) {
        errors.insert(
            BackendKind::Hosted,
            "invalid hosted environment id format (expected UUID)".to_string(),
        );
    } else if config.hosted.app_key.is_empty() {
        errors.insert(BackendKind::Hosted, "hosted app key is missing".to_string());
    }

    // Custodial: 32-char lowercase hex app id and an `ak_` app key.
    if config.custodial.app_id.is_empty() {
        errors.insert(
            BackendKind::Custodial,
            "custodial app id is missing".to_string(),
        );
    } else if config.custodial.app_key.is_empty() {
        errors.insert(
            BackendKind::Custodial,
            "custodial app key is missing".to_string(),
        );
    } else if config.custodial.app_id.len() != 32
        || !config
            .custodial
            .app_id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        errors.insert(
            BackendKind::Custodial,
            "invalid custodial app id format (expected 32 char hex)".to_string(),
        );
    } else if !config.custodial.app_key.starts_with("ak_") {
        errors.insert(
            BackendKind::Custodial,
            "invalid custodial app key format (should start with 'ak_')".to_string(),
        );
    }

    ValidationReport { errors }
}

fn is_uuid(raw: &str) -> bool {
    let groups: Vec<&str> = raw.split('-').collect();
    if groups.len() != 5 {
        return false;
    }
    let lengths = [8, 4, 4, 4, 12];
    groups
        .iter()
        .zip(lengths)
        .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CredentialPair;

    fn valid_config() -> MuxConfig {
        MuxConfig {
            embedded: CredentialPair {
                app_id: "cl9f2k3j4h5g6f7d8s9a0".to_string(),
                app_key: "sk_live_01".to_string(),
            },
            hosted: CredentialPair {
                app_id: "3f2b8c1a-9d4e-4f6a-8b2c-1d3e5f7a9b0c".to_string(),
                app_key: "env_live_01".to_string(),
            },
            custodial: CredentialPair {
                app_id: "0123456789abcdef0123456789abcdef".to_string(),
                app_key: "ak_live_01".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_credentials_enable_everything() {
        let report = validate_credentials(&valid_config());
        assert!(report.is_empty());
        assert!(report.is_valid(BackendKind::Embedded));
        assert!(report.is_valid(BackendKind::Hosted));
        assert!(report.is_valid(BackendKind::Custodial));
        // The injected extension needs no credentials.
        assert!(report.is_valid(BackendKind::Injected));
    }

    #[test]
    fn test_missing_credentials_disable_each_backend() {
        let report = validate_credentials(&MuxConfig::default());
        assert!(!report.is_valid(BackendKind::Embedded));
        assert!(!report.is_valid(BackendKind::Hosted));
        assert!(!report.is_valid(BackendKind::Custodial));
        assert!(report
            .message(BackendKind::Embedded)
            .unwrap()
            .contains("missing"));
    }

    #[test]
    fn test_format_checks() {
        let mut config = valid_config();
        config.embedded.app_id = "TooShort".to_string();
        config.hosted.app_id = "not-a-uuid".to_string();
        config.custodial.app_key = "pk_live_01".to_string();

        let report = validate_credentials(&config);
        assert_eq!(
            report.message(BackendKind::Embedded),
            Some("invalid embedded app id format")
        );
        assert!(report
            .message(BackendKind::Hosted)
            .unwrap()
            .contains("expected UUID"));
        assert!(report
            .message(BackendKind::Custodial)
            .unwrap()
            .contains("ak_"));
    }

    #[test]
    fn test_one_bad_backend_leaves_the_rest_enabled() {
        let mut config = valid_config();
        config.custodial.app_id = "short".to_string();

        let report = validate_credentials(&config);
        assert!(report.is_valid(BackendKind::Embedded));
        assert!(report.is_valid(BackendKind::Hosted));
        assert!(!report.is_valid(BackendKind::Custodial));
    }
}
