//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MuxConfig {
    /// Embedded-wallet SDK credentials.
    pub embedded: CredentialPair,

    /// Hosted-auth SDK credentials.
    pub hosted: CredentialPair,

    /// Custodial SDK credentials.
    pub custodial: CredentialPair,
}

/// One identifier/secret pair, as each hosted backend requires.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialPair {
    pub app_id: String,
    pub app_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses() {
        let config: MuxConfig = toml::from_str("").unwrap();
        assert_eq!(config, MuxConfig::default());

        let config: MuxConfig = toml::from_str(
            r#"
            [embedded]
            app_id = "abcdefghij0123456789"
            app_key = "sk_test"
            "#,
        )
        .unwrap();
        assert_eq!(config.embedded.app_id, "abcdefghij0123456789");
        assert_eq!(config.hosted, CredentialPair::default());
    }
}
