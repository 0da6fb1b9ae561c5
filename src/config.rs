use serde::Deserialize;

pub const DEFAULT_EXPLORER_HOST: &str = "etherscan.io";
pub const DEFAULT_EXPLORER_NAME: &str = "Etherscan";

/// Block explorer used for "view transaction" links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Host only, no scheme: `https://<host>/tx/<hash>`
    pub host: String,
    /// Shown as "View on <name>"
    pub name: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_EXPLORER_HOST.to_string(),
            name: DEFAULT_EXPLORER_NAME.to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Accepts hosts given with a scheme or trailing slash.
    pub fn new(host: &str, name: &str) -> Self {
        let host = host
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Self {
            host: host.to_string(),
            name: name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub explorer: ExplorerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_etherscan() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.explorer.host, "etherscan.io");
        assert_eq!(cfg.explorer.name, "Etherscan");
    }

    #[test]
    fn host_is_normalised() {
        let cfg = ExplorerConfig::new("https://basescan.org/", " Basescan ");
        assert_eq!(cfg.host, "basescan.org");
        assert_eq!(cfg.name, "Basescan");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: MonitorConfig =
            serde_json::from_str(r#"{"explorer":{"host":"arbiscan.io"}}"#).unwrap();
        assert_eq!(cfg.explorer.host, "arbiscan.io");
        assert_eq!(cfg.explorer.name, "Etherscan");
    }
}
