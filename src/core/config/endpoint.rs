use tracing::warn;

use crate::utils::url::{non_blank, normalize_base_url};

/// Base used during local development when no override is configured.
pub const DEV_PROXY_DEFAULT: &str = "http://localhost:8000";

/// Inputs to API base resolution, already gathered from config, environment
/// and command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    pub api_url: Option<String>,
    pub backend_url: Option<String>,
    pub development: bool,
}

impl EndpointConfig {
    /// Resolve the API base: primary override, then secondary override, then
    /// the development proxy, then an empty (relative) base.
    pub fn resolve_api_base(&self) -> String {
        if let Some(url) = non_blank(self.api_url.as_deref()) {
            return normalize_base_url(url);
        }
        if let Some(url) = non_blank(self.backend_url.as_deref()) {
            return normalize_base_url(url);
        }
        if self.development {
            return DEV_PROXY_DEFAULT.to_string();
        }

        warn!("No API base configured; requests will use a relative endpoint");
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(api: Option<&str>, backend: Option<&str>, development: bool) -> EndpointConfig {
        EndpointConfig {
            api_url: api.map(str::to_owned),
            backend_url: backend.map(str::to_owned),
            development,
        }
    }

    #[test]
    fn primary_override_wins() {
        assert_eq!(
            endpoint(Some("https://a.example/"), Some("https://b.example"), true)
                .resolve_api_base(),
            "https://a.example"
        );
    }

    #[test]
    fn secondary_override_used_when_primary_blank() {
        assert_eq!(
            endpoint(Some("  "), Some("https://b.example"), true).resolve_api_base(),
            "https://b.example"
        );
    }

    #[test]
    fn development_proxy_then_relative_base() {
        assert_eq!(endpoint(None, None, true).resolve_api_base(), DEV_PROXY_DEFAULT);
        assert_eq!(endpoint(None, Some(""), false).resolve_api_base(), "");
    }
}
