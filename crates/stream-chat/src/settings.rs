use std::env;

use stream_chat_core::DecodeMode;
use stream_chat_http::{HttpEndpointConfig, HttpEndpointConfigBuilder};

const BASE_URL_VAR: &str = "STREAM_CHAT_BASE_URL";
const PATH_VAR: &str = "STREAM_CHAT_PATH";
const STRICT_VAR: &str = "STREAM_CHAT_STRICT";

/// Settings of the terminal client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Where messages are posted.
    pub endpoint: HttpEndpointConfig,
    /// How reply bodies are decoded.
    pub decode_mode: DecodeMode,
}

impl Settings {
    /// Reads the settings from the environment.
    ///
    /// - `STREAM_CHAT_BASE_URL` overrides the server, which is
    ///   `http://127.0.0.1:8000` by default.
    /// - `STREAM_CHAT_PATH` overrides the request path, `/api/chat/` by
    ///   default.
    /// - `STREAM_CHAT_STRICT=1` fails the exchange on invalid bytes in a
    ///   reply, instead of replacing them with U+FFFD.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut builder = HttpEndpointConfigBuilder::new();
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.is_empty())
        {
            builder = builder.with_base_url(base_url);
        }
        if let Some(path) = lookup(PATH_VAR).filter(|v| !v.is_empty()) {
            builder = builder.with_path(path);
        }

        let strict = lookup(STRICT_VAR)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            endpoint: builder.build(),
            decode_mode: if strict {
                DecodeMode::Strict
            } else {
                DecodeMode::Lossy
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_with(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_with(&[]);
        assert_eq!(settings.endpoint.url(), "http://127.0.0.1:8000/api/chat/");
        assert_eq!(settings.decode_mode, DecodeMode::Lossy);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_with(&[
            (BASE_URL_VAR, "http://chat.local:9000"),
            (PATH_VAR, "/v2/chat"),
            (STRICT_VAR, "1"),
        ]);
        assert_eq!(settings.endpoint.url(), "http://chat.local:9000/v2/chat");
        assert_eq!(settings.decode_mode, DecodeMode::Strict);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let settings =
            settings_with(&[(BASE_URL_VAR, ""), (STRICT_VAR, "no")]);
        assert_eq!(settings.endpoint, HttpEndpointConfig::default());
        assert_eq!(settings.decode_mode, DecodeMode::Lossy);
    }
}
