/// Builder for [`HttpEndpointConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HttpEndpointConfigBuilder {
    base_url: Option<String>,
    path: Option<String>,
}

impl HttpEndpointConfigBuilder {
    /// Creates a builder with every field left to its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom base URL, like `http://localhost:9000`.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a custom request path, like `/api/chat/`.
    #[inline]
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpEndpointConfig {
        HttpEndpointConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
            path: self.path.unwrap_or_else(|| "/api/chat/".to_string()),
        }
    }
}

/// Configuration for the HTTP chat endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpEndpointConfig {
    pub(crate) base_url: String,
    pub(crate) path: String,
}

impl HttpEndpointConfig {
    /// Returns the full URL requests are posted to.
    pub fn url(&self) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{base_url}{}", self.path)
        } else {
            format!("{base_url}/{}", self.path)
        }
    }
}

impl Default for HttpEndpointConfig {
    #[inline]
    fn default() -> Self {
        HttpEndpointConfigBuilder::new().build()
    }
}
