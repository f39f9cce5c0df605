use serde::{Deserialize, Serialize};

/// The chunks in a preset response body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetChunk {
    /// A chunk holding the UTF-8 bytes of a string.
    #[serde(rename = "text")]
    Text(String),
    /// A chunk of raw bytes, which may split or break characters.
    #[serde(rename = "bytes")]
    Bytes(Vec<u8>),
    /// The body breaks off here with an error.
    #[serde(rename = "interrupt")]
    Interrupt,
}

/// How the endpoint refuses a request before any body is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetRejection {
    /// The endpoint cannot be reached.
    NetworkUnavailable,
    /// The endpoint answers with the given non-success status.
    Status(u16),
}

/// The preset response for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Chunks of the response body, in order.
    pub chunks: Vec<PresetChunk>,
    /// If set, the request fails before any chunk is produced.
    pub rejection: Option<PresetRejection>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified chunks.
    #[inline]
    pub fn with_chunks(chunks: impl Into<Vec<PresetChunk>>) -> Self {
        Self {
            chunks: chunks.into(),
            rejection: None,
        }
    }

    /// Creates a `PresetResponse` whose body is made of text chunks.
    pub fn with_text_chunks<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_chunks(
            texts
                .into_iter()
                .map(|text| PresetChunk::Text(text.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` that refuses the request.
    #[inline]
    pub fn rejected(rejection: PresetRejection) -> Self {
        Self {
            chunks: vec![],
            rejection: Some(rejection),
        }
    }
}
