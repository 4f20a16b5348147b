//! Wire types for the remote quote endpoint.

use serde::{Deserialize, Serialize};

/// One item of the remote GET response. Only the title is used; the remote
/// has no category concept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemotePost {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of the POST that submits one local quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushQuoteRequest<'a> {
    pub text: &'a str,
    pub category: &'a str,
}
