//! HTTP adapter for the remote quote source.

pub mod client;
pub mod error;
pub mod types;

pub use client::{map_remote_posts, HttpQuoteSource};
pub use error::{RemoteError, Result, RetryClass};
pub use types::{PushQuoteRequest, RemotePost};
