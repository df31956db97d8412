// Library root: a client for Wattpad's JSON API and story-text HTML endpoints.
//
// Modules are public so integration tests and the CLI can reach the same API
// that downstream consumers use.

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod render;
pub mod urls;

pub use client::{Fetcher, HttpFetcher, WattpadClient, WattpadClientBuilder};
pub use error::{Result, WattpadError};
pub use models::{
    HtmlContent, HtmlStyle, HtmlWord, Part, PublishedPart, RenderedPage, Story, User,
};
