// Fixed endpoints and defaults shared by the URL builders and the client.

use std::time::Duration;

/// Root of every request the client issues.
pub const BASE_URL: &str = "https://www.wattpad.com";

/// Browser-like user agent; the service rejects obviously scripted agents.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 ",
    "(KHTML, like Gecko) ",
    "Chrome/123.0.0.0 Safari/537.36 ",
    "WattpadClient/Rust/",
    env!("CARGO_PKG_VERSION"),
);

/// Relative directory the response cache lives in unless configured otherwise.
pub const DEFAULT_CACHE_DIR: &str = "capacitor";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Parts rendered in flight at once by `WattpadClient::render_story`.
pub const DEFAULT_RENDER_CONCURRENCY: usize = 4;
