//! Logging setup. Output goes to stderr so rendered HTML on stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Filter directives, e.g. `chat_bubbles=debug`.
pub const LOG_ENV: &str = "CHAT_BUBBLES_LOG";
/// Set to `json` for structured output.
pub const LOG_FORMAT_ENV: &str = "CHAT_BUBBLES_LOG_FORMAT";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // a second init (tests, embedding) keeps the first subscriber
    let result = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
    if let Err(e) = result {
        tracing::debug!("tracing subscriber already set: {e}");
    }
}
