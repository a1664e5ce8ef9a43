use std::time::Duration;

/// Forum API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Origin of the identity hub that signs login assertions.
    pub hub_url: String,
    /// This forum's audience identifier inside identity assertions.
    pub forum_id: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Writes of the reading position for the same user and discussion that
    /// land closer together than this are acknowledged without persisting.
    /// Zero disables the throttle.
    pub reading_position_min_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_var("DATABASE_URL"),
            hub_url: required_var("HUB_URL"),
            forum_id: required_var("FORUM_ID"),
            port: parsed_var("PORT").unwrap_or(4003),
            reading_position_min_interval: Duration::from_millis(
                parsed_var("READING_POSITION_MIN_INTERVAL_MS").unwrap_or(0),
            ),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
