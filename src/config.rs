use secrecy::Secret;
use std::env;
use std::time::Duration;

/// How "video-ness" is attached to content items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentStrategy {
    /// Any regular post becomes video-bearing through its `is_video` flag.
    #[default]
    FlaggedPost,
    /// Videos are their own content type; the flag is implied by the type.
    DedicatedType,
}

impl ContentStrategy {
    /// Content type the video features are attached to.
    pub fn post_type(&self) -> &'static str {
        match self {
            ContentStrategy::FlaggedPost => "post",
            ContentStrategy::DedicatedType => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flag" | "flagged_post" | "post" => Some(ContentStrategy::FlaggedPost),
            "post_type" | "dedicated_type" | "video" => Some(ContentStrategy::DedicatedType),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub site_url: String,
    pub jwt_secret: Secret<String>,
    pub nonce_secret: Secret<String>,
    pub strategy: ContentStrategy,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub youtube_api_base: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let jwt_secret = env::var("TOKEN").map_err(|e| {
            tracing::error!("TOKEN not set: {:?}", e);
            anyhow::anyhow!("TOKEN must be set")
        })?;
        let nonce_secret = env::var("NONCE_SECRET").unwrap_or_else(|_| jwt_secret.clone());

        let strategy = match env::var("VIDEO_CONTENT_STRATEGY") {
            Ok(value) => ContentStrategy::parse(&value).ok_or_else(|| {
                anyhow::anyhow!("VIDEO_CONTENT_STRATEGY must be `flag` or `post_type`, got {value}")
            })?,
            Err(_) => ContentStrategy::default(),
        };

        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://video_seo.db?mode=rwc".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3001)?,
            },
            site_url: env::var("SITE_URL")
                .map_err(|_| anyhow::anyhow!("SITE_URL must be set"))?
                .trim_end_matches('/')
                .to_string(),
            jwt_secret: Secret::new(jwt_secret),
            nonce_secret: Secret::new(nonce_secret),
            strategy,
            provider: ProviderConfig {
                youtube_api_base: env::var("YOUTUBE_API_BASE")
                    .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_secs(parse_var("PROVIDER_TIMEOUT_SECS", 10)?),
            },
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} must be a number: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            site_url: "https://example.com".to_string(),
            jwt_secret: Secret::new("test-jwt-secret".to_string()),
            nonce_secret: Secret::new("test-nonce-secret".to_string()),
            strategy: ContentStrategy::FlaggedPost,
            provider: ProviderConfig {
                youtube_api_base: "http://127.0.0.1:9".to_string(),
                timeout: Duration::from_secs(2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_aliases() {
        assert_eq!(ContentStrategy::parse("flag"), Some(ContentStrategy::FlaggedPost));
        assert_eq!(ContentStrategy::parse("POST_TYPE"), Some(ContentStrategy::DedicatedType));
        assert_eq!(ContentStrategy::parse("nope"), None);
    }

    #[test]
    fn strategy_selects_post_type() {
        assert_eq!(ContentStrategy::FlaggedPost.post_type(), "post");
        assert_eq!(ContentStrategy::DedicatedType.post_type(), "video");
    }
}
