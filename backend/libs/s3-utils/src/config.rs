/// S3 configuration shared by services that store objects in a bucket
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (CDN domain). When unset, object URLs are
    /// synthesized from bucket and region.
    pub public_base_url: Option<String>,
    /// Custom endpoint for S3-compatible storage (MinIO, LocalStack)
    pub endpoint: Option<String>,
    /// Whether to use path-style addressing (false = virtual-hosted-style)
    pub force_path_style: bool,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "entries".to_string());
        if bucket.trim().is_empty() {
            return Err("S3_BUCKET cannot be empty".to_string());
        }

        Ok(Self {
            bucket,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            public_base_url: non_empty_var("S3_PUBLIC_BASE_URL"),
            endpoint: non_empty_var("S3_ENDPOINT"),
            force_path_style: match std::env::var("S3_FORCE_PATH_STYLE") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|e| format!("Failed to parse S3_FORCE_PATH_STYLE='{}': {}", raw, e))?,
                Err(_) => false,
            },
        })
    }

    /// Public URL under which `key` is served.
    ///
    /// A configured base URL wins; otherwise the canonical
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}` form is used.
    pub fn public_url(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        match self.public_base_url.as_deref() {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public_base_url: Option<&str>) -> S3Config {
        S3Config {
            bucket: "test-bucket".to_string(),
            region: "eu-west-1".to_string(),
            public_base_url: public_base_url.map(str::to_string),
            endpoint: None,
            force_path_style: false,
        }
    }

    #[test]
    fn test_public_url_without_base_url() {
        let url = config(None).public_url("posts/hello/images/abc.png");
        assert_eq!(
            url,
            "https://test-bucket.s3.eu-west-1.amazonaws.com/posts/hello/images/abc.png"
        );
    }

    #[test]
    fn test_public_url_with_base_url() {
        let url = config(Some("https://cdn.example.com/")).public_url("posts/hello.md");
        assert_eq!(url, "https://cdn.example.com/posts/hello.md");
    }
}
