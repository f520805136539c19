/// Embedded image extraction for markdown bodies
///
/// Finds `![alt](data:image/<subtype>;base64,<payload>)` images, uploads the
/// decoded bytes as their own blobs and rewrites each match to point at the
/// public URL. Every match is handled on its own: a rejected or failed image
/// keeps its original text and never affects its siblings or the document.
use crate::storage::{image_key, BlobStore, PublicUrls};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::sync::Arc;
use uuid::Uuid;

/// Largest accepted decoded image (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

static DATA_URL_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(data:image/([A-Za-z0-9.+-]+);base64,([^)]+?)\)")
        .expect("data URL image pattern is valid")
});

/// Allow-listed subtypes and the content type each is stored with
fn content_type_for(subtype: &str) -> Option<&'static str> {
    match subtype {
        "png" => Some("image/png"),
        "jpeg" | "jpg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Why an embedded image was left in place
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rejection {
    DisallowedType(String),
    InvalidBase64,
    TooLarge(usize),
}

struct AcceptedImage {
    ext: String,
    content_type: &'static str,
    bytes: Vec<u8>,
}

fn validate(subtype: &str, payload: &str) -> Result<AcceptedImage, Rejection> {
    let subtype = subtype.to_ascii_lowercase();
    let content_type =
        content_type_for(&subtype).ok_or_else(|| Rejection::DisallowedType(subtype.clone()))?;

    let cleaned: String = payload.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| Rejection::InvalidBase64)?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(Rejection::TooLarge(bytes.len()));
    }

    Ok(AcceptedImage {
        ext: subtype,
        content_type,
        bytes,
    })
}

#[derive(Clone)]
pub struct ImagePipeline {
    blobs: Arc<dyn BlobStore>,
    urls: PublicUrls,
}

impl ImagePipeline {
    pub fn new(blobs: Arc<dyn BlobStore>, urls: PublicUrls) -> Self {
        Self { blobs, urls }
    }

    /// Rewrite `markdown`, hosting embedded images under `slug`. Never fails.
    pub async fn process(&self, markdown: &str, slug: &str) -> String {
        let matches: Vec<EmbeddedImage<'_>> = DATA_URL_IMAGE
            .captures_iter(markdown)
            .filter_map(|caps| EmbeddedImage::from_captures(&caps))
            .collect();
        if matches.is_empty() {
            return markdown.to_string();
        }

        let mut output = String::with_capacity(markdown.len());
        let mut last_end = 0;

        for image in matches {
            output.push_str(&markdown[last_end..image.start]);
            last_end = image.end;

            match self.extract(&image, slug).await {
                Some(replacement) => output.push_str(&replacement),
                None => output.push_str(&markdown[image.start..image.end]),
            }
        }

        output.push_str(&markdown[last_end..]);
        output
    }

    async fn extract(&self, embedded: &EmbeddedImage<'_>, slug: &str) -> Option<String> {
        let image = match validate(embedded.subtype, embedded.payload) {
            Ok(image) => image,
            Err(rejection) => {
                tracing::debug!(slug = %slug, ?rejection, "embedded image left unchanged");
                return None;
            }
        };

        let key = image_key(slug, &Uuid::new_v4().to_string(), &image.ext);
        let size = image.bytes.len();
        if let Err(e) = self
            .blobs
            .upload(&key, image.bytes, image.content_type)
            .await
        {
            tracing::warn!(slug = %slug, key = %key, error = %e, "embedded image upload failed; keeping data URL");
            return None;
        }

        tracing::debug!(slug = %slug, key = %key, size, "embedded image extracted");
        Some(format!("![{}]({})", embedded.alt, self.urls.url_for(&key)))
    }
}

/// One data-URL image occurrence, borrowed from the source document
struct EmbeddedImage<'a> {
    start: usize,
    end: usize,
    alt: &'a str,
    subtype: &'a str,
    payload: &'a str,
}

impl<'a> EmbeddedImage<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let whole = caps.get(0)?;
        Some(Self {
            start: whole.start(),
            end: whole.end(),
            alt: caps.get(1)?.as_str(),
            subtype: caps.get(2)?.as_str(),
            payload: caps.get(3)?.as_str(),
        })
    }
}
