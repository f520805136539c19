/// Business logic layer for entries-service
///
/// - Post service: cross-store sequencing for create/read/update/delete/publish
/// - Image pipeline: embedded data-URL image extraction during content writes
pub mod images;
pub mod posts;

// Re-export commonly used services
pub use images::ImagePipeline;
pub use posts::{PostService, PostUpdate};
