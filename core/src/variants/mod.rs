//! Variant resolution: which visual forms exist for an entry, and fetching
//! the image for the one the user picks.
//!
//! Every lane owns its own [`VariantResolver`], so throttle timing and the
//! variant cache are never shared. The cache is session-only; after a restart
//! it is rebuilt by listing the entry again.

mod scrape;
mod throttle;

use std::sync::Arc;
use std::time::Duration;

use shinycount_types::ThrottleConfig;

use crate::notice::Notice;
use crate::remote::{RemoteError, SpriteSource};

pub use scrape::shiny_variants;
pub use throttle::Throttle;

/// One selectable visual form of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// `"<game>: <name>"`
    pub label: String,
    pub image_url: String,
}

/// Variants of the currently bound entry, in page order
#[derive(Debug, Clone, Default)]
pub struct VariantCache {
    variants: Vec<Variant>,
}

impl VariantCache {
    pub fn get(&self, label: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.label == label)
    }

    pub fn replace(&mut self, variants: Vec<Variant>) {
        self.variants = variants;
    }

    pub fn clear(&mut self) {
        self.variants.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Result of listing an entry's variants. A failed lookup is not an error:
/// the list is empty and `notice` says why.
#[derive(Debug, Clone, Default)]
pub struct VariantListing {
    pub variants: Vec<Variant>,
    pub notice: Option<Notice>,
}

/// A decoded image ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneImage {
    pub label: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    #[error("no variant '{0}' for the selected entry")]
    UnknownVariant(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub struct VariantResolver<S> {
    source: Arc<S>,
    throttle: Throttle,
    image_penalty: Duration,
    free_image_calls: u32,
    cache: VariantCache,
}

impl<S> VariantResolver<S> {
    pub fn new(source: Arc<S>, config: &ThrottleConfig) -> Self {
        Self {
            source,
            throttle: Throttle::new(Duration::from_millis(config.min_interval_ms)),
            image_penalty: Duration::from_millis(config.image_penalty_ms),
            free_image_calls: config.free_image_calls,
            cache: VariantCache::default(),
        }
    }

    pub fn cache(&self) -> &VariantCache {
        &self.cache
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Image fetches left that skip the spacing check
    pub fn free_image_calls(&self) -> u32 {
        self.free_image_calls
    }
}

impl<S: SpriteSource> VariantResolver<S> {
    /// Look up the variants of `entry` on the sprite host.
    ///
    /// The previous list is cleared up front, before any throttling. A call
    /// inside the throttle window waits for the window to close.
    pub async fn list_variants(&mut self, entry: &str) -> VariantListing {
        self.cache.clear();
        if entry.is_empty() {
            return VariantListing::default();
        }

        self.throttle.wait().await;

        match self.source.sprite_page(entry).await {
            Ok(page) => {
                let variants = shiny_variants(&page);
                tracing::debug!(entry, count = variants.len(), "Resolved variants");
                self.cache.replace(variants.clone());
                VariantListing {
                    variants,
                    notice: None,
                }
            }
            Err(e) => {
                tracing::warn!(entry, error = %e, "Error fetching variants");
                VariantListing {
                    variants: Vec::new(),
                    notice: Some(Notice::new(
                        "Variants unavailable",
                        format!("Could not load variants for {entry}: {e}"),
                    )),
                }
            }
        }
    }

    /// Fetch and decode the image for a cached variant.
    ///
    /// The first few fetches are free; after that a fetch inside the throttle
    /// window stalls for the penalty before going out.
    pub async fn fetch_image(&mut self, label: &str) -> Result<LaneImage, VariantError> {
        let variant = self
            .cache
            .get(label)
            .cloned()
            .ok_or_else(|| VariantError::UnknownVariant(label.to_string()))?;

        if self.free_image_calls > 0 {
            self.free_image_calls -= 1;
        } else {
            self.throttle.penalize(self.image_penalty).await;
        }

        let bytes = self.source.image(&variant.image_url).await?;
        let decoded = image::load_from_memory(&bytes)?;

        Ok(LaneImage {
            label: variant.label,
            url: variant.image_url,
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }
}
