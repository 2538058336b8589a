//! Editorial content: news articles, hero slides, carousel images and product
//! labels.
//!
//! These records share one shape of rules: a few trimmed text fields, an
//! optional image URL, and for the list-like ones a `display_order`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CarouselImageId, HeroSlideId, NewsArticleId, ProductLabelId};

/// Longest slug we generate or accept.
pub const MAX_SLUG_LENGTH: usize = 96;

/// Validation failures for content writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("{0} cannot be empty")]
    Required(&'static str),
    #[error("slug may only contain lowercase letters, digits and dashes")]
    InvalidSlug,
    #[error("color must be a hex value like #ff6600")]
    InvalidColor,
    #[error("{0} must be an http(s) URL")]
    InvalidUrl(&'static str),
}

/// A news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: NewsArticleId,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub body: String,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted for creating or replacing an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticleInput {
    pub title: String,
    /// Derived from the title when absent or blank.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    /// Set by `validate` when the slug came from the title.
    #[serde(skip)]
    derived_slug: bool,
}

impl NewsArticleInput {
    /// Trim fields and settle the slug.
    ///
    /// # Errors
    ///
    /// A blank title, a title that yields no slug, an explicit slug with
    /// characters outside `[a-z0-9-]`, or a non-http image URL.
    pub fn validate(mut self) -> Result<Self, ContentError> {
        self.title = required(&self.title, "title")?;
        self.summary = self.summary.trim().to_string();
        self.image_url = optional_url(self.image_url, "image_url")?;

        let slug = match self.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => {
                let valid = explicit.len() <= MAX_SLUG_LENGTH
                    && explicit
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                    && !explicit.starts_with('-')
                    && !explicit.ends_with('-');
                if !valid {
                    return Err(ContentError::InvalidSlug);
                }
                explicit.to_string()
            }
            _ => {
                self.derived_slug = true;
                slugify(&self.title).ok_or(ContentError::InvalidSlug)?
            }
        };
        self.slug = Some(slug);
        Ok(self)
    }

    /// The settled slug; empty before [`validate`](Self::validate).
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }

    /// Whether the slug was derived from the title rather than given.
    ///
    /// Only derived slugs may be suffixed to dodge a collision; an explicit
    /// slug that is taken is a conflict.
    #[must_use]
    pub const fn slug_is_derived(&self) -> bool {
        self.derived_slug
    }

    /// The slug to try on the given attempt: the settled slug first, then
    /// `-2`, `-3` and so on.
    #[must_use]
    pub fn slug_candidate(&self, attempt: u32) -> String {
        if attempt <= 1 {
            return self.slug().to_string();
        }
        let suffix = format!("-{attempt}");
        let base = self
            .slug()
            .get(..MAX_SLUG_LENGTH.saturating_sub(suffix.len()))
            .unwrap_or_else(|| self.slug())
            .trim_end_matches('-');
        format!("{base}{suffix}")
    }
}

/// Turn a title into a URL slug: ASCII lowercase words joined by dashes.
///
/// Returns `None` when nothing usable remains.
///
/// ```
/// use apogee_core::content::slugify;
///
/// assert_eq!(slugify("New 98mm Motor Cases!").as_deref(), Some("new-98mm-motor-cases"));
/// assert_eq!(slugify("  ?? "), None);
/// ```
#[must_use]
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LENGTH {
            break;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    (!slug.is_empty()).then_some(slug)
}

/// What a bulk request does to the selected articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Publish,
    Unpublish,
    Delete,
}

/// A slide in the home-page hero carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSlide {
    pub id: HeroSlideId,
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

/// Fields accepted for hero slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSlideInput {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl HeroSlideInput {
    /// # Errors
    ///
    /// Blank title, missing or non-http image URL, non-http link.
    pub fn validate(mut self) -> Result<Self, ContentError> {
        self.title = required(&self.title, "title")?;
        self.subtitle = self.subtitle.trim().to_string();
        self.image_url = required_url(&self.image_url, "image_url")?;
        self.link_url = optional_link(self.link_url, "link_url")?;
        Ok(self)
    }
}

/// An image in the product carousel strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselImage {
    pub id: CarouselImageId,
    pub image_url: String,
    pub alt_text: String,
    pub link_url: Option<String>,
    pub display_order: i32,
}

/// Fields accepted for carousel images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselImageInput {
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub link_url: Option<String>,
}

impl CarouselImageInput {
    /// # Errors
    ///
    /// Missing or non-http image URL, non-http link.
    pub fn validate(mut self) -> Result<Self, ContentError> {
        self.image_url = required_url(&self.image_url, "image_url")?;
        self.alt_text = self.alt_text.trim().to_string();
        self.link_url = optional_link(self.link_url, "link_url")?;
        Ok(self)
    }
}

/// A badge such as "New" or "Sale" shown on product cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLabel {
    pub id: ProductLabelId,
    pub name: String,
    pub color: String,
    pub display_order: i32,
}

/// Fields accepted for product labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLabelInput {
    pub name: String,
    pub color: String,
}

impl ProductLabelInput {
    /// Trim the name and lower-case the color.
    ///
    /// # Errors
    ///
    /// Blank name or a color that is not `#rrggbb`.
    pub fn validate(mut self) -> Result<Self, ContentError> {
        self.name = required(&self.name, "name")?;
        let color = self.color.trim().to_ascii_lowercase();
        let hex = color.strip_prefix('#').ok_or(ContentError::InvalidColor)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ContentError::InvalidColor);
        }
        self.color = color;
        Ok(self)
    }
}

const fn default_true() -> bool {
    true
}

fn required(value: &str, field: &'static str) -> Result<String, ContentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Required(field));
    }
    Ok(trimmed.to_string())
}

fn is_http_url(value: &str) -> bool {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace))
}

fn required_url(value: &str, field: &'static str) -> Result<String, ContentError> {
    let value = required(value, field)?;
    if !is_http_url(&value) {
        return Err(ContentError::InvalidUrl(field));
    }
    Ok(value)
}

fn optional_url(value: Option<String>, field: &'static str) -> Result<Option<String>, ContentError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if is_http_url(url) => Ok(Some(url.to_string())),
        Some(_) => Err(ContentError::InvalidUrl(field)),
    }
}

/// Links may also be site-relative paths such as `/products/12`.
fn optional_link(value: Option<String>, field: &'static str) -> Result<Option<String>, ContentError> {
    match value.as_deref().map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => Ok(Some(path.to_string())),
        _ => optional_url(value, field),
    }
}
