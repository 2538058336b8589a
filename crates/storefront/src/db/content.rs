//! Published content: news, hero slides and the carousel.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use apogee_core::content::{CarouselImage, HeroSlide, NewsArticle};
use apogee_core::{CarouselImageId, HeroSlideId, NewsArticleId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct NewsRow {
    id: i32,
    title: String,
    slug: String,
    summary: String,
    body: String,
    image_url: Option<String>,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NewsRow> for NewsArticle {
    fn from(row: NewsRow) -> Self {
        Self {
            id: NewsArticleId::new(row.id),
            title: row.title,
            slug: row.slug,
            summary: row.summary,
            body: row.body,
            image_url: row.image_url,
            is_published: row.is_published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HeroSlideRow {
    id: i32,
    title: String,
    subtitle: String,
    image_url: String,
    link_url: Option<String>,
    is_active: bool,
    display_order: i32,
}

impl From<HeroSlideRow> for HeroSlide {
    fn from(row: HeroSlideRow) -> Self {
        Self {
            id: HeroSlideId::new(row.id),
            title: row.title,
            subtitle: row.subtitle,
            image_url: row.image_url,
            link_url: row.link_url,
            is_active: row.is_active,
            display_order: row.display_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CarouselRow {
    id: i32,
    image_url: String,
    alt_text: String,
    link_url: Option<String>,
    display_order: i32,
}

impl From<CarouselRow> for CarouselImage {
    fn from(row: CarouselRow) -> Self {
        Self {
            id: CarouselImageId::new(row.id),
            image_url: row.image_url,
            alt_text: row.alt_text,
            link_url: row.link_url,
            display_order: row.display_order,
        }
    }
}

/// Read-only access to published content.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published articles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_news(&self, limit: i64) -> Result<Vec<NewsArticle>, RepositoryError> {
        let rows = sqlx::query_as::<_, NewsRow>(
            r"
            SELECT id, title, slug, summary, body, image_url, is_published,
                   published_at, created_at, updated_at
            FROM shop.news_article
            WHERE is_published
            ORDER BY published_at DESC NULLS LAST, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(NewsArticle::from).collect())
    }

    /// A published article by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_article(&self, slug: &str) -> Result<Option<NewsArticle>, RepositoryError> {
        let row = sqlx::query_as::<_, NewsRow>(
            r"
            SELECT id, title, slug, summary, body, image_url, is_published,
                   published_at, created_at, updated_at
            FROM shop.news_article
            WHERE slug = $1 AND is_published
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(NewsArticle::from))
    }

    /// Active hero slides in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_hero_slides(&self) -> Result<Vec<HeroSlide>, RepositoryError> {
        let rows = sqlx::query_as::<_, HeroSlideRow>(
            r"
            SELECT id, title, subtitle, image_url, link_url, is_active, display_order
            FROM shop.hero_slide
            WHERE is_active
            ORDER BY display_order, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(HeroSlide::from).collect())
    }

    /// Carousel images in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn carousel_images(&self) -> Result<Vec<CarouselImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, CarouselRow>(
            r"
            SELECT id, image_url, alt_text, link_url, display_order
            FROM shop.carousel_image
            ORDER BY display_order, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CarouselImage::from).collect())
    }
}
