//! News, hero slides and carousel images.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use apogee_core::content::{
    BulkAction, CarouselImage, CarouselImageInput, HeroSlide, HeroSlideInput, NewsArticle,
    NewsArticleInput,
};
use apogee_core::{CarouselImageId, HeroSlideId, NewsArticleId};

use super::{OrderedTable, RepositoryError, apply_order, next_display_order};

const NEWS_COLUMNS: &str = "id, title, slug, summary, body, image_url, is_published, \
                            published_at, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct NewsRow {
    id: NewsArticleId,
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
            id: row.id,
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
    id: HeroSlideId,
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
            id: row.id,
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
    id: CarouselImageId,
    image_url: String,
    alt_text: String,
    link_url: Option<String>,
    display_order: i32,
}

impl From<CarouselRow> for CarouselImage {
    fn from(row: CarouselRow) -> Self {
        Self {
            id: row.id,
            image_url: row.image_url,
            alt_text: row.alt_text,
            link_url: row.link_url,
            display_order: row.display_order,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for home page content.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -------------------------------------------------------------------------
    // News
    // -------------------------------------------------------------------------

    /// Every article, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn news(&self) -> Result<Vec<NewsArticle>, RepositoryError> {
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM shop.news_article ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(NewsArticle::from).collect())
    }

    /// Get an article by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn article(&self, id: NewsArticleId) -> Result<Option<NewsArticle>, RepositoryError> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {NEWS_COLUMNS} FROM shop.news_article WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(NewsArticle::from))
    }

    /// Insert a validated article. Publishing stamps `published_at`.
    ///
    /// A slug derived from the title gets a numeric suffix (`-2`, `-3`, ...)
    /// when another article already uses it.
    ///
    /// # Errors
    ///
    /// `Conflict` when an explicit slug is taken.
    pub async fn create_article(
        &self,
        input: &NewsArticleInput,
    ) -> Result<NewsArticle, RepositoryError> {
        let row = with_free_slug(input, |slug| self.insert_article(input, slug))
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("article insert returned no row".to_string()))?;
        Ok(row.into())
    }

    async fn insert_article(
        &self,
        input: &NewsArticleInput,
        slug: String,
    ) -> Result<Option<NewsRow>, sqlx::Error> {
        sqlx::query_as::<_, NewsRow>(&format!(
            r"
            INSERT INTO shop.news_article (
                title, slug, summary, body, image_url, is_published, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $6 THEN now() END)
            RETURNING {NEWS_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(slug)
        .bind(&input.summary)
        .bind(&input.body)
        .bind(input.image_url.as_deref())
        .bind(input.is_published)
        .fetch_optional(self.pool)
        .await
    }

    /// Replace an article. `published_at` is set the first time it is
    /// published and kept afterwards. Derived slugs are suffixed as in
    /// [`create_article`](Self::create_article).
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids, `Conflict` when an explicit slug is taken.
    pub async fn update_article(
        &self,
        id: NewsArticleId,
        input: &NewsArticleInput,
    ) -> Result<NewsArticle, RepositoryError> {
        let row = with_free_slug(input, |slug| self.replace_article(id, input, slug))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("article {id}")))?;
        Ok(row.into())
    }

    async fn replace_article(
        &self,
        id: NewsArticleId,
        input: &NewsArticleInput,
        slug: String,
    ) -> Result<Option<NewsRow>, sqlx::Error> {
        sqlx::query_as::<_, NewsRow>(&format!(
            r"
            UPDATE shop.news_article
            SET title = $2, slug = $3, summary = $4, body = $5, image_url = $6,
                is_published = $7,
                published_at = CASE WHEN $7 AND published_at IS NULL THEN now()
                                    ELSE published_at END,
                updated_at = now()
            WHERE id = $1
            RETURNING {NEWS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(slug)
        .bind(&input.summary)
        .bind(&input.body)
        .bind(input.image_url.as_deref())
        .bind(input.is_published)
        .fetch_optional(self.pool)
        .await
    }

    /// Delete an article.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn delete_article(&self, id: NewsArticleId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.news_article WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply one action to several articles, all or nothing.
    ///
    /// Returns the number of articles affected.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the first unknown id; nothing is written then.
    pub async fn bulk_news(
        &self,
        action: BulkAction,
        ids: &[NewsArticleId],
    ) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(NewsArticleId::as_i32).collect();
        let mut tx = self.pool.begin().await?;

        let found: Vec<(i32,)> =
            sqlx::query_as("SELECT id FROM shop.news_article WHERE id = ANY($1) FOR UPDATE")
                .bind(&ids)
                .fetch_all(&mut *tx)
                .await?;
        if let Some(missing) = ids
            .iter()
            .find(|id| !found.iter().any(|(found_id,)| found_id == *id))
        {
            return Err(RepositoryError::NotFound(format!("article {missing}")));
        }

        let sql = match action {
            BulkAction::Publish => {
                r"
                UPDATE shop.news_article
                SET is_published = TRUE,
                    published_at = COALESCE(published_at, now()),
                    updated_at = now()
                WHERE id = ANY($1)
                "
            }
            BulkAction::Unpublish => {
                "UPDATE shop.news_article SET is_published = FALSE, updated_at = now() WHERE id = ANY($1)"
            }
            BulkAction::Delete => "DELETE FROM shop.news_article WHERE id = ANY($1)",
        };
        let result = sqlx::query(sql).bind(&ids).execute(&mut *tx).await?;

        tx.commit().await?;
        tracing::info!(?action, affected = result.rows_affected(), "Bulk news action");
        Ok(result.rows_affected())
    }

    // -------------------------------------------------------------------------
    // Hero slides
    // -------------------------------------------------------------------------

    /// All slides, inactive ones included, in display order.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn hero_slides(&self) -> Result<Vec<HeroSlide>, RepositoryError> {
        let rows = sqlx::query_as::<_, HeroSlideRow>(
            r"
            SELECT id, title, subtitle, image_url, link_url, is_active, display_order
            FROM shop.hero_slide
            ORDER BY display_order, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(HeroSlide::from).collect())
    }

    /// Append a slide at the end.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn create_hero_slide(
        &self,
        input: &HeroSlideInput,
    ) -> Result<HeroSlide, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let display_order = next_display_order(&mut tx, OrderedTable::HeroSlide).await?;

        let row = sqlx::query_as::<_, HeroSlideRow>(
            r"
            INSERT INTO shop.hero_slide (title, subtitle, image_url, link_url, is_active, display_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, subtitle, image_url, link_url, is_active, display_order
            ",
        )
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(input.link_url.as_deref())
        .bind(input.is_active)
        .bind(display_order)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Replace a slide's fields, keeping its position.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub async fn update_hero_slide(
        &self,
        id: HeroSlideId,
        input: &HeroSlideInput,
    ) -> Result<HeroSlide, RepositoryError> {
        let row = sqlx::query_as::<_, HeroSlideRow>(
            r"
            UPDATE shop.hero_slide
            SET title = $2, subtitle = $3, image_url = $4, link_url = $5, is_active = $6
            WHERE id = $1
            RETURNING id, title, subtitle, image_url, link_url, is_active, display_order
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(input.link_url.as_deref())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("hero slide {id}")))?;

        Ok(row.into())
    }

    /// Delete a slide.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn delete_hero_slide(&self, id: HeroSlideId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.hero_slide WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Put slides in the given order.
    ///
    /// # Errors
    ///
    /// `Invalid` unless `ids` names every slide exactly once.
    pub async fn reorder_hero_slides(
        &self,
        ids: &[HeroSlideId],
    ) -> Result<Vec<HeroSlide>, RepositoryError> {
        let requested: Vec<i32> = ids.iter().map(HeroSlideId::as_i32).collect();

        let mut tx = self.pool.begin().await?;
        apply_order(&mut tx, OrderedTable::HeroSlide, &requested).await?;
        tx.commit().await?;

        self.hero_slides().await
    }

    // -------------------------------------------------------------------------
    // Carousel
    // -------------------------------------------------------------------------

    /// All carousel images in display order.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
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

    /// Append an image at the end.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn create_carousel_image(
        &self,
        input: &CarouselImageInput,
    ) -> Result<CarouselImage, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let display_order = next_display_order(&mut tx, OrderedTable::CarouselImage).await?;

        let row = sqlx::query_as::<_, CarouselRow>(
            r"
            INSERT INTO shop.carousel_image (image_url, alt_text, link_url, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id, image_url, alt_text, link_url, display_order
            ",
        )
        .bind(&input.image_url)
        .bind(&input.alt_text)
        .bind(input.link_url.as_deref())
        .bind(display_order)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Replace an image's fields, keeping its position.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub async fn update_carousel_image(
        &self,
        id: CarouselImageId,
        input: &CarouselImageInput,
    ) -> Result<CarouselImage, RepositoryError> {
        let row = sqlx::query_as::<_, CarouselRow>(
            r"
            UPDATE shop.carousel_image SET image_url = $2, alt_text = $3, link_url = $4
            WHERE id = $1
            RETURNING id, image_url, alt_text, link_url, display_order
            ",
        )
        .bind(id)
        .bind(&input.image_url)
        .bind(&input.alt_text)
        .bind(input.link_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("carousel image {id}")))?;

        Ok(row.into())
    }

    /// Delete a carousel image.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn delete_carousel_image(&self, id: CarouselImageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.carousel_image WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Put carousel images in the given order.
    ///
    /// # Errors
    ///
    /// `Invalid` unless `ids` names every image exactly once.
    pub async fn reorder_carousel_images(
        &self,
        ids: &[CarouselImageId],
    ) -> Result<Vec<CarouselImage>, RepositoryError> {
        let requested: Vec<i32> = ids.iter().map(CarouselImageId::as_i32).collect();

        let mut tx = self.pool.begin().await?;
        apply_order(&mut tx, OrderedTable::CarouselImage, &requested).await?;
        tx.commit().await?;

        self.carousel_images().await
    }
}

fn slug_taken(err: sqlx::Error, slug: &str) -> RepositoryError {
    RepositoryError::from_unique(err, || format!("slug \"{slug}\" is already used"))
}

/// Derived slugs tried before giving up with a conflict.
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Run an article write, moving a derived slug along `-2`, `-3`, ... while
/// it collides.
async fn with_free_slug<F, Fut>(
    input: &NewsArticleInput,
    mut write: F,
) -> Result<Option<NewsRow>, RepositoryError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<NewsRow>, sqlx::Error>>,
{
    let mut attempt = 1;
    loop {
        let slug = input.slug_candidate(attempt);
        match write(slug.clone()).await {
            Ok(row) => return Ok(row),
            Err(sqlx::Error::Database(db))
                if db.is_unique_violation()
                    && input.slug_is_derived()
                    && attempt < MAX_SLUG_ATTEMPTS =>
            {
                tracing::debug!(slug = %slug, "Derived slug taken, trying the next suffix");
                attempt += 1;
            }
            Err(e) => return Err(slug_taken(e, &slug)),
        }
    }
}
