//! PostgreSQL marketplace
//!
//! Reads the tables created by `migrations/`. Every query goes through
//! [`with_retry`] so pool timeouts and dropped connections are retried with
//! backoff before surfacing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, instrument};

use super::MarketplaceSource;
use crate::catalog::{Favorite, ListingLocation, Professional, ServiceListing};
use crate::database::with_retry;
use crate::error::{Error, Result};
use crate::recommendation::history::TransactionLocation;
use crate::recommendation::Transaction;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct PgMarketplace {
    pool: PgPool,
}

impl PgMarketplace {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    category: Option<String>,
    price: Option<f64>,
    city: Option<String>,
}

impl From<HistoryRow> for Transaction {
    fn from(row: HistoryRow) -> Self {
        Transaction {
            category: row.category,
            price: row.price,
            location: row.city.map(|city| TransactionLocation { city: Some(city) }),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfessionalRow {
    id: String,
    name: Option<String>,
    avatar_url: Option<String>,
    verified: Option<bool>,
}

impl From<ProfessionalRow> for Professional {
    fn from(row: ProfessionalRow) -> Self {
        Professional {
            id: row.id,
            name: row.name,
            avatar_url: row.avatar_url,
            verified: row.verified,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: String,
    professional_id: String,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    price: Option<f64>,
    rating: Option<f64>,
    review_count: Option<i32>,
    total_bookings: Option<i32>,
    city: Option<String>,
    neighborhoods: Option<Vec<String>>,
    payment_methods: Option<Vec<String>>,
    images: Option<Vec<String>>,
    duration_minutes: Option<i32>,
    created_at: Option<DateTime<Utc>>,
}

impl From<ListingRow> for ServiceListing {
    fn from(row: ListingRow) -> Self {
        let location = (row.city.is_some() || row.neighborhoods.is_some()).then(|| {
            ListingLocation {
                city: row.city,
                neighborhoods: row.neighborhoods,
            }
        });

        ServiceListing {
            id: row.id,
            professional_id: row.professional_id,
            title: row.title,
            description: row.description,
            category: row.category,
            price: row.price,
            rating: row.rating,
            // Negative counts are treated as missing
            review_count: row.review_count.and_then(|v| u32::try_from(v).ok()),
            total_bookings: row.total_bookings.and_then(|v| u32::try_from(v).ok()),
            location,
            payment_methods: row.payment_methods,
            images: row.images,
            duration_minutes: row.duration_minutes.and_then(|v| u32::try_from(v).ok()),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MarketplaceSource for PgMarketplace {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database {
                message: format!("Health check failed: {}", e).into(),
                source: Some(e),
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_history(&self, user_id: &str, limit: usize) -> Result<Vec<Transaction>> {
        let pool = &self.pool;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = with_retry(
            || async move {
                sqlx::query_as::<_, HistoryRow>(
                    r#"
                    SELECT COALESCE(b.category, s.category) AS category,
                           COALESCE(b.price, s.price)       AS price,
                           COALESCE(b.city, s.city)         AS city
                    FROM bookings b
                    LEFT JOIN services s ON s.id = b.service_id
                    WHERE b.user_id = $1 AND b.status = 'completed'
                    ORDER BY b.created_at DESC
                    LIMIT $2
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(pool)
                .await
                .map_err(Error::from)
            },
            MAX_RETRIES,
            RETRY_DELAY,
        )
        .await?;

        debug!("Fetched {} completed bookings for {}", rows.len(), user_id);
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_professionals(&self) -> Result<Vec<Professional>> {
        let pool = &self.pool;

        let rows = with_retry(
            || async move {
                sqlx::query_as::<_, ProfessionalRow>(
                    "SELECT id, name, avatar_url, verified FROM professionals",
                )
                .fetch_all(pool)
                .await
                .map_err(Error::from)
            },
            MAX_RETRIES,
            RETRY_DELAY,
        )
        .await?;

        Ok(rows.into_iter().map(Professional::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_listings(&self) -> Result<Vec<ServiceListing>> {
        let pool = &self.pool;

        let rows = with_retry(
            || async move {
                sqlx::query_as::<_, ListingRow>(
                    r#"
                    SELECT id, professional_id, title, description, category,
                           price, rating, review_count, total_bookings,
                           city, neighborhoods, payment_methods, images,
                           duration_minutes, created_at
                    FROM services
                    WHERE active
                    ORDER BY created_at DESC NULLS LAST, id
                    "#,
                )
                .fetch_all(pool)
                .await
                .map_err(Error::from)
            },
            MAX_RETRIES,
            RETRY_DELAY,
        )
        .await?;

        debug!("Fetched {} active listings", rows.len());
        Ok(rows.into_iter().map(ServiceListing::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let pool = &self.pool;

        let item_ids: Vec<String> = with_retry(
            || async move {
                sqlx::query_scalar::<_, String>(
                    "SELECT item_id FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await
                .map_err(Error::from)
            },
            MAX_RETRIES,
            RETRY_DELAY,
        )
        .await?;

        Ok(item_ids.into_iter().map(|item_id| Favorite { item_id }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_row_conversion() {
        let row = ListingRow {
            id: "s1".to_string(),
            professional_id: "p1".to_string(),
            title: Some("Yoga".to_string()),
            description: None,
            category: None,
            price: Some(80.0),
            rating: None,
            review_count: Some(-3),
            total_bookings: Some(12),
            city: None,
            neighborhoods: None,
            payment_methods: None,
            images: None,
            duration_minutes: None,
            created_at: None,
        };

        let listing = ServiceListing::from(row);
        assert_eq!(listing.review_count, None);
        assert_eq!(listing.total_bookings, Some(12));
        assert!(listing.location.is_none());
    }

    #[test]
    fn test_history_row_conversion() {
        let tx = Transaction::from(HistoryRow {
            category: Some("spa".to_string()),
            price: None,
            city: Some("Rosario".to_string()),
        });
        assert_eq!(tx.category.as_deref(), Some("spa"));
        assert_eq!(tx.price, None);
        assert_eq!(
            tx.location.and_then(|l| l.city).as_deref(),
            Some("Rosario")
        );
    }
}
