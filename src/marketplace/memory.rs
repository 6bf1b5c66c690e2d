//! In-memory marketplace, for tests and local demos

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::MarketplaceSource;
use crate::catalog::{Favorite, Professional, ServiceListing};
use crate::error::Result;
use crate::recommendation::Transaction;

#[derive(Default)]
pub struct InMemoryMarketplace {
    professionals: RwLock<Vec<Professional>>,
    listings: RwLock<Vec<ServiceListing>>,
    // Most recent first
    history: RwLock<HashMap<String, Vec<Transaction>>>,
    favorites: RwLock<HashMap<String, Vec<Favorite>>>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_professional(mut self, professional: Professional) -> Self {
        self.professionals.get_mut().push(professional);
        self
    }

    pub fn with_listing(mut self, listing: ServiceListing) -> Self {
        self.listings.get_mut().push(listing);
        self
    }

    /// Append a booking; later calls are treated as older bookings
    pub fn with_booking(mut self, user_id: &str, transaction: Transaction) -> Self {
        self.history
            .get_mut()
            .entry(user_id.to_string())
            .or_default()
            .push(transaction);
        self
    }

    pub fn with_favorite(mut self, user_id: &str, item_id: &str) -> Self {
        self.favorites
            .get_mut()
            .entry(user_id.to_string())
            .or_default()
            .push(Favorite::new(item_id));
        self
    }

    /// Record a new booking as the user's most recent one
    pub async fn record_booking(&self, user_id: &str, transaction: Transaction) {
        let mut history = self.history.write().await;
        history
            .entry(user_id.to_string())
            .or_default()
            .insert(0, transaction);
    }
}

#[async_trait]
impl MarketplaceSource for InMemoryMarketplace {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_history(&self, user_id: &str, limit: usize) -> Result<Vec<Transaction>> {
        let history = self.history.read().await;
        Ok(history
            .get(user_id)
            .map(|h| h.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_professionals(&self) -> Result<Vec<Professional>> {
        Ok(self.professionals.read().await.clone())
    }

    async fn fetch_listings(&self) -> Result<Vec<ServiceListing>> {
        Ok(self.listings.read().await.clone())
    }

    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let favorites = self.favorites.read().await;
        Ok(favorites.get(user_id).cloned().unwrap_or_default())
    }
}
