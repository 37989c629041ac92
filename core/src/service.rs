use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::{IndexedRandom, SliceRandom};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::mealdb::{RawMeal, decode_meals};
use crate::models::MealCategory;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_RANDOM_COUNT: usize = 6;

/// Where the full meal collection comes from.
///
/// The CLI implements this with reqwest; tests use an in-memory fake.
#[async_trait]
pub trait MealSource: Send + Sync {
    /// Fetch the collection body as JSON, in whatever envelope the remote uses.
    async fn fetch_all(&self) -> Result<Value>;
}

/// Query surface over a cached snapshot of the remote meal collection.
///
/// Every query degrades to an empty result when the collection cannot be
/// fetched or decoded; the failure is logged, never returned.
pub struct MealCatalog {
    source: Arc<dyn MealSource>,
    clock: Arc<dyn Clock>,
    snapshot: Mutex<TtlCache<Arc<Vec<RawMeal>>>>,
}

impl MealCatalog {
    pub fn new(source: Arc<dyn MealSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), DEFAULT_CACHE_TTL)
    }

    pub fn with_clock(source: Arc<dyn MealSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            snapshot: Mutex::new(TtlCache::new(ttl)),
        }
    }

    /// The whole collection, fetched at most once per TTL window.
    ///
    /// The snapshot lock is held across the fetch so concurrent callers that
    /// miss together share one request.
    pub async fn fetch_all_once(&self) -> Arc<Vec<RawMeal>> {
        let mut snapshot = self.snapshot.lock().await;
        if let Some(meals) = snapshot.get(self.clock.now()) {
            return Arc::clone(meals);
        }

        tracing::info!("fetching meal collection");
        let meals = match self.source.fetch_all().await.and_then(decode_meals) {
            Ok(meals) => Arc::new(meals),
            Err(err) => {
                tracing::error!("failed to load meal collection: {err:#}");
                return Arc::new(Vec::new());
            }
        };

        tracing::debug!(
            count = meals.len(),
            sample_keys = ?meals.first().map(|m| m.0.keys().cloned().collect::<Vec<_>>()),
            "fetched meal collection"
        );
        snapshot.put(Arc::clone(&meals), self.clock.now());
        meals
    }

    pub async fn search_by_name(&self, query: &str) -> Vec<RawMeal> {
        let query = query.to_lowercase();
        self.fetch_all_once()
            .await
            .iter()
            .filter(|m| {
                m.title()
                    .is_some_and(|title| title.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<RawMeal> {
        self.fetch_all_once()
            .await
            .iter()
            .find(|m| m.has_id(id))
            .cloned()
    }

    pub async fn random_meal(&self) -> Option<RawMeal> {
        let all = self.fetch_all_once().await;
        all.choose(&mut rand::rng()).cloned()
    }

    /// Up to `count` distinct meals in random order.
    pub async fn random_meals(&self, count: usize) -> Vec<RawMeal> {
        let mut meals = self.fetch_all_once().await.to_vec();
        meals.shuffle(&mut rand::rng());
        meals.truncate(count);
        meals
    }

    /// Distinct categories in order of first appearance.
    pub async fn categories(&self) -> Vec<MealCategory> {
        let all = self.fetch_all_once().await;
        let mut categories: Vec<MealCategory> = Vec::new();
        for meal in all.iter() {
            let Some(name) = meal.category() else {
                continue;
            };
            // Later meals overwrite the thumbnail of an existing category.
            if let Some(existing) = categories.iter_mut().find(|c| c.name == name) {
                existing.thumbnail = meal.thumbnail();
            } else {
                categories.push(MealCategory {
                    id: categories.len() + 1,
                    name,
                    thumbnail: meal.thumbnail(),
                    description: String::new(),
                });
            }
        }
        categories
    }

    pub async fn filter_by_category(&self, category: &str) -> Vec<RawMeal> {
        self.fetch_all_once()
            .await
            .iter()
            .filter(|m| m.text("strCategory").as_deref() == Some(category))
            .cloned()
            .collect()
    }

    pub async fn filter_by_ingredient(&self, ingredient: &str) -> Vec<RawMeal> {
        self.fetch_all_once()
            .await
            .iter()
            .filter(|m| m.uses_ingredient(ingredient))
            .cloned()
            .collect()
    }
}
