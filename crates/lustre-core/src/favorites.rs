use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered set of favorited product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    ids: Vec<Uuid>,
}

impl Favorites {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product_id: Uuid) {
        if !self.contains(product_id) {
            self.ids.push(product_id);
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.ids.retain(|id| *id != product_id);
    }

    /// Flips membership and returns whether the product is now a favorite.
    pub fn toggle(&mut self, product_id: Uuid) -> bool {
        if self.contains(product_id) {
            self.remove(product_id);
            false
        } else {
            self.ids.push(product_id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: Uuid) -> bool {
        self.ids.contains(&product_id)
    }

    #[must_use]
    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
