use std::sync::Arc;

use log::{debug, Logger};
use serde_json::Value;

use crate::compat::review::GAME_ID;
use crate::errors::{Kind, LibraryError, StorageError};
use crate::review::Review;
use crate::store::{FieldFilter, Store};

/// Reviews, validated on the way in.
pub struct ReviewsRepository {
    store: Arc<dyn Store<Review>>,
    logger: Arc<Logger>,
}

impl ReviewsRepository {
    pub fn new(store: Arc<dyn Store<Review>>, logger: Arc<Logger>) -> Self {
        ReviewsRepository { store, logger }
    }

    pub async fn list(&self) -> Result<Vec<Review>, LibraryError> {
        debug!(self.logger, "Listing reviews...");

        Ok(self.store.find_all().await?)
    }

    /// Lists the reviews of one game, including those stored under
    /// legacy field names.
    pub async fn list_by_game(&self, game_id: &str) -> Result<Vec<Review>, LibraryError> {
        debug!(self.logger, "Listing reviews for game..."; "game_id" => game_id);

        Ok(self.store.find_by_field(&by_game(game_id)).await?)
    }

    pub async fn create(&self, body: &Value) -> Result<Review, LibraryError> {
        let review = Review::from_payload(body)?;
        debug!(self.logger, "Creating review..."; "id" => &review.id, "game_id" => &review.game_id);

        self.store
            .insert(review)
            .await
            .map_err(LibraryError::from_write)
    }

    /// Merges the body into the stored review. Nothing is written if the
    /// result is invalid.
    pub async fn update(&self, id: &str, body: &Value) -> Result<Review, LibraryError> {
        debug!(self.logger, "Updating review..."; "id" => id);

        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found(Kind::Review, id))?;

        let updated = current.merged(body)?;

        self.store
            .update_by_id(id, updated)
            .await
            .map_err(LibraryError::from_write)?
            .ok_or_else(|| LibraryError::not_found(Kind::Review, id))
    }

    pub async fn delete(&self, id: &str) -> Result<Review, LibraryError> {
        debug!(self.logger, "Deleting review..."; "id" => id);

        self.store
            .delete_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found(Kind::Review, id))
    }

    /// Removes every review of a game, returning how many there were.
    pub async fn delete_for_game(&self, game_id: &str) -> Result<u64, StorageError> {
        let count = self.store.delete_where(&by_game(game_id)).await?;
        debug!(self.logger, "Deleted reviews for game"; "game_id" => game_id, "count" => count);

        Ok(count)
    }
}

fn by_game(game_id: &str) -> FieldFilter {
    FieldFilter::new(GAME_ID, game_id)
}
