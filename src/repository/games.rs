use std::sync::Arc;

use log::{debug, error, Logger};
use serde_json::Value;

use super::ReviewsRepository;
use crate::errors::{Kind, LibraryError};
use crate::game::Game;
use crate::store::Store;

/// Games, validated on the way in. Deleting a game also deletes its
/// reviews.
pub struct GamesRepository {
    store: Arc<dyn Store<Game>>,
    reviews: Arc<ReviewsRepository>,
    logger: Arc<Logger>,
}

impl GamesRepository {
    pub fn new(
        store: Arc<dyn Store<Game>>,
        reviews: Arc<ReviewsRepository>,
        logger: Arc<Logger>,
    ) -> Self {
        GamesRepository {
            store,
            reviews,
            logger,
        }
    }

    pub async fn list(&self) -> Result<Vec<Game>, LibraryError> {
        debug!(self.logger, "Listing games...");

        Ok(self.store.find_all().await?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Game, LibraryError> {
        debug!(self.logger, "Retrieving game..."; "id" => id);

        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found(Kind::Game, id))
    }

    pub async fn create(&self, body: &Value) -> Result<Game, LibraryError> {
        let game = Game::from_payload(body)?;
        debug!(self.logger, "Creating game..."; "id" => &game.id, "title" => &game.title);

        self.store
            .insert(game)
            .await
            .map_err(LibraryError::from_write)
    }

    pub async fn update(&self, id: &str, body: &Value) -> Result<Game, LibraryError> {
        debug!(self.logger, "Updating game..."; "id" => id);

        let current = self.get_by_id(id).await?;
        let updated = current.merged(body);

        self.store
            .update_by_id(id, updated)
            .await
            .map_err(LibraryError::from_write)?
            .ok_or_else(|| LibraryError::not_found(Kind::Game, id))
    }

    /// Deletes a game, then its reviews. The game stays deleted even if
    /// the reviews could not be removed.
    pub async fn delete(&self, id: &str) -> Result<Game, LibraryError> {
        debug!(self.logger, "Deleting game..."; "id" => id);

        let game = self
            .store
            .delete_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found(Kind::Game, id))?;

        if let Err(source) = self.reviews.delete_for_game(&game.id).await {
            error!(self.logger, "Failed to delete reviews of deleted game"; "id" => &game.id, "error" => ?source);

            return Err(LibraryError::ReviewCascadeFailed {
                game_id: game.id,
                source,
            });
        }

        Ok(game)
    }
}
