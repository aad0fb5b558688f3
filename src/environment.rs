use std::sync::Arc;

use log::Logger;

use crate::repository::{GamesRepository, ReviewsRepository};
use crate::store::{Backend, BackendKind};

/// Everything a request handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub games: Arc<GamesRepository>,
    pub reviews: Arc<ReviewsRepository>,
    pub backend: BackendKind,
}

impl Environment {
    /// Wires the repositories to the chosen backend.
    pub fn new(logger: Arc<Logger>, backend: Backend) -> Self {
        let Backend {
            kind,
            games,
            reviews,
        } = backend;

        let reviews = Arc::new(ReviewsRepository::new(reviews, logger.clone()));
        let games = Arc::new(GamesRepository::new(games, reviews.clone(), logger.clone()));

        Self {
            logger,
            games,
            reviews,
            backend: kind,
        }
    }
}
