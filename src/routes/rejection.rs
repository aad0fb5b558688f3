use serde::Serialize;
use warp::reject;

use crate::errors::LibraryError;

/// A failed request: what was being done, and what went wrong.
#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: LibraryError,
}

impl Rejection {
    pub fn new(context: Context, error: LibraryError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            error: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

/// The error body sent to clients.
#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) error: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    ListGames {},
    Game {
        id: String,
    },
    CreateGame {},
    ListReviews {},
    ReviewsForGame {
        #[serde(rename = "gameId")]
        game_id: String,
    },
    CreateReview {},
    Review {
        id: String,
    },
}

impl Context {
    pub fn list_games() -> Context {
        Context::ListGames {}
    }

    pub fn game(id: String) -> Context {
        Context::Game { id }
    }

    pub fn create_game() -> Context {
        Context::CreateGame {}
    }

    pub fn list_reviews() -> Context {
        Context::ListReviews {}
    }

    pub fn reviews_for_game(game_id: String) -> Context {
        Context::ReviewsForGame { game_id }
    }

    pub fn create_review() -> Context {
        Context::CreateReview {}
    }

    pub fn review(id: String) -> Context {
        Context::Review { id }
    }
}
