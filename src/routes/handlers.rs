use std::time::{Duration, Instant};

use serde_json::Value;
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::environment::Environment;
use crate::errors::LibraryError;
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};

const SERVER_TIMING_HEADER: &str = "server-timing";
const LOCATION_HEADER: &str = "location";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

/// Runs the body, adding a `server-timing` header to whatever it
/// replies with. Errors skip the header.
macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn list_games(environment: Environment) -> RouteResult {
    timed! {
        let games = environment
            .games
            .list()
            .await
            .map_err(|e: LibraryError| Rejection::new(Context::list_games(), e))?;

        json(&games)
    }
}

pub async fn get_game(environment: Environment, id: String) -> RouteResult {
    timed! {
        let game = environment
            .games
            .get_by_id(&id)
            .await
            .map_err(|e| Rejection::new(Context::game(id.clone()), e))?;

        json(&game)
    }
}

pub async fn create_game(environment: Environment, body: Value) -> RouteResult {
    timed! {
        let game = environment
            .games
            .create(&body)
            .await
            .map_err(|e| Rejection::new(Context::create_game(), e))?;

        let location = format!("/api/games/{}", game.id);
        with_header(with_status(json(&game), StatusCode::CREATED), LOCATION_HEADER, location)
    }
}

pub async fn update_game(environment: Environment, id: String, body: Value) -> RouteResult {
    timed! {
        let game = environment
            .games
            .update(&id, &body)
            .await
            .map_err(|e| Rejection::new(Context::game(id.clone()), e))?;

        json(&game)
    }
}

pub async fn delete_game(environment: Environment, id: String) -> RouteResult {
    timed! {
        let game = environment
            .games
            .delete(&id)
            .await
            .map_err(|e| Rejection::new(Context::game(id.clone()), e))?;

        json(&game)
    }
}

pub async fn list_reviews(environment: Environment) -> RouteResult {
    timed! {
        let reviews = environment
            .reviews
            .list()
            .await
            .map_err(|e| Rejection::new(Context::list_reviews(), e))?;

        json(&reviews)
    }
}

pub async fn reviews_for_game(environment: Environment, game_id: String) -> RouteResult {
    timed! {
        let reviews = environment
            .reviews
            .list_by_game(&game_id)
            .await
            .map_err(|e| Rejection::new(Context::reviews_for_game(game_id.clone()), e))?;

        json(&reviews)
    }
}

pub async fn create_review(environment: Environment, body: Value) -> RouteResult {
    timed! {
        let review = environment
            .reviews
            .create(&body)
            .await
            .map_err(|e| Rejection::new(Context::create_review(), e))?;

        let location = format!("/api/reviews/{}", review.id);
        with_header(with_status(json(&review), StatusCode::CREATED), LOCATION_HEADER, location)
    }
}

pub async fn update_review(environment: Environment, id: String, body: Value) -> RouteResult {
    timed! {
        let review = environment
            .reviews
            .update(&id, &body)
            .await
            .map_err(|e| Rejection::new(Context::review(id.clone()), e))?;

        json(&review)
    }
}

pub async fn delete_review(environment: Environment, id: String) -> RouteResult {
    timed! {
        let review = environment
            .reviews
            .delete(&id)
            .await
            .map_err(|e| Rejection::new(Context::review(id.clone()), e))?;

        json(&review)
    }
}

pub async fn health(_environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Health { status: "ok" })
    }
}

pub async fn ping(_environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Ping { ok: true })
    }
}

fn format_server_timing(elapsed: Duration) -> String {
    format!("handler;dur={}", elapsed.as_secs_f64() * 1000.0)
}
