use std::path::PathBuf;
use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::LibraryError;

mod handlers;
mod rejection;
mod response;

pub use internal::*;

/// The largest request body accepted.
const MAX_CONTENT_LENGTH: u64 = 1024 * 1024;

/// Builds the whole service: the API under `/api`, then the frontend if
/// there is one, with CORS open to any origin.
pub fn make_routes(
    environment: Environment,
    frontend_dir: Option<PathBuf>,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    warp::path("api")
        .and(make_api_routes(environment))
        .recover(move |r| format_rejection(logger.clone(), r))
        .or(make_frontend_route(frontend_dir))
        .with(cors)
}

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);
        error!(logger, "Request failed"; "context" => ?r.context, "error" => ?e, "status" => %status, "message" => %e);

        return Ok(with_status(json(&r.flatten()), status));
    }

    Err(rej)
}

fn status_code_for(e: &LibraryError) -> StatusCode {
    use LibraryError::*;

    match e {
        NotFound { .. } => StatusCode::NOT_FOUND,
        InvalidInput(..) => StatusCode::BAD_REQUEST,
        StorageUnavailable { .. } | ReviewCascadeFailed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

mod internal {
    use std::path::PathBuf;

    use serde_json::Value;
    use warp::filters::BoxedFilter;
    use warp::path::{end, param as par, Peek};
    use warp::reject;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete as d, get as g, path as p, post, put};

    use super::{handlers, MAX_CONTENT_LENGTH};
    use crate::compat::{self, Aliases};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let $route_variable = warp::any().map(move || environment.clone());

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler).boxed()
            }
        );
    }

    route!(make_list_games_route => list_games, rt; games(), end(), g());
    route!(make_get_game_route => get_game, rt; games(), par::<String>(), end(), g());
    route!(make_create_game_route => create_game, rt; games(), end(), post(), body());
    route!(make_update_game_route => update_game, rt; games(), par::<String>(), end(), put(), body());
    route!(make_delete_game_route => delete_game, rt; games(), par::<String>(), end(), d());
    route!(make_list_reviews_route => list_reviews, rt; reviews(), end(), g());
    route!(make_reviews_for_game_route => reviews_for_game, rt; reviews(), by_game(), par::<String>(), end(), g());
    route!(make_create_review_route => create_review, rt; reviews(), end(), post(), body());
    route!(make_update_review_route => update_review, rt; reviews(), par::<String>(), end(), put(), body());
    route!(make_delete_review_route => delete_review, rt; reviews(), par::<String>(), end(), d());
    route!(make_health_route => health, rt; p("health"), end(), g());
    route!(make_ping_route => ping, rt; p("test"), end(), g());

    /// Every API route, relative to `/api`.
    pub fn make_api_routes(environment: Environment) -> Route {
        make_list_games_route(environment.clone())
            .or(make_get_game_route(environment.clone()))
            .unify()
            .or(make_create_game_route(environment.clone()))
            .unify()
            .or(make_update_game_route(environment.clone()))
            .unify()
            .or(make_delete_game_route(environment.clone()))
            .unify()
            .or(make_list_reviews_route(environment.clone()))
            .unify()
            .or(make_reviews_for_game_route(environment.clone()))
            .unify()
            .or(make_create_review_route(environment.clone()))
            .unify()
            .or(make_update_review_route(environment.clone()))
            .unify()
            .or(make_delete_review_route(environment.clone()))
            .unify()
            .or(make_health_route(environment.clone()))
            .unify()
            .or(make_ping_route(environment))
            .unify()
            .boxed()
    }

    /// Serves a built frontend for every GET outside `/api`, falling
    /// back to its `index.html` so client-side routes work. Rejects
    /// everything when there is no frontend.
    pub fn make_frontend_route(dir: Option<PathBuf>) -> Route {
        let dir = match dir {
            Some(dir) => dir,
            None => {
                return warp::any()
                    .and_then(|| async { Err::<Box<dyn Reply>, _>(reject::not_found()) })
                    .boxed()
            }
        };

        let index = dir.join("index.html");

        g().and(outside_api())
            .and(warp::fs::dir(dir).or(warp::fs::file(index)).unify())
            .map(|file: warp::fs::File| Box::new(file) as Box<dyn Reply>)
            .boxed()
    }

    fn outside_api() -> BoxedFilter<()> {
        warp::path::peek()
            .and_then(|peek: Peek| async move {
                let first = peek.segments().next().unwrap_or_default();

                if first == "api" {
                    Err(reject::not_found())
                } else {
                    Ok(())
                }
            })
            .untuple_one()
            .boxed()
    }

    fn body() -> BoxedFilter<(Value,)> {
        warp::body::content_length_limit(MAX_CONTENT_LENGTH)
            .and(warp::body::json())
            .boxed()
    }

    fn games() -> BoxedFilter<()> {
        prefix(compat::routes::GAMES)
    }

    fn reviews() -> BoxedFilter<()> {
        prefix(compat::routes::REVIEWS)
    }

    fn by_game() -> BoxedFilter<()> {
        prefix(compat::routes::BY_GAME)
    }

    /// Matches one path segment against any of several names.
    fn prefix(names: Aliases) -> BoxedFilter<()> {
        names[1..]
            .iter()
            .fold(p(names[0]).boxed(), |filter, name| {
                filter.or(p(*name)).unify().boxed()
            })
    }
}
