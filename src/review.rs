use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::compat::review as fields;
use crate::errors::LibraryError;
use crate::game::supplied_id;
use crate::id::new_id;
use crate::normalization::{deserialize_whole, fold};
use crate::payload::{is_truthy, to_number, Payload};
use crate::store::Record;
use crate::timestamp;

const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 5.0;
const DEFAULT_RATING: f64 = 3.0;

/// A review of a game in the library.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// The ID of the review.
    pub id: String,

    /// The ID of the game being reviewed.
    #[serde(alias = "juegoId", alias = "reviewGame")]
    pub game_id: String,

    /// A rating from 1 to 5.
    #[serde(alias = "puntuacion", deserialize_with = "deserialize_whole")]
    pub rating: u8,

    #[serde(alias = "textoReseña", alias = "textoResena", alias = "contenido")]
    pub review_text: String,

    #[serde(alias = "horasJugadas")]
    pub hours_played: f64,

    #[serde(alias = "dificultad")]
    pub difficulty: Difficulty,

    /// Whether the reviewer would recommend the game.
    #[serde(alias = "recomendaria")]
    pub recommends: bool,

    #[serde(
        alias = "fechaCreacion",
        with = "time::serde::rfc3339",
        default = "timestamp::now"
    )]
    pub created_at: OffsetDateTime,

    #[serde(
        alias = "fechaActualizacion",
        with = "time::serde::rfc3339",
        default = "timestamp::now"
    )]
    pub updated_at: OffsetDateTime,
}

/// How hard the reviewer found the game.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    #[serde(alias = "Fácil")]
    Easy,
    Normal,
    #[serde(alias = "Difícil")]
    Hard,
}

impl Difficulty {
    /// Matches free text against the known names, ignoring case and
    /// accents.
    pub fn from_loose(text: &str) -> Option<Self> {
        match fold(text).as_str() {
            "easy" | "facil" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" | "dificil" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Matches only the exact spelling of a known name.
    pub fn from_exact(text: &str) -> Option<Self> {
        match text {
            "Easy" | "Fácil" => Some(Difficulty::Easy),
            "Normal" => Some(Difficulty::Normal),
            "Hard" | "Difícil" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Normal
    }
}

impl Review {
    /// Builds a new review from a request body. Only a missing game ID
    /// or review text is an error; every other field falls back to a
    /// default when unusable.
    pub fn from_payload(body: &Value) -> Result<Self, LibraryError> {
        let payload = Payload::new(body);

        let game_id = payload.string(fields::GAME_ID).unwrap_or_default().to_owned();
        let review_text = payload.trimmed(fields::REVIEW_TEXT);

        if game_id.is_empty() || review_text.is_empty() {
            return Err(LibraryError::invalid("gameId and reviewText are required"));
        }

        let mut rating = payload.number_or_null(fields::RATING);
        if !rating.is_finite() {
            rating = DEFAULT_RATING;
        }

        let mut hours_played = payload.number(fields::HOURS_PLAYED);
        if !hours_played.is_finite() || hours_played < 0.0 {
            hours_played = 0.0;
        }

        let difficulty = payload
            .value(fields::DIFFICULTY)
            .map(loose_text)
            .and_then(|text| Difficulty::from_loose(&text))
            .unwrap_or_default();

        let created_at = payload
            .value(fields::CREATED_AT)
            .and_then(timestamp::parse)
            .unwrap_or_else(timestamp::now);
        let updated_at = payload
            .value(fields::UPDATED_AT)
            .and_then(timestamp::parse)
            .unwrap_or(created_at);

        Ok(Review {
            id: supplied_id(&payload).unwrap_or_else(new_id),
            game_id,
            rating: clamp_rating(rating),
            review_text,
            hours_played,
            difficulty,
            recommends: payload.truthy(fields::RECOMMENDS),
            created_at,
            updated_at,
        })
    }

    /// Returns a copy with the supplied fields merged in, or an error if
    /// the merged review is not valid. Unlike creation, nothing is
    /// silently corrected.
    pub fn merged(&self, body: &Value) -> Result<Self, LibraryError> {
        let payload = Payload::new(body);

        let game_id = payload
            .string(fields::GAME_ID)
            .map(str::to_owned)
            .unwrap_or_else(|| self.game_id.clone());
        if game_id.is_empty() {
            return Err(LibraryError::invalid("gameId must not be empty"));
        }

        let review_text = payload
            .string(fields::REVIEW_TEXT)
            .map(|text| text.trim().to_owned())
            .unwrap_or_else(|| self.review_text.clone());
        if review_text.is_empty() {
            return Err(LibraryError::invalid("reviewText must not be empty"));
        }

        let rating = payload
            .value(fields::RATING)
            .map(to_number)
            .unwrap_or_else(|| f64::from(self.rating));
        if !rating.is_finite() || rating < MIN_RATING || rating > MAX_RATING {
            return Err(LibraryError::invalid("rating must be between 1 and 5"));
        }

        let hours_played = payload
            .value(fields::HOURS_PLAYED)
            .map(to_number)
            .unwrap_or(self.hours_played);
        if !hours_played.is_finite() || hours_played < 0.0 {
            return Err(LibraryError::invalid(
                "hoursPlayed must be a non-negative number",
            ));
        }

        let difficulty = match payload.value(fields::DIFFICULTY) {
            Some(value) => value
                .as_str()
                .and_then(Difficulty::from_exact)
                .ok_or_else(|| LibraryError::invalid("difficulty must be Easy, Normal or Hard"))?,
            None => self.difficulty,
        };

        let recommends = payload
            .value(fields::RECOMMENDS)
            .map(is_truthy)
            .unwrap_or(self.recommends);

        Ok(Review {
            id: self.id.clone(),
            game_id,
            rating: clamp_rating(rating),
            review_text,
            hours_played,
            difficulty,
            recommends,
            created_at: self.created_at,
            updated_at: timestamp::now(),
        })
    }
}

impl Record for Review {
    const COLLECTION: &'static str = "reviews";
    const TIMESTAMP_FIELDS: &'static [&'static str] = &["createdAt", "updatedAt"];

    fn id(&self) -> &str {
        &self.id
    }
}

fn clamp_rating(rating: f64) -> u8 {
    rating.max(MIN_RATING).min(MAX_RATING).round() as u8
}

/// Renders a payload value as text the way string concatenation would.
fn loose_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::{Difficulty, Review};
    use crate::errors::LibraryError;

    fn great_game() -> serde_json::Value {
        json!({
            "gameId": "game-1",
            "reviewText": "Great game",
            "hoursPlayed": 40,
            "rating": 10,
            "difficulty": "unknown",
            "recommends": true
        })
    }

    fn assert_invalid(result: Result<Review, LibraryError>) {
        match result {
            Err(LibraryError::InvalidInput(_)) => {}
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn creation_clamps_and_defaults() {
        let review = Review::from_payload(&great_game()).expect("create review");

        assert_eq!(review.rating, 5);
        assert_eq!(review.difficulty, Difficulty::Normal);
        assert_eq!(review.hours_played, 40.0);
        assert!(review.recommends);
        assert_eq!(review.updated_at, review.created_at);
    }

    #[test]
    fn creation_replaces_unusable_numbers() {
        let review = Review::from_payload(&json!({
            "juegoId": "game-1",
            "textoReseña": "  Meh  ",
            "puntuacion": "lots",
            "horasJugadas": -3,
            "dificultad": "DIFÍCIL"
        }))
        .expect("create review");

        assert_eq!(review.game_id, "game-1");
        assert_eq!(review.review_text, "Meh");
        assert_eq!(review.rating, 3);
        assert_eq!(review.hours_played, 0.0);
        assert_eq!(review.difficulty, Difficulty::Hard);
        assert!(!review.recommends);
    }

    #[test]
    fn null_rating_clamps_to_the_minimum() {
        let review = Review::from_payload(&json!({
            "gameId": "g",
            "reviewText": "x",
            "rating": null
        }))
        .expect("create review");
        assert_eq!(review.rating, 1);

        let review = Review::from_payload(&json!({ "gameId": "g", "reviewText": "x" }))
            .expect("create review");
        assert_eq!(review.rating, 3);
    }

    #[test]
    fn creation_requires_game_and_text() {
        assert_invalid(Review::from_payload(&json!({ "reviewText": "No game" })));
        assert_invalid(Review::from_payload(&json!({ "gameId": "g", "reviewText": "   " })));
        assert_invalid(Review::from_payload(&json!({ "gameId": 7, "reviewText": "Numeric game" })));
    }

    #[test]
    fn creation_accepts_every_text_alias() {
        for name in &["reviewText", "textoReseña", "textoResena", "reviewContent", "contenido", "content"] {
            let mut body = json!({ "reviewGame": "g" });
            body[*name] = json!("Fine");

            let review = Review::from_payload(&body).expect("create review");
            assert_eq!(review.review_text, "Fine", "alias {}", name);
        }
    }

    #[test]
    fn difficulty_matching() {
        assert_eq!(Difficulty::from_loose("facil"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_loose(" Fácil"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_loose("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_loose("brutal"), None);

        assert_eq!(Difficulty::from_exact("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_exact("Difícil"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_exact("hard"), None);
    }

    #[test]
    fn update_rejects_out_of_range_values() {
        let review = Review::from_payload(&great_game()).expect("create review");

        assert_invalid(review.merged(&json!({ "rating": 7 })));
        assert_invalid(review.merged(&json!({ "rating": 0 })));
        assert_invalid(review.merged(&json!({ "rating": "x" })));
        assert_invalid(review.merged(&json!({ "hoursPlayed": -1 })));
        assert_invalid(review.merged(&json!({ "hoursPlayed": "many" })));
        assert_invalid(review.merged(&json!({ "difficulty": "hard" })));
        assert_invalid(review.merged(&json!({ "reviewText": " " })));
        assert_invalid(review.merged(&json!({ "gameId": "" })));
    }

    #[test]
    fn update_merges_and_refreshes_timestamp() {
        let review = Review::from_payload(&json!({
            "gameId": "game-1",
            "reviewText": "Great game",
            "createdAt": "2020-01-01T00:00:00Z"
        }))
        .expect("create review");

        let updated = review
            .merged(&json!({ "id": "other", "rating": 2, "difficulty": "Hard", "recommends": 0 }))
            .expect("update review");

        assert_eq!(updated.id, review.id);
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.difficulty, Difficulty::Hard);
        assert!(!updated.recommends);
        assert_eq!(updated.review_text, "Great game");
        assert_eq!(updated.created_at, review.created_at);
        assert!(updated.updated_at > review.updated_at);
    }

    #[test]
    fn legacy_records_decode() {
        let review: Review = serde_json::from_value(json!({
            "id": "r1",
            "juegoId": "g1",
            "puntuacion": 4,
            "textoReseña": "Bien",
            "horasJugadas": 12,
            "dificultad": "Fácil",
            "recomendaria": true,
            "fechaCreacion": "2023-05-01T10:00:00.000Z",
            "fechaActualizacion": "2023-05-02T10:00:00.000Z"
        }))
        .expect("decode legacy review");

        assert_eq!(review.game_id, "g1");
        assert_eq!(review.difficulty, Difficulty::Easy);
        assert_eq!(review.hours_played, 12.0);
    }

    proptest! {
        #[test]
        fn created_ratings_stay_in_range(rating in proptest::num::f64::ANY) {
            let mut body = great_game();
            body["rating"] = json!(rating);

            let review = Review::from_payload(&body).expect("create review");

            prop_assert!((1..=5).contains(&review.rating));
        }
    }
}
