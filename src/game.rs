use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::compat::game as fields;
use crate::errors::LibraryError;
use crate::id::new_id;
use crate::normalization::deserialize_whole;
use crate::payload::Payload;
use crate::store::Record;
use crate::timestamp;

/// A single game in the library.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// The ID of the game. Never changes once assigned.
    pub id: String,

    #[serde(alias = "titulo")]
    pub title: String,

    #[serde(alias = "desarrollador")]
    pub developer: String,

    #[serde(alias = "genero")]
    pub genre: String,

    #[serde(alias = "plataforma")]
    pub platform: String,

    #[serde(default, alias = "descripcion")]
    pub description: String,

    #[serde(default, alias = "imagenPortada")]
    pub cover_image_url: String,

    #[serde(
        alias = "añoLanzamiento",
        alias = "anoLanzamiento",
        deserialize_with = "deserialize_whole"
    )]
    pub release_year: i32,

    /// Whether the game has been finished.
    #[serde(default, alias = "completado")]
    pub completed: bool,

    /// When the game was added to the library.
    #[serde(
        alias = "fechaCreacion",
        with = "time::serde::rfc3339",
        default = "timestamp::now"
    )]
    pub created_at: OffsetDateTime,
}

impl Game {
    /// Builds a new game from a request body.
    pub fn from_payload(body: &Value) -> Result<Self, LibraryError> {
        let payload = Payload::new(body);

        let title = payload.trimmed(fields::TITLE);
        let developer = payload.trimmed(fields::DEVELOPER);
        let genre = payload.string(fields::GENRE).unwrap_or_default().to_owned();
        let platform = payload.string(fields::PLATFORM).unwrap_or_default().to_owned();
        let release_year = payload.number(fields::RELEASE_YEAR);

        if title.is_empty()
            || developer.is_empty()
            || genre.is_empty()
            || platform.is_empty()
            || !release_year.is_finite()
        {
            return Err(LibraryError::invalid(
                "title, developer, genre, platform and releaseYear are required",
            ));
        }

        let release_year = whole_year(release_year)
            .ok_or_else(|| LibraryError::invalid("releaseYear is out of range"))?;

        let created_at = payload
            .value(fields::CREATED_AT)
            .and_then(timestamp::parse)
            .unwrap_or_else(timestamp::now);

        Ok(Game {
            id: supplied_id(&payload).unwrap_or_else(new_id),
            title,
            developer,
            genre,
            platform,
            description: payload.trimmed(fields::DESCRIPTION),
            cover_image_url: payload.trimmed(fields::COVER_IMAGE_URL),
            release_year,
            completed: payload.truthy(fields::COMPLETED),
            created_at,
        })
    }

    /// Returns a copy with the supplied fields merged in. Values that
    /// would not be accepted on creation are ignored, leaving the
    /// current value in place; `id` and `created_at` never change.
    pub fn merged(&self, body: &Value) -> Self {
        let payload = Payload::new(body);
        let mut game = self.clone();

        if let Some(title) = non_empty(payload.string(fields::TITLE).map(str::trim)) {
            game.title = title;
        }

        if let Some(developer) = non_empty(payload.string(fields::DEVELOPER).map(str::trim)) {
            game.developer = developer;
        }

        if let Some(genre) = non_empty(payload.string(fields::GENRE)) {
            game.genre = genre;
        }

        if let Some(platform) = non_empty(payload.string(fields::PLATFORM)) {
            game.platform = platform;
        }

        if let Some(description) = payload.string(fields::DESCRIPTION) {
            game.description = description.trim().to_owned();
        }

        if let Some(url) = payload.string(fields::COVER_IMAGE_URL) {
            game.cover_image_url = url.trim().to_owned();
        }

        if payload.value(fields::RELEASE_YEAR).is_some() {
            if let Some(year) = whole_year(payload.number(fields::RELEASE_YEAR)) {
                game.release_year = year;
            }
        }

        if let Some(completed) = payload.value(fields::COMPLETED) {
            game.completed = crate::payload::is_truthy(completed);
        }

        game
    }
}

impl Record for Game {
    const COLLECTION: &'static str = "games";
    const TIMESTAMP_FIELDS: &'static [&'static str] = &["createdAt"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// A client-chosen ID, honored on creation when it is a non-empty
/// string.
pub(crate) fn supplied_id(payload: &Payload) -> Option<String> {
    non_empty(payload.string(crate::compat::ID))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

fn whole_year(year: f64) -> Option<i32> {
    use crate::normalization::WholeNumber;

    i32::from_f64(year)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Game;
    use crate::errors::LibraryError;

    fn chrono_trigger() -> serde_json::Value {
        json!({
            "title": "Chrono Trigger",
            "developer": "Square",
            "genre": "RPG",
            "platform": "SNES",
            "releaseYear": 1995
        })
    }

    #[test]
    fn creation_fills_defaults() {
        let game = Game::from_payload(&chrono_trigger()).expect("create game");

        assert!(!game.id.is_empty());
        assert_eq!(game.title, "Chrono Trigger");
        assert_eq!(game.release_year, 1995);
        assert_eq!(game.description, "");
        assert_eq!(game.cover_image_url, "");
        assert!(!game.completed);
    }

    #[test]
    fn creation_trims_and_coerces() {
        let game = Game::from_payload(&json!({
            "title": "  Ico ",
            "developer": " Team Ico\t",
            "genre": "Adventure",
            "platform": "PS2",
            "releaseYear": "2001",
            "completed": "yes",
            "id": "ico",
            "createdAt": "2020-01-02T03:04:05.678Z"
        }))
        .expect("create game");

        assert_eq!(game.id, "ico");
        assert_eq!(game.title, "Ico");
        assert_eq!(game.developer, "Team Ico");
        assert_eq!(game.release_year, 2001);
        assert!(game.completed);
        assert_eq!(game.created_at.year(), 2020);
    }

    #[test]
    fn creation_accepts_legacy_names() {
        let game = Game::from_payload(&json!({
            "titulo": "Okami",
            "desarrollador": "Clover",
            "genero": "Action",
            "plataforma": "PS2",
            "añoLanzamiento": 2006,
            "completado": true
        }))
        .expect("create game");

        assert_eq!(game.title, "Okami");
        assert_eq!(game.release_year, 2006);
        assert!(game.completed);
    }

    #[test]
    fn creation_rejects_missing_fields() {
        for field in &["title", "developer", "genre", "platform", "releaseYear"] {
            let mut body = chrono_trigger();
            body.as_object_mut().unwrap().remove(*field);

            match Game::from_payload(&body) {
                Err(LibraryError::InvalidInput(_)) => {}
                other => panic!("expected invalid input without {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn creation_rejects_non_finite_year_and_blank_title() {
        let mut body = chrono_trigger();
        body["releaseYear"] = json!("soon");
        assert!(Game::from_payload(&body).is_err());

        let mut body = chrono_trigger();
        body["title"] = json!("   ");
        assert!(Game::from_payload(&body).is_err());
    }

    #[test]
    fn merging_keeps_identity_and_unsupplied_fields() {
        let game = Game::from_payload(&chrono_trigger()).expect("create game");
        let merged = game.merged(&json!({
            "id": "something-else",
            "completed": true,
            "title": "",
            "releaseYear": "not a year",
            "description": " Time travel "
        }));

        assert_eq!(merged.id, game.id);
        assert_eq!(merged.created_at, game.created_at);
        assert_eq!(merged.title, "Chrono Trigger");
        assert_eq!(merged.release_year, 1995);
        assert_eq!(merged.description, "Time travel");
        assert!(merged.completed);
    }

    #[test]
    fn legacy_records_decode() {
        let game: Game = serde_json::from_value(json!({
            "id": "1",
            "titulo": "Chrono Trigger",
            "desarrollador": "Square",
            "genero": "RPG",
            "plataforma": "SNES",
            "añoLanzamiento": 1995.0,
            "fechaCreacion": "2023-05-01T10:00:00.000Z"
        }))
        .expect("decode legacy game");

        assert_eq!(game.title, "Chrono Trigger");
        assert_eq!(game.release_year, 1995);
        assert!(!game.completed);
    }
}
