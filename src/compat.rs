//! Field and path names accepted for compatibility with older clients
//! and older stored records.
//!
//! Each table lists the canonical name first, followed by the legacy
//! names in order of precedence. When a payload carries more than one
//! of them, the first present wins.

/// An ordered list of accepted names for one logical field.
pub type Aliases = &'static [&'static str];

pub const ID: Aliases = &["id"];

pub mod game {
    use super::Aliases;

    pub const TITLE: Aliases = &["title", "titulo"];
    pub const DEVELOPER: Aliases = &["developer", "desarrollador"];
    pub const GENRE: Aliases = &["genre", "genero"];
    pub const PLATFORM: Aliases = &["platform", "plataforma"];
    pub const DESCRIPTION: Aliases = &["description", "descripcion"];
    pub const COVER_IMAGE_URL: Aliases = &["coverImageUrl", "imagenPortada"];
    pub const RELEASE_YEAR: Aliases = &["releaseYear", "añoLanzamiento", "anoLanzamiento"];
    pub const COMPLETED: Aliases = &["completed", "completado"];
    pub const CREATED_AT: Aliases = &["createdAt", "fechaCreacion"];
}

pub mod review {
    use super::Aliases;

    pub const GAME_ID: Aliases = &["gameId", "juegoId", "reviewGame"];
    pub const RATING: Aliases = &["rating", "puntuacion"];
    pub const REVIEW_TEXT: Aliases = &[
        "reviewText",
        "textoReseña",
        "textoResena",
        "reviewContent",
        "contenido",
        "content",
    ];
    pub const HOURS_PLAYED: Aliases = &["hoursPlayed", "horasJugadas"];
    pub const DIFFICULTY: Aliases = &["difficulty", "dificultad"];
    pub const RECOMMENDS: Aliases = &["recommends", "recomendaria"];
    pub const CREATED_AT: Aliases = &["createdAt", "fechaCreacion"];
    pub const UPDATED_AT: Aliases = &["updatedAt", "fechaActualizacion"];
}

pub mod routes {
    use super::Aliases;

    pub const GAMES: Aliases = &["games", "juegos", "juego"];

    // `reseñas` arrives percent-encoded; the decoded form is kept for
    // clients that send raw UTF-8.
    pub const REVIEWS: Aliases = &["reviews", "resenas", "rese%C3%B1as", "reseñas"];

    pub const BY_GAME: Aliases = &["game", "juego"];
}
