pub mod games;
pub mod reviews;

pub use self::games::GamesRepository;
pub use self::reviews::ReviewsRepository;
