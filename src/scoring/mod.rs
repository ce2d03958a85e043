pub mod composite;
pub mod dates;
pub mod loader;
pub mod matcher;
pub mod schema;
pub mod similarity;
#[cfg(test)]
mod tests;

pub use self::composite::{
    PosterScore, PredictionStatus, ScoreBreakdown, score_poster, score_poster_bytes,
};
pub use self::loader::{decode_text, load_record};
pub use self::schema::validate_raw;
