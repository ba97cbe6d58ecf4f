pub mod batch;
pub mod outcome;
pub mod rating;
pub mod review;

pub use batch::Batch;
pub use outcome::PersistenceOutcome;
pub use rating::{MAX_RATING, MIN_RATING, SOURCE_RATING_SCALE};
pub use review::{Review, ReviewField, ANONYMOUS_AUTHOR};
