/// Lowest canonical rating. Also used when the source gives no rating.
pub const MIN_RATING: u8 = 1;

/// Highest canonical rating
pub const MAX_RATING: u8 = 5;

/// Source ratings are fractions in (0, 1]; multiply by this to reach the canonical scale
pub const SOURCE_RATING_SCALE: f64 = 5.0;
