use chrono::{DateTime, Utc};
use rand::Rng;

/// Builds a human-readable order number: `TP`, the creation time as `YYYYMMDDHHMMSS`, and a four digit random
/// suffix. Order numbers are display labels. They are not unique keys, and the suffix only makes clashes between
/// orders placed in the same second unlikely.
pub fn new_order_number(now: DateTime<Utc>) -> String {
    let suffix = rand::thread_rng().gen_range(0..10_000u32);
    format!("TP{}{suffix:04}", now.format("%Y%m%d%H%M%S"))
}
