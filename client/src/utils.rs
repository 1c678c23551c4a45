//! Small helpers shared across the application.

use adapters::UserId;
use chrono::Utc;
use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Generates a session-scoped participant id: `user_<millis>_<base36 suffix>`.
///
/// Uniqueness is probabilistic.
pub fn generate_user_id() -> UserId {
    user_id_from(Utc::now().timestamp_millis(), &mut rand::rng())
}

fn user_id_from<R: Rng + ?Sized>(millis: i64, rng: &mut R) -> UserId {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    UserId::new(format!("user_{millis}_{suffix}"))
}
