//! Room model - one gift-circle event

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rounds::Round;

/// Join codes avoid ambiguous characters (0/O, 1/I/L)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

/// A Room is one circle: a set of members moving together through the
/// round sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    /// Human-readable join code, unique across rooms
    pub code: String,
    pub title: String,
    /// The user who opened the circle (their membership carries the Host role)
    pub host_user_id: Uuid,
    pub current_round: Round,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(title: String, host_user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: Self::generate_code(),
            title,
            host_user_id,
            current_round: Round::Waiting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Generate a fresh join code
    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_starts_waiting() {
        let room = Room::new("Solstice circle".to_string(), Uuid::new_v4());
        assert_eq!(room.current_round, Round::Waiting);
        assert_eq!(room.code.len(), CODE_LENGTH);
    }

    #[test]
    fn test_code_uses_unambiguous_alphabet() {
        for _ in 0..50 {
            let code = Room::generate_code();
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
