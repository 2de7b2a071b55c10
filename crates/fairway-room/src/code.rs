//! Room code allocation.

use fairway_protocol::RoomCode;
use rand::Rng;

use crate::RoomError;

/// Uppercase letters and digits without the look-alikes `I`, `O`, `0`, `1`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated room code.
pub const CODE_LEN: usize = 6;

/// Attempts before giving up on finding an unused code.
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// A random code drawn from [`CODE_ALPHABET`].
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Draws codes until `taken` rejects one, at most [`MAX_CODE_ATTEMPTS`] times.
pub fn unique_code<R, F>(rng: &mut R, taken: F) -> Result<RoomCode, RoomError>
where
    R: Rng + ?Sized,
    F: Fn(&RoomCode) -> bool,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let Ok(code) = RoomCode::parse(&random_code(rng)) else {
            continue;
        };
        if !taken(&code) {
            return Ok(code);
        }
    }
    Err(RoomError::CodeSpaceExhausted)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_random_code_uses_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = random_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)), "{code}");
        }
    }

    #[test]
    fn test_unique_code_retries_past_collisions() {
        let mut rng = StdRng::seed_from_u64(1);
        let calls = Cell::new(0);
        let code = unique_code(&mut rng, |_| {
            calls.set(calls.get() + 1);
            calls.get() < 3
        })
        .unwrap();
        assert_eq!(calls.get(), 3);
        assert_eq!(code.as_str().len(), CODE_LEN);
    }

    #[test]
    fn test_unique_code_gives_up() {
        let mut rng = StdRng::seed_from_u64(1);
        let calls = Cell::new(0);
        let result = unique_code(&mut rng, |_| {
            calls.set(calls.get() + 1);
            true
        });
        assert!(matches!(result, Err(RoomError::CodeSpaceExhausted)));
        assert_eq!(calls.get(), MAX_CODE_ATTEMPTS);
    }
}
