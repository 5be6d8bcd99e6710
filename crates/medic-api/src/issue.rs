use anyhow::Result;
use rand::Rng;
use uuid::Uuid;

use medic_db::Database;

pub const CODE_LENGTH: usize = 8;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate an 8-letter code, each character uniform over A-Z. Codes are
/// not globally unique; collisions across users are fine.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Issue a code for a user: generate a candidate and store it only if the
/// user has none yet. Returns the code that ended up stored (which is the
/// pre-existing one when the user already had a code) and whether this call
/// created it.
pub fn issue_code(db: &Database, user_id: Uuid) -> Result<(String, bool)> {
    db.insert_code_if_absent(&user_id.to_string(), &generate_code())
}
