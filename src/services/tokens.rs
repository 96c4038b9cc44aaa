use ring::rand::{SecureRandom, SystemRandom};

const SESSION_TOKEN_BYTES: usize = 32;

/// Uppercase alphabet without 0/O and 1/I
const REFERENCE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const REFERENCE_LEN: usize = 8;
pub const REFERENCE_PREFIX: &str = "CL-";

#[derive(thiserror::Error, Debug)]
#[error("System random number generator failed")]
pub struct RandomError;

fn random_bytes<const N: usize>() -> Result<[u8; N], RandomError> {
    let mut bytes = [0u8; N];
    SystemRandom::new().fill(&mut bytes).map_err(|_| RandomError)?;
    Ok(bytes)
}

/// Opaque bearer token, hex encoded (64 chars)
pub fn generate_session_token() -> Result<String, RandomError> {
    Ok(hex::encode(random_bytes::<SESSION_TOKEN_BYTES>()?))
}

/// Human-shareable booking reference such as `CL-7K3QX9PD`
pub fn generate_booking_reference() -> Result<String, RandomError> {
    // 32 divides 256, so the modulo keeps the distribution uniform
    let code: String = random_bytes::<REFERENCE_LEN>()?
        .iter()
        .map(|b| REFERENCE_ALPHABET[(*b as usize) % REFERENCE_ALPHABET.len()] as char)
        .collect();

    Ok(format!("{}{}", REFERENCE_PREFIX, code))
}
