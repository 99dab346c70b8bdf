use base64::{engine::general_purpose, Engine as _};
use openssl::pkey::PKey;
use rand::RngCore;

use crate::rotate_error::RotateError;

/// Freshly generated Reality key material, URL-safe base64 without padding
/// as Xray and the panel expect it.
#[derive(Debug, Clone)]
pub struct RealityKeyPair {
    pub private_key: String,
    pub public_key: String,
}

pub fn generate_keypair() -> Result<RealityKeyPair, RotateError> {
    let pkey = PKey::generate_x25519()?;
    Ok(RealityKeyPair {
        private_key: general_purpose::URL_SAFE_NO_PAD.encode(pkey.raw_private_key()?),
        public_key: general_purpose::URL_SAFE_NO_PAD.encode(pkey.raw_public_key()?),
    })
}

pub fn generate_short_ids(count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 4];
            rng.fill_bytes(&mut bytes);
            bytes.iter().map(|b| format!("{b:02x}")).collect()
        })
        .collect()
}
