use crate::Bot;
use ed25519_dalek::{Signature, Verifier, SIGNATURE_LENGTH};
use hyper::{HeaderMap, StatusCode};
use lobby::messenger::Messenger;

pub use ed25519_dalek::VerifyingKey as PublicKey;

/// Decodes the hex-encoded application public key.
pub fn parse_public_key(hex: &str) -> Option<PublicKey> {
    let mut bytes = [0; ed25519_dalek::PUBLIC_KEY_LENGTH];
    hex::decode_to_slice(hex.trim(), &mut bytes).ok()?;
    PublicKey::from_bytes(&bytes).ok()
}

/// Checks the Discord request signature over the timestamp followed by the raw body.
pub fn verify(public: &PublicKey, headers: &HeaderMap, body: &[u8]) -> Result<(), StatusCode> {
    // Retrieve security headers
    let maybe_sig = headers.get("X-Signature-Ed25519");
    let maybe_time = headers.get("X-Signature-Timestamp");
    let (sig, timestamp) = maybe_sig.zip(maybe_time).ok_or(StatusCode::UNAUTHORIZED)?;

    let mut signature = [0; SIGNATURE_LENGTH];
    hex::decode_to_slice(sig.as_bytes(), &mut signature).map_err(|_| StatusCode::BAD_REQUEST)?;
    let signature = Signature::from_bytes(&signature);

    // Append body after the timestamp
    let mut message = timestamp.as_bytes().to_vec();
    message.extend_from_slice(body);

    // Validate the challenge
    public.verify(&message, &signature).map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Verifies, parses, and answers a single interaction. Returns the serialized response.
pub async fn try_respond<M: Messenger>(
    bot: &Bot<M>,
    public: &PublicKey,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<u8>, StatusCode> {
    verify(public, headers, body)?;

    // Parse incoming interaction
    let interaction = serde_json::from_slice(body).map_err(|_| StatusCode::BAD_REQUEST)?;

    let reply = bot.on_message(interaction).await;
    serde_json::to_vec(&reply).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
