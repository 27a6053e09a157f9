use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

/// Builds the transport credential carried in the `Authorization: Basic`
/// header.
///
/// The credential is `base64(clientId:userId)` or, when the caller's backend
/// supplied an integrity hash, `base64(clientId:userId:hash)`. It is a
/// transport-level label, not a secret; the hash is the actual trust
/// boundary and must never be derived client-side.
pub fn basic_credential(client_id: &str, user_id: &str, user_id_hash: Option<&str>) -> String {
    let raw = match user_id_hash {
        Some(hash) => format!("{client_id}:{user_id}:{hash}"),
        None => format!("{client_id}:{user_id}"),
    };
    BASE64_STANDARD.encode(raw)
}
