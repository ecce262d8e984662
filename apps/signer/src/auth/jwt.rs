use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;

use crate::claims::ClaimsObject;
use crate::AppError;

/// The only algorithm tokens are signed with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Sign `claims` as a compact HS256 JWT valid from `now` for `valid_for`.
///
/// `iat` and `exp` are written last as integer Unix seconds and replace any
/// values the template produced under those names. Sub-second parts of
/// `now` and `valid_for` are truncated.
pub fn issue_token(
    mut claims: ClaimsObject,
    valid_for: Duration,
    secret: &[u8],
    now: SystemTime,
) -> Result<String, AppError> {
    if secret.is_empty() {
        return Err(AppError::signing("signing secret is empty"));
    }

    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::signing("current time is before the Unix epoch"))?
        .as_secs();
    let exp = iat
        .checked_add(valid_for.as_secs())
        .ok_or_else(|| AppError::signing("token expiry overflows"))?;

    let iat = i64::try_from(iat).map_err(|_| AppError::signing("issued-at out of range"))?;
    let exp = i64::try_from(exp).map_err(|_| AppError::signing("token expiry out of range"))?;

    claims.insert("iat".to_string(), Value::from(iat));
    claims.insert("exp".to_string(), Value::from(exp));

    encode(
        &Header::new(SIGNING_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::signing(format!("Failed to encode JWT: {e}")))
}
