use jsonwebtoken::encode;

use crate::user::UserService;

pub mod api;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: u64,
    pub username: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: u64, username: String) -> Self {
        Self { id, username }
    }
}

/// Authentication state containing the JWT secret and the user lookup.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub users: UserService,
}

impl AuthState {
    pub fn new(jwt_secret: String, users: UserService) -> Self {
        Self { jwt_secret, users }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: u64,    // ID of the authenticated user
}

/// Creates a signed token identifying the given user, valid for 24 hours.
pub async fn encode_jwt(user_id: u64, jwt_secret: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(24);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        id: user_id,
    };
    let jwt = encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

/// Verifies a token and returns its claims.
pub async fn decode_jwt(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let token_data = jsonwebtoken::decode(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn can_round_trip_a_token() {
        let claims = decode_jwt(
            &encode_jwt(7, "test_secret").await.unwrap(),
            "test_secret",
        )
        .await
        .unwrap();

        assert_eq!(claims.id, 7);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn rejects_a_token_signed_with_a_different_secret() {
        let token = encode_jwt(7, "one_secret").await.unwrap();

        assert!(decode_jwt(&token, "another_secret").await.is_err());
    }

    #[tokio::test]
    async fn rejects_a_garbage_token() {
        assert!(decode_jwt("not.a.token", "test_secret").await.is_err());
    }
}
