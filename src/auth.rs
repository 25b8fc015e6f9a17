use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::delivery_agent,
    errors::ServiceError,
    models::AgentStatus,
    AppState,
};

/// Role carried by a bearer token. Token issuance (login, refresh) is the
/// identity service's job; this module only validates tokens and resolves
/// the acting identity for each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Customer,
    Admin,
    Agent,
}

/// Claim structure for actor bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Acting identity (customer, admin user, or delivery agent id)
    pub sub: Uuid,
    pub role: ActorRole,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a token for the given actor. Exposed for test harnesses and the
/// identity service boundary.
pub fn issue_token(
    secret: &str,
    sub: Uuid,
    role: ActorRole,
    ttl_secs: i64,
) -> Result<String, ServiceError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub,
        role,
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::Internal(format!("failed to sign token: {e}")))
}

fn decode_claims(secret: &str, token: &str) -> Result<Claims, ServiceError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))
}

fn bearer_token(parts: &Parts) -> Result<&str, ServiceError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("Provide token".to_string()))
}

fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<Claims, ServiceError> {
    let token = bearer_token(parts)?;
    decode_claims(&state.config.jwt_secret, token)
}

/// Authenticated customer identity.
#[derive(Debug, Clone, Copy)]
pub struct CustomerAuth {
    pub customer_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for CustomerAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let claims = claims_from_parts(parts, &state)?;

        match claims.role {
            ActorRole::Customer | ActorRole::Admin => Ok(CustomerAuth {
                customer_id: claims.sub,
            }),
            ActorRole::Agent => Err(ServiceError::Forbidden(
                "Customer access required".to_string(),
            )),
        }
    }
}

/// Authenticated admin identity.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth {
    pub admin_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let claims = claims_from_parts(parts, &state)?;

        if claims.role != ActorRole::Admin {
            return Err(ServiceError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminAuth {
            admin_id: claims.sub,
        })
    }
}

/// Authenticated delivery agent identity.
///
/// Beyond token validation, the agent row is re-checked on every request:
/// a suspended or deactivated agent loses access immediately, not at token
/// expiry.
#[derive(Debug, Clone, Copy)]
pub struct AgentAuth {
    pub agent_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AgentAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let claims = claims_from_parts(parts, &state)?;

        if claims.role != ActorRole::Agent {
            return Err(ServiceError::Forbidden("Agent access required".to_string()));
        }

        let agent = delivery_agent::Entity::find_by_id(claims.sub)
            .one(&*state.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Agent not registered".to_string()))?;

        if agent.status != AgentStatus::Active {
            return Err(ServiceError::Forbidden("Agent is not active".to_string()));
        }

        Ok(AgentAuth {
            agent_id: agent.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a_test_secret_key_that_is_long_enough_123456";

    #[test]
    fn issued_token_decodes_to_same_actor() {
        let sub = Uuid::new_v4();
        let token = issue_token(SECRET, sub, ActorRole::Agent, 3600).unwrap();
        let claims = decode_claims(SECRET, &token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.role, ActorRole::Agent);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4(), ActorRole::Customer, 3600).unwrap();
        assert!(decode_claims("another_secret_that_is_also_long_enough!!", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4(), ActorRole::Customer, -120).unwrap();
        assert!(decode_claims(SECRET, &token).is_err());
    }
}
