//! Shopper identity from request headers.
//!
//! Authentication happens upstream; this layer trusts `x-user-id` (account
//! id) and `x-session-key` (anonymous shopper UUID).

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::cart;
use crate::error::{AppError, Result};
use crate::models::CartOwner;
use crate::orders;

pub static USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub static SESSION_KEY_HEADER: HeaderName = HeaderName::from_static("x-session-key");

fn header_value<T: std::str::FromStr>(parts: &Parts, name: &HeaderName) -> Result<Option<T>> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| AppError::Validation(format!("malformed {} header", name)))
}

/// Whoever is making the request: a signed-in account, an anonymous
/// session, or neither yet.
#[derive(Debug, Clone, Copy)]
pub struct Shopper {
    pub user_id: Option<i32>,
    pub session_key: Option<Uuid>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Shopper {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Ok(Shopper {
            user_id: header_value(parts, &USER_ID_HEADER)?,
            session_key: header_value(parts, &SESSION_KEY_HEADER)?,
        })
    }
}

/// Cart owner for a request, plus a session key to hand back if one was
/// issued for this request
#[derive(Debug, Clone, Copy)]
pub struct ResolvedShopper {
    pub owner: CartOwner,
    pub issued_session: Option<Uuid>,
}

impl ResolvedShopper {
    /// Response headers carrying a freshly issued session key
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self.issued_session {
            let value = HeaderValue::from_str(&key.to_string())
                .map_err(|e| AppError::Internal(e.to_string()))?;
            headers.insert(SESSION_KEY_HEADER.clone(), value);
        }
        Ok(headers)
    }
}

impl Shopper {
    /// Owner of an existing cart, without issuing anything.
    ///
    /// An account gets its customer record (created on first use); a
    /// session key sent alongside it hands that anonymous cart over to the
    /// customer. `None` when neither header is present.
    pub async fn existing_owner(&self, db: &PgPool) -> Result<Option<CartOwner>> {
        if let Some(user_id) = self.user_id {
            let customer = orders::customer_for_account(db, user_id).await?.id;
            if let Some(session_key) = self.session_key {
                cart::claim_anonymous_cart(db, session_key, customer).await?;
            }
            return Ok(Some(CartOwner::Customer(customer)));
        }
        Ok(self.session_key.map(CartOwner::Anonymous))
    }

    /// Resolve the cart owner for a cart mutation, issuing a new session
    /// key when the shopper has no identity yet.
    pub async fn resolve(&self, db: &PgPool) -> Result<ResolvedShopper> {
        if let Some(owner) = self.existing_owner(db).await? {
            return Ok(ResolvedShopper {
                owner,
                issued_session: None,
            });
        }
        let key = Uuid::new_v4();
        debug!("Issued session key {}", key);
        Ok(ResolvedShopper {
            owner: CartOwner::Anonymous(key),
            issued_session: Some(key),
        })
    }
}

/// A signed-in account; rejects the request when `x-user-id` is absent
#[derive(Debug, Clone, Copy)]
pub struct RegisteredUser(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RegisteredUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        header_value(parts, &USER_ID_HEADER)?
            .map(RegisteredUser)
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/cart/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_shopper_reads_both_headers() {
        let key = Uuid::new_v4();
        let mut parts = parts(&[("x-user-id", "7"), ("x-session-key", &key.to_string())]);
        let shopper = Shopper::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(shopper.user_id, Some(7));
        assert_eq!(shopper.session_key, Some(key));
    }

    #[tokio::test]
    async fn test_malformed_session_key_is_rejected() {
        let mut parts = parts(&[("x-session-key", "not-a-uuid")]);
        let err = Shopper::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_registered_user_requires_header() {
        let mut parts = parts(&[]);
        let err = RegisteredUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn test_issued_session_key_is_returned_in_headers() {
        let key = Uuid::new_v4();
        let resolved = ResolvedShopper {
            owner: CartOwner::Anonymous(key),
            issued_session: Some(key),
        };
        let headers = resolved.headers().unwrap();
        assert_eq!(headers[&SESSION_KEY_HEADER], key.to_string().as_str());
    }
}
