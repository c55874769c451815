use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Paths reachable without an API key
const PUBLIC_PATHS: &[&str] = &["/health", "/ready"];

/// Proof that the request carried a valid administrator API key
///
/// Only `AdminApiKey` inserts it; handlers that take it as an argument are
/// unreachable without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminCapability {
    _private: (),
}

impl FromRequest for AdminCapability {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AdminCapability>()
                .copied()
                .ok_or_else(|| Error::from(AppError::unauthorized("Administrator access required"))),
        )
    }
}

/// Administrator API key middleware
///
/// Checks `X-API-Key` against the configured argon2 hash.
pub struct AdminApiKey {
    key_hash: Rc<String>,
}

impl AdminApiKey {
    pub fn new(key_hash: impl Into<String>) -> Self {
        Self {
            key_hash: Rc::new(key_hash.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminApiKey
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminApiKeyMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminApiKeyMiddleware {
            service: Rc::new(service),
            key_hash: self.key_hash.clone(),
        }))
    }
}

pub struct AdminApiKeyMiddleware<S> {
    service: Rc<S>,
    key_hash: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AdminApiKeyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let key_hash = self.key_hash.clone();

        Box::pin(async move {
            if PUBLIC_PATHS.contains(&req.path()) {
                return svc.call(req).await;
            }

            let api_key = req
                .headers()
                .get("X-API-Key")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing X-API-Key header")))?;

            if !verify_api_key(api_key, &key_hash).map_err(Error::from)? {
                tracing::warn!(path = req.path(), "Rejected request with invalid API key");
                return Err(Error::from(AppError::unauthorized("Invalid API key")));
            }

            req.extensions_mut().insert(AdminCapability { _private: () });

            svc.call(req).await
        })
    }
}

/// Hashes an API key with Argon2 for `ADMIN_API_KEY_HASH`
pub fn hash_api_key(api_key: &str) -> crate::core::Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(api_key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API key: {}", e)))
}

/// Verifies an API key against an Argon2 PHC string
pub fn verify_api_key(api_key: &str, hash: &str) -> crate::core::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(api_key.as_bytes(), &parsed_hash)
        .is_ok())
}
