// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{AuthIdentity, Claims, ImpersonationGrant},
};

/// Decodifica o bearer token e injeta a identidade e a eventual concessão de
/// personificação nos extensions da requisição. A emissão do token acontece
/// fora deste serviço; aqui só validamos e decodificamos os claims.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers();
    let auth_header = headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            let token_data = decode::<Claims>(
                token,
                &DecodingKey::from_secret(app_state.jwt_secret.as_ref()),
                &Validation::default(),
            )
            .map_err(|_| AppError::InvalidToken)?;
            let claims = token_data.claims;

            let identity = AuthIdentity {
                user_id: claims.sub,
                home_tenant_id: claims.tenant_id,
            };
            let grant = claims
                .act_as_tenant_id
                .map(|tenant_id| ImpersonationGrant { tenant_id });

            request.extensions_mut().insert(identity);
            request.extensions_mut().insert(grant);
            return Ok(next.run(request).await);
        }
    }

    Err(AppError::InvalidToken)
}

/// Extrator para os handlers: identidade + concessão de personificação.
/// O escopo efetivo em si é resolvido depois, pelo ScopeService, e passado
/// explicitamente às operações.
pub struct AuthSession {
    pub identity: AuthIdentity,
    pub grant: Option<ImpersonationGrant>,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;
        let grant = parts
            .extensions
            .get::<Option<ImpersonationGrant>>()
            .copied()
            .flatten();
        Ok(AuthSession { identity, grant })
    }
}
