// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Claims do JWT ---
// A emissão do token acontece fora deste serviço; aqui só decodificamos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// ID do usuário autenticado.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    /// Tenant "de casa" do usuário. Super-admins não têm um.
    pub tenant_id: Option<Uuid>,
    /// Claim de personificação: autoriza agir COMO este tenant.
    pub act_as_tenant_id: Option<Uuid>,
}

/// Identidade autenticada, extraída do token pelo middleware.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub home_tenant_id: Option<Uuid>,
}

/// Concessão de personificação presente no token.
/// Quando existe, ela VENCE o tenant de casa na resolução de escopo.
#[derive(Debug, Clone, Copy)]
pub struct ImpersonationGrant {
    pub tenant_id: Uuid,
}
