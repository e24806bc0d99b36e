// src/services/scope_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::{
        auth::{AuthIdentity, ImpersonationGrant},
        tenancy::Store,
    },
};

/// Resolve o escopo efetivo (tenant e, opcionalmente, loja) de uma
/// requisição. O escopo resolvido é SEMPRE passado como argumento explícito
/// para as operações; nunca fica em estado ambiente/global.
#[derive(Clone)]
pub struct ScopeService {
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl ScopeService {
    pub fn new(tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { tenant_repo, pool }
    }

    /// Resolução do tenant efetivo. Função pura de (identidade, concessão):
    /// 1. Se houver claim de personificação, ela vence: é assim que uma
    ///    super-identidade sem tenant de casa age como qualquer tenant.
    /// 2. Senão, vale o tenant de casa da identidade.
    /// 3. Sem nenhum dos dois, a operação é rejeitada; nada aqui opera
    ///    "sem tenant".
    pub fn resolve_tenant(
        identity: &AuthIdentity,
        grant: Option<&ImpersonationGrant>,
    ) -> Result<Uuid, AppError> {
        if let Some(grant) = grant {
            return Ok(grant.tenant_id);
        }
        identity.home_tenant_id.ok_or(AppError::ScopeRequired)
    }

    /// Resolução da loja, independente e opcional:
    /// - Loja informada: aceita apenas se pertencer ao tenant resolvido,
    ///   senão `StoreMismatch` (a consulta já filtra pelo tenant, então uma
    ///   loja alheia simplesmente "não existe" aqui).
    /// - Sem loja informada: usa a loja padrão do tenant, quando houver.
    pub async fn resolve_store(
        &self,
        tenant_id: Uuid,
        requested: Option<Uuid>,
    ) -> Result<Option<Store>, AppError> {
        match requested {
            Some(store_id) => {
                let store = self
                    .tenant_repo
                    .find_store(&self.pool, tenant_id, store_id)
                    .await?
                    .ok_or(AppError::StoreMismatch)?;
                Ok(Some(store))
            }
            None => {
                self.tenant_repo
                    .find_default_store(&self.pool, tenant_id)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(home: Option<Uuid>) -> AuthIdentity {
        AuthIdentity {
            user_id: Uuid::new_v4(),
            home_tenant_id: home,
        }
    }

    #[test]
    fn tenant_de_casa_vale_sem_personificacao() {
        let home = Uuid::new_v4();
        let resolved = ScopeService::resolve_tenant(&identity(Some(home)), None).unwrap();
        assert_eq!(resolved, home);
    }

    #[test]
    fn claim_de_personificacao_vence_o_tenant_de_casa() {
        // Cenário: identidade com casa em T1 personificando T2.
        // Todo o restante da requisição fica escopado em T2.
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let grant = ImpersonationGrant { tenant_id: t2 };
        let resolved =
            ScopeService::resolve_tenant(&identity(Some(t1)), Some(&grant)).unwrap();
        assert_eq!(resolved, t2);
    }

    #[test]
    fn super_identidade_sem_casa_resolve_via_claim() {
        let t2 = Uuid::new_v4();
        let grant = ImpersonationGrant { tenant_id: t2 };
        let resolved = ScopeService::resolve_tenant(&identity(None), Some(&grant)).unwrap();
        assert_eq!(resolved, t2);
    }

    #[test]
    fn sem_tenant_resolvivel_rejeita_com_scope_required() {
        let err = ScopeService::resolve_tenant(&identity(None), None).unwrap_err();
        assert!(matches!(err, AppError::ScopeRequired));
    }
}
