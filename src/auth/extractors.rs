use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{jwt::JwtKeys, repo_types::Role};
use crate::error::AppError;

/// Identity claimed by a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            warn!(user_id = %self.id, role = %self.role, "role not allowed");
            Err(AppError::forbidden("No tienes permisos para esta acción"))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Token no proporcionado".into()))?;

        // Expect "Bearer <token>"
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Token no proporcionado".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::forbidden("Token inválido o expirado")
        })?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

macro_rules! role_extractor {
    ($(#[$doc:meta])* $name:ident => [$($role:expr),+ $(,)?]) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub AuthUser);

        #[async_trait]
        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
            JwtKeys: FromRef<S>,
        {
            type Rejection = AppError;

            async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
                let user = AuthUser::from_request_parts(parts, state).await?;
                user.require(&[$($role),+])?;
                Ok($name(user))
            }
        }
    };
}

role_extractor!(
    /// Admin-only routes.
    AdminUser => [Role::Admin]
);
role_extractor!(
    /// Coordinator area; admins may act as coordinators.
    CoordinatorUser => [Role::Coordinator, Role::Admin]
);
role_extractor!(VolunteerUser => [Role::Volunteer]);
role_extractor!(BeneficiaryUser => [Role::Beneficiary]);
role_extractor!(DonorUser => [Role::Donor]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::{Request, StatusCode};

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&AppConfig::for_tests().jwt)
    }

    async fn extract<T>(header: Option<String>) -> Result<T, AppError>
    where
        T: FromRequestParts<JwtKeys, Rejection = AppError>,
    {
        let mut builder = Request::builder().uri("/");
        if let Some(h) = header {
            builder = builder.header("Authorization", h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        T::from_request_parts(&mut parts, &keys()).await
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = extract::<AuthUser>(None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let err = extract::<AuthUser>(Some("Basic abc".into())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_forbidden() {
        let err = extract::<AuthUser>(Some("Bearer not.a.jwt".into())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_token_yields_claimed_identity() {
        let id = Uuid::new_v4();
        let token = keys().sign(id, Role::Donor).unwrap();
        let user = extract::<AuthUser>(Some(format!("Bearer {token}"))).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Donor);
    }

    #[tokio::test]
    async fn role_extractor_rejects_other_roles() {
        let token = keys().sign(Uuid::new_v4(), Role::Donor).unwrap();
        let err = extract::<AdminUser>(Some(format!("Bearer {token}"))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_passes_coordinator_gate() {
        let token = keys().sign(Uuid::new_v4(), Role::Admin).unwrap();
        let CoordinatorUser(user) = extract::<CoordinatorUser>(Some(format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}
