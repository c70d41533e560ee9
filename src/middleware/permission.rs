//! Capability guards for route handlers.
//!
//! Each generated extractor authenticates the caller and then evaluates
//! every listed permission against the store. The list is conjunctive: all
//! named permissions must hold, while each individual check passes if any
//! one of the caller's roles grants it.

/// Helper macro to create permission-guard extractors for route handlers.
#[macro_export]
macro_rules! require_permissions {
    ($name:ident, [$($permission:literal),+ $(,)?]) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::utils::errors::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                let user_id = auth_user.user_id()?;

                for permission in [$($permission),+] {
                    let allowed = $crate::modules::roles::service::check_permission(
                        &state.db, user_id, permission,
                    )
                    .await?;
                    if !allowed {
                        return Err($crate::utils::errors::AppError::forbidden(
                            ::anyhow::anyhow!("Not enough permissions"),
                        ));
                    }
                }

                Ok($name(auth_user))
            }
        }
    };
}

// Role management requires the manage_roles capability plus the action itself.
require_permissions!(RequireRolesCreate, ["manage_roles", "create"]);
require_permissions!(RequireRolesRead, ["manage_roles", "read"]);
require_permissions!(RequireRolesEdit, ["manage_roles", "edit"]);
require_permissions!(RequireRolesDelete, ["manage_roles", "delete"]);
