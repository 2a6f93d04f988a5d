use serde::Serialize;

use crate::auth::user::AuthSession;
use crate::entities::user::{self, Role};
use crate::error::{AppError, AppResult};

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::AdminGeral => "Administração geral",
            Role::AdminAuxiliar => "Administração auxiliar",
            Role::Representante => "Representação estadual",
            Role::Membro => "Membro",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::AdminGeral | Role::AdminAuxiliar)
    }

    pub fn can_manage_users(self) -> bool {
        self == Role::AdminGeral
    }

    pub fn can_view_all_states(self) -> bool {
        self.is_admin()
    }

    pub fn can_manage_events(self) -> bool {
        self != Role::Membro
    }

    pub fn can_manage_roster(self) -> bool {
        self != Role::Membro
    }

    pub fn can_upload_reports(self) -> bool {
        self != Role::Membro
    }

    /// Admins keep editing after registration closes.
    pub fn bypasses_deadline(self) -> bool {
        self.is_admin()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
}

/// Navigation entries visible to `role`.
pub fn nav_items(role: Role) -> Vec<NavItem> {
    let mut items = vec![
        NavItem {
            href: "/painel",
            label: "Painel",
        },
        NavItem {
            href: "/eventos",
            label: "Calendário",
        },
    ];
    if role.can_manage_roster() {
        items.push(NavItem {
            href: "/delegacoes",
            label: "Delegações",
        });
    }
    if role.can_upload_reports() {
        items.push(NavItem {
            href: "/relatorios",
            label: "Relatórios",
        });
    }
    if role.can_manage_users() {
        items.push(NavItem {
            href: "/usuarios",
            label: "Usuários",
        });
    }
    items
}

pub fn require_user(auth_session: &AuthSession) -> AppResult<user::Model> {
    auth_session.user.clone().ok_or(AppError::Unauthorized)
}

/// Logged-in user that passes `allowed`.
pub fn require(auth_session: &AuthSession, allowed: fn(Role) -> bool) -> AppResult<user::Model> {
    let user = require_user(auth_session)?;
    if allowed(user.role) {
        Ok(user)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Whether `user` may read or change data belonging to `state`.
pub fn can_access_state(user: &user::Model, state: &str) -> bool {
    user.role.can_view_all_states() || user.state.as_deref() == Some(state)
}

pub fn ensure_state_access(user: &user::Model, state: &str) -> AppResult<()> {
    if can_access_state(user, state) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Picks the state a page operates on: representatives are pinned to their
/// own, admins may pick any (or none, meaning "all").
pub fn scoped_state(user: &user::Model, requested: Option<&str>) -> AppResult<Option<String>> {
    if user.role.can_view_all_states() {
        return Ok(requested
            .filter(|s| !s.is_empty())
            .and_then(crate::util::states::normalize_uf));
    }
    match user.state.clone() {
        Some(own) => Ok(Some(own)),
        None => Err(AppError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: Role, state: Option<&str>) -> user::Model {
        let now = chrono::Utc::now().naive_utc();
        user::Model {
            id: 1,
            email: "x@example.org".to_string(),
            password_hash: String::new(),
            name: "X".to_string(),
            role,
            state: state.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn capabilities_follow_role() {
        assert!(Role::AdminGeral.can_manage_users());
        assert!(!Role::AdminAuxiliar.can_manage_users());
        assert!(Role::AdminAuxiliar.can_view_all_states());
        assert!(!Role::Representante.can_view_all_states());
        assert!(Role::Representante.can_manage_roster());
        assert!(!Role::Membro.can_manage_roster());
        assert!(!Role::Membro.can_manage_events());
    }

    #[test]
    fn navigation_is_role_gated() {
        let member: Vec<_> = nav_items(Role::Membro).iter().map(|n| n.href).collect();
        assert_eq!(member, vec!["/painel", "/eventos"]);

        let admin: Vec<_> = nav_items(Role::AdminGeral).iter().map(|n| n.href).collect();
        assert!(admin.contains(&"/usuarios"));
        assert!(admin.contains(&"/delegacoes"));

        let rep: Vec<_> = nav_items(Role::Representante).iter().map(|n| n.href).collect();
        assert!(!rep.contains(&"/usuarios"));
        assert!(rep.contains(&"/relatorios"));
    }

    #[test]
    fn representatives_are_scoped_to_their_state() {
        let rep = user_with(Role::Representante, Some("PE"));
        assert!(can_access_state(&rep, "PE"));
        assert!(!can_access_state(&rep, "SP"));
        assert_eq!(scoped_state(&rep, Some("SP")).unwrap(), Some("PE".to_string()));

        let stateless = user_with(Role::Representante, None);
        assert!(matches!(scoped_state(&stateless, None), Err(AppError::Forbidden)));
    }

    #[test]
    fn admins_pick_any_state() {
        let admin = user_with(Role::AdminAuxiliar, None);
        assert!(can_access_state(&admin, "SP"));
        assert_eq!(scoped_state(&admin, Some("rj")).unwrap(), Some("RJ".to_string()));
        assert_eq!(scoped_state(&admin, Some("")).unwrap(), None);
        assert_eq!(scoped_state(&admin, None).unwrap(), None);
    }
}
