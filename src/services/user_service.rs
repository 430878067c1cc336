// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;

use super::{
    auth::hash_password,
    mailer::{spawn_send, EmailMessage, Mailer},
};
use crate::{
    common::{
        error::AppError,
        pagination::{Page, Paginated},
    },
    db::{UserChanges, UserRepository},
    models::{
        auth::{User, UserRole},
        user::{CreateUserPayload, UpdateUserPayload, UserListQuery},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UserAction {
    View,
    Create { role: UserRole },
    Update { role: Option<UserRole>, active: Option<bool> },
    Delete,
}

/// Regras de gestão de usuários. `target` é o usuário afetado, quando já existe.
pub(crate) fn authorize(actor: &User, target: Option<&User>, action: UserAction) -> Result<(), AppError> {
    if !actor.role.can_manage_users() {
        return Err(AppError::Forbidden(
            "Apenas administradores podem gerenciar usuários.".into(),
        ));
    }

    let touches_system = target.is_some_and(|t| t.role == UserRole::System)
        || matches!(
            action,
            UserAction::Create { role: UserRole::System }
                | UserAction::Update { role: Some(UserRole::System), .. }
        );
    if touches_system && actor.role != UserRole::System && action != UserAction::View {
        return Err(AppError::Forbidden(
            "Apenas usuários system podem gerenciar usuários system.".into(),
        ));
    }

    let is_self = target.is_some_and(|t| t.id == actor.id);
    match action {
        UserAction::Delete if is_self => Err(AppError::Forbidden(
            "Você não pode excluir o seu próprio usuário.".into(),
        )),
        UserAction::Update { active: Some(false), .. } if is_self => Err(AppError::Forbidden(
            "Você não pode desativar o seu próprio usuário.".into(),
        )),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    mailer: Option<Arc<dyn Mailer>>,
}

impl UserService {
    pub fn new(user_repo: UserRepository, mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { user_repo, mailer }
    }

    async fn find(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn list(&self, actor: &User, query: &UserListQuery) -> Result<Paginated<User>, AppError> {
        authorize(actor, None, UserAction::View)?;
        let page = Page::new(query.page, query.limit);
        let (items, total) = self.user_repo.list(query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        authorize(actor, None, UserAction::View)?;
        self.find(id).await
    }

    pub async fn create(&self, actor: &User, payload: CreateUserPayload) -> Result<User, AppError> {
        authorize(actor, None, UserAction::Create { role: payload.role })?;

        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create(&payload.name, &payload.email, &password_hash, payload.role)
            .await?;

        tracing::info!(user_id = %user.id, created_by = %actor.id, "👤 Usuário criado");

        if let Some(mailer) = &self.mailer {
            spawn_send(mailer.clone(), EmailMessage::welcome(&user.name, &user.email));
        }
        Ok(user)
    }

    pub async fn update(&self, actor: &User, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        let target = self.find(id).await?;
        authorize(
            actor,
            Some(&target),
            UserAction::Update {
                role: payload.role,
                active: payload.active,
            },
        )?;

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let changes = UserChanges {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: payload.role,
            active: payload.active,
        };
        self.user_repo
            .update(id, changes)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        let target = self.find(id).await?;
        authorize(actor, Some(&target), UserAction::Delete)?;

        if !self.user_repo.delete(id).await? {
            return Err(AppError::NotFound("Usuário"));
        }
        tracing::info!(user_id = %id, deleted_by = %actor.id, "Usuário excluído");
        Ok(())
    }
}
