use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::debug;

use crate::{
    db::now_sec,
    entities::{session, user},
    error::{AppError, AppResult},
    identity::VerifiedIdentity,
};

#[derive(Clone)]
pub struct SessionManager {
    db: DatabaseConnection,
    ttl_seconds: i64,
    admin_emails: Vec<String>,
}

impl SessionManager {
    pub fn new(db: DatabaseConnection, ttl_days: i64, admin_emails: Vec<String>) -> Self {
        Self { db, ttl_seconds: ttl_days.max(1) * 86_400, admin_emails }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Upserts the user behind `identity` and opens a new session for it.
    pub async fn sign_in(
        &self,
        identity: VerifiedIdentity,
    ) -> AppResult<(user::Model, session::Model)> {
        let now = now_sec();
        let is_admin = identity
            .email
            .as_deref()
            .is_some_and(|e| self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(e)));

        let existing = user::Entity::find()
            .filter(user::Column::FirebaseUid.eq(identity.uid.as_str()))
            .one(&self.db)
            .await?;

        let user = match existing {
            Some(found) => {
                let promote = is_admin && !found.is_admin();
                let mut model: user::ActiveModel = found.clone().into();
                if identity.email.is_some() && identity.email != found.email {
                    model.email = Set(identity.email);
                }
                if found.name.is_none() && identity.name.is_some() {
                    model.name = Set(identity.name);
                }
                if found.avatar.is_none() && identity.avatar.is_some() {
                    model.avatar = Set(identity.avatar);
                }
                if promote {
                    model.role = Set(user::ROLE_ADMIN.to_string());
                }
                if model.is_changed() {
                    model.updated_at = Set(now);
                    model.update(&self.db).await?
                } else {
                    found
                }
            },
            None => {
                let role = if is_admin { user::ROLE_ADMIN } else { user::ROLE_USER };
                user::ActiveModel {
                    firebase_uid: Set(identity.uid),
                    email: Set(identity.email),
                    name: Set(identity.name),
                    avatar: Set(identity.avatar),
                    role: Set(role.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            },
        };

        self.purge_expired(now).await?;

        let session = session::ActiveModel {
            token: Set(new_token()),
            user_id: Set(user.id),
            expires_at: Set(now + self.ttl_seconds),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        debug!(user_id = user.id, role = %user.role, "session opened");
        Ok((user, session))
    }

    /// Resolves a session token to its user. Expired sessions are removed.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let session = self.live_session(token).await?;
        user::Entity::find_by_id(session.user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::unauthorized("session user no longer exists"))
    }

    /// Pushes the expiry of a live session to now + TTL.
    pub async fn refresh(&self, token: &str) -> AppResult<session::Model> {
        let session = self.live_session(token).await?;
        let mut model: session::ActiveModel = session.into();
        model.expires_at = Set(now_sec() + self.ttl_seconds);
        Ok(model.update(&self.db).await?)
    }

    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        session::Entity::delete_by_id(token.to_string()).exec(&self.db).await?;
        Ok(())
    }

    async fn live_session(&self, token: &str) -> AppResult<session::Model> {
        let Some(session) = session::Entity::find_by_id(token.to_string()).one(&self.db).await?
        else {
            return Err(AppError::unauthorized("session not found"));
        };
        if session.expires_at <= now_sec() {
            debug!(user_id = session.user_id, "session expired");
            self.revoke(token).await?;
            return Err(AppError::unauthorized("session expired"));
        }
        Ok(session)
    }

    async fn purge_expired(&self, now: i64) -> AppResult<()> {
        let res = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        if res.rows_affected > 0 {
            debug!(purged = res.rows_affected, "purged expired sessions");
        }
        Ok(())
    }
}

fn new_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(uid: &str, email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            name: None,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn sign_in_upserts_user_and_grants_admin_by_email() {
        let db = crate::db::test_db().await;
        let sessions = SessionManager::new(db, 5, vec!["boss@example.com".to_string()]);

        let (viewer, s1) = sessions.sign_in(identity("u1", "viewer@example.com")).await.unwrap();
        assert_eq!(viewer.role, user::ROLE_USER);
        assert_eq!(s1.token.len(), 64);

        let (again, s2) = sessions.sign_in(identity("u1", "viewer@example.com")).await.unwrap();
        assert_eq!(again.id, viewer.id);
        assert_ne!(s1.token, s2.token);

        let (boss, _) = sessions.sign_in(identity("u2", "Boss@Example.com")).await.unwrap();
        assert!(boss.is_admin());
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_removed() {
        let db = crate::db::test_db().await;
        let sessions = SessionManager::new(db.clone(), 5, vec![]);
        let (_, s) = sessions.sign_in(identity("u1", "a@example.com")).await.unwrap();

        let mut model: session::ActiveModel = s.clone().into();
        model.expires_at = Set(now_sec() - 1);
        model.update(&db).await.unwrap();

        let err = sessions.authenticate(&s.token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(session::Entity::find_by_id(s.token).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_extends_expiry() {
        let db = crate::db::test_db().await;
        let sessions = SessionManager::new(db.clone(), 5, vec![]);
        let (_, s) = sessions.sign_in(identity("u1", "a@example.com")).await.unwrap();

        let mut model: session::ActiveModel = s.clone().into();
        model.expires_at = Set(now_sec() + 10);
        model.update(&db).await.unwrap();

        let refreshed = sessions.refresh(&s.token).await.unwrap();
        assert!(refreshed.expires_at >= now_sec() + sessions.ttl_seconds() - 5);
    }
}
