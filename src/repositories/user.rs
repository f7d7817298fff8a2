//! # User Repository
//!
//! Accounts, workspaces and the memberships linking them. Registration
//! creates all three in one database transaction.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{
    MemberRole, User, WorkspaceMember,
    user::{self, Model as UserModel},
    workspace::{self, Model as WorkspaceModel},
    workspace_member,
};

/// Data for a new account and the workspace it will administer
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    /// Already normalized to lower case
    pub email: String,
    pub password_hash: String,
    pub workspace_name: String,
}

pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, RepositoryError> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserModel>, RepositoryError> {
        User::find_by_id(user_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Create a user, a workspace and an `ADMIN` membership atomically.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    pub async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<(UserModel, WorkspaceModel), RepositoryError> {
        if self.find_by_email(&registration.email).await?.is_some() {
            return Err(RepositoryError::conflict("Email already in use"));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(registration.name),
            email: Set(registration.email),
            password_hash: Set(registration.password_hash),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let workspace = workspace::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(registration.workspace_name),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        workspace_member::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            workspace_id: Set(workspace.id),
            role: Set(MemberRole::Admin),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(user_id = %user.id, workspace_id = %workspace.id, "Registered user");
        Ok((user, workspace))
    }

    /// The workspace a session is opened against: the user's oldest membership.
    pub async fn primary_workspace(
        &self,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceModel>, RepositoryError> {
        let membership = WorkspaceMember::find()
            .filter(workspace_member::Column::UserId.eq(user_id))
            .order_by_asc(workspace_member::Column::CreatedAt)
            .find_also_related(workspace::Entity)
            .one(self.db)
            .await?;

        Ok(membership.and_then(|(_, workspace)| workspace))
    }
}
