use super::Users;
use crate::db::SessionFactory;
use crate::dto::UserDto;
use crate::error::ServiceError;
use crate::models::User;
use async_trait::async_trait;
use tracing::debug;

/// [`Users`] backed by the `user` table.
#[derive(Debug, Clone)]
pub struct UserService {
    sessions: SessionFactory,
}

impl UserService {
    pub fn new(sessions: SessionFactory) -> Self {
        UserService { sessions }
    }
}

#[async_trait]
impl Users for UserService {
    async fn add(&self, user: &UserDto) -> Result<UserDto, ServiceError> {
        let mut session = self.sessions.open().await?;
        session.add(User::new(user.name()));

        // Exactly one entity was added, so exactly one comes back.
        let mut created = session
            .commit()
            .await?
            .into_iter()
            .next()
            .ok_or(sqlx::Error::RowNotFound)?;

        // Pick up anything storage filled in on insert.
        session.refresh(&mut created).await?;

        let result = UserDto::from_attributes(Some(&created))?;
        session.close().await?;

        debug!(pk = ?result.pk(), "User added");
        Ok(result)
    }

    async fn get(&self, pk: i64) -> Result<UserDto, ServiceError> {
        let mut session = self.sessions.open().await?;
        let user = session.get(pk).await?;

        let result = UserDto::from_attributes(user.as_ref())?;
        session.close().await?;

        debug!(pk, "User fetched");
        Ok(result)
    }
}
