use uuid::Uuid;

use super::{RepositoryError, Store};
use crate::models::users;

#[derive(Clone)]
pub struct UserRepository {
    store: Store,
}

impl UserRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Returns the user owning `mobile`, creating it with a zero balance if
    /// this is the first login for that number. The lookup and the insert
    /// happen under one write lock, so a mobile never maps to two users.
    pub async fn get_or_insert_user(
        &self,
        mobile: &str,
    ) -> Result<(users::User, bool), RepositoryError> {
        let mut tables = self.store.write().await?;

        if let Some(user) = tables
            .users_by_mobile
            .get(mobile)
            .and_then(|id| tables.users.get(id))
        {
            return Ok((user.clone(), false));
        }

        let user = users::User {
            id: Uuid::new_v4().hyphenated().to_string(),
            mobile: mobile.to_string(),
            total_points: 0,
            created_at: self.store.now(),
        };

        tables
            .users_by_mobile
            .insert(user.mobile.clone(), user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());

        Ok((user, true))
    }

    pub async fn get_user_by_id(
        &self,
        user_id: &str,
    ) -> Result<Option<users::User>, RepositoryError> {
        let tables = self.store.read().await?;

        Ok(tables.users.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn repository() -> UserRepository {
        UserRepository::new(Store::new(Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn first_login_creates_user_with_zero_points() {
        let repository = repository();

        let (user, created) = repository.get_or_insert_user("+919876543210").await.unwrap();
        assert!(created);
        assert_eq!(user.total_points, 0);
        assert_eq!(user.mobile, "+919876543210");

        let (again, created) = repository.get_or_insert_user("+919876543210").await.unwrap();
        assert!(!created);
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn looks_up_by_id() {
        let repository = repository();
        let (user, _) = repository.get_or_insert_user("+918888888888").await.unwrap();

        let by_id = repository.get_user_by_id(&user.id).await.unwrap();
        assert_eq!(by_id, Some(user));
        assert_eq!(repository.get_user_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_logins_create_one_user() {
        let repository = repository();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repository = repository.clone();
                tokio::spawn(async move {
                    repository.get_or_insert_user("+919000000001").await.unwrap()
                })
            })
            .collect();

        let results = futures_util::future::join_all(handles).await;
        let created = results
            .iter()
            .filter(|r| r.as_ref().unwrap().1)
            .count();
        assert_eq!(created, 1);

        let first_id = &results[0].as_ref().unwrap().0.id;
        assert!(results.iter().all(|r| &r.as_ref().unwrap().0.id == first_id));
    }
}
