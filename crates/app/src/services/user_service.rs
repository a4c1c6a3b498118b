//! User service: turns an authenticated user id into an [`Actor`].

use agora_domain::error::AgoraError;
use agora_domain::id::UserId;
use agora_domain::user::Actor;

use crate::ports::UserRepository;

pub struct UserService<U> {
    users: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Resolve the actor of a request; no id means a guest.
    ///
    /// # Errors
    ///
    /// Returns [`AgoraError::Unauthenticated`] when `id` names no user, or a
    /// storage error from the repository.
    pub async fn resolve_actor(&self, id: Option<UserId>) -> Result<Actor, AgoraError> {
        let Some(id) = id else {
            return Ok(Actor::Guest);
        };
        self.users
            .get_by_id(id)
            .await?
            .map(Actor::User)
            .ok_or(AgoraError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemory;
    use agora_domain::user::User;

    #[tokio::test]
    async fn should_resolve_guest_without_id() {
        let svc = UserService::new(InMemory::default());
        assert_eq!(svc.resolve_actor(None).await.unwrap(), Actor::Guest);
    }

    #[tokio::test]
    async fn should_resolve_known_user() {
        let store = InMemory::default();
        store.add_user(User::new(UserId::new(4), "peppy"));
        let svc = UserService::new(store);

        let actor = svc.resolve_actor(Some(UserId::new(4))).await.unwrap();
        assert_eq!(actor.id(), Some(UserId::new(4)));
    }

    #[tokio::test]
    async fn should_reject_unknown_user_id() {
        let svc = UserService::new(InMemory::default());
        let result = svc.resolve_actor(Some(UserId::new(99))).await;
        assert!(matches!(result, Err(AgoraError::Unauthenticated)));
    }
}
