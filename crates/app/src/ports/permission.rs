//! Permission port: decides whether an actor may perform an action.

use agora_domain::error::{AgoraError, ForbiddenError};
use agora_domain::permission::{Action, Authorizable};
use agora_domain::user::Actor;

pub trait PermissionChecker {
    fn can(&self, actor: &Actor, action: Action, subject: Authorizable<'_>) -> bool;

    /// Fail unless [`PermissionChecker::can`] allows the action.
    ///
    /// # Errors
    ///
    /// Returns [`AgoraError::Unauthenticated`] for a refused guest and
    /// [`AgoraError::Forbidden`] for a refused user.
    fn ensure_can(
        &self,
        actor: &Actor,
        action: Action,
        subject: Authorizable<'_>,
    ) -> Result<(), AgoraError> {
        if self.can(actor, action, subject) {
            return Ok(());
        }
        match actor {
            Actor::Guest => Err(AgoraError::Unauthenticated),
            Actor::User(_) => Err(ForbiddenError { action }.into()),
        }
    }
}

impl<T: PermissionChecker> PermissionChecker for std::sync::Arc<T> {
    fn can(&self, actor: &Actor, action: Action, subject: Authorizable<'_>) -> bool {
        (**self).can(actor, action, subject)
    }
}
