//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`AgoraError`]
//! via `#[from]`; adapters box their own failures into
//! [`AgoraError::Storage`].

use crate::permission::Action;

/// Top-level error returned by services and ports.
#[derive(Debug, thiserror::Error)]
pub enum AgoraError {
    /// A save operation reported a field-level problem.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The resource is absent or invisible to the caller.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A permission check failed.
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),

    /// The action requires an authenticated user and the caller is a guest.
    #[error("authentication required")]
    Unauthenticated,

    /// A request parameter is malformed or names an impossible transition.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// The backing store failed.
    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    EmptyTitle,
    #[error("title is too long ({max} characters at most)")]
    TitleTooLong { max: usize },
    #[error("post body is required")]
    EmptyBody,
    #[error("poll title is required")]
    EmptyPollTitle,
    #[error("poll needs at least {min} options")]
    TooFewPollOptions { min: usize },
    #[error("poll accepts at most {max} options")]
    TooManyPollOptions { max: usize },
    #[error("votes per user must be between 1 and the number of options ({options})")]
    MaxOptionsOutOfRange { options: usize },
    #[error("hidden results require a voting period")]
    HiddenResultsWithoutLength,
    #[error("topic has no poll")]
    NoPoll,
    #[error("poll has ended")]
    PollClosed,
    #[error("no option selected")]
    NoPollOptionSelected,
    #[error("too many options selected ({max} at most)")]
    TooManyVotes { max: u32 },
    #[error("unknown poll option {0}")]
    UnknownPollOption(i64),
    #[error("changing votes is not allowed for this poll")]
    VoteChangeNotAllowed,
    #[error("topic does not accept feature votes")]
    NotFeatureTopic,
    #[error("already voted for this feature")]
    AlreadyVoted,
}

/// Raised when a requested resource does not exist (or is invisible).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Raised when the actor may not perform `action`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not allowed to perform {action}")]
pub struct ForbiddenError {
    pub action: Action,
}

/// Malformed or unacceptable request parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("missing parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("unknown issue tag `{0}`")]
    UnknownIssueTag(String),
    #[error("topic is not in an issue forum")]
    NotIssueTopic,
    #[error("unknown topic type {0}")]
    UnknownTopicType(i64),
    #[error("forum {0} does not accept topics")]
    ForumNotPostable(i64),
    #[error("topic is already in forum {0}")]
    SameForum(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = AgoraError::from(NotFoundError {
            entity: "Topic",
            id: "42".to_string(),
        });
        assert_eq!(err.to_string(), "Topic 42 not found");
    }

    #[test]
    fn should_display_forbidden_with_action_name() {
        let err = AgoraError::from(ForbiddenError {
            action: Action::ForumModerate,
        });
        assert_eq!(err.to_string(), "not allowed to perform ForumModerate");
    }

    #[test]
    fn should_convert_validation_error_into_agora_error() {
        let err: AgoraError = ValidationError::EmptyTitle.into();
        assert!(matches!(
            err,
            AgoraError::Validation(ValidationError::EmptyTitle)
        ));
    }
}
