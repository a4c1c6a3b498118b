//! Typed identifier newtypes backed by the store's integer keys.
//!
//! Keys are assigned by the store and grow with insertion order, which is
//! what the cursor pagination relies on.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw key.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Access the raw key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`User`](crate::user::User).
    UserId
);

define_id!(
    /// Identifier of a [`Forum`](crate::forum::Forum).
    ForumId
);

define_id!(
    /// Identifier of a [`Topic`](crate::topic::Topic).
    TopicId
);

define_id!(
    /// Identifier of a [`Post`](crate::post::Post).
    PostId
);

define_id!(
    /// Identifier of a poll option, local to its topic.
    PollOptionId
);

define_id!(
    /// Identifier of a [`Match`](crate::matches::Match).
    MatchId
);

define_id!(
    /// Identifier of a [`MatchEvent`](crate::matches::MatchEvent).
    MatchEventId
);

define_id!(
    /// Identifier of a [`Game`](crate::matches::Game).
    GameId
);
