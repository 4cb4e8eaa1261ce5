use crate::error::{ErrorKind, Result};
use crate::models::UserId;

/// Who is acting. Handed to every component that needs an identity instead
/// of being looked up from ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserId>,
}
impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// The signed-in user, or [`ErrorKind::Unauthenticated`].
    pub fn require_user(&self) -> Result<&UserId> {
        match &self.user {
            Some(user) => Ok(user),
            None => exn::bail!(ErrorKind::Unauthenticated),
        }
    }
}
