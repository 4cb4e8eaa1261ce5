use crate::error::{ErrorKind, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The three independent lists a book can be in.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[display("want-to-read")]
    WantToRead,
    #[display("reading")]
    Reading,
    #[display("read")]
    Read,
}
impl Status {
    pub const ALL: [Status; 3] = [Status::WantToRead, Status::Reading, Status::Read];

    /// Name of the list as shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WantToRead => "Want to Read",
            Self::Reading => "Reading Now",
            Self::Read => "Read",
        }
    }
}

/// A star rating from 1 to 5.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);
impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            exn::bail!(ErrorKind::InvalidRating(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}
impl TryFrom<u8> for Rating {
    type Error = ErrorKind;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::new(value).map_err(|e| (*e).clone())
    }
}
impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}
