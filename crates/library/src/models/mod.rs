mod entry;
mod profile;
mod status;

pub use self::entry::{EntryId, EntryUpdate, LibraryEntry, NewEntry, UserId, clamp_progress};
pub use self::profile::{MAX_FAVORITES, Profile};
pub use self::status::{Rating, Status};
