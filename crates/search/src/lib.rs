//! Book search: catalog results overlaid with cached metadata, classified
//! into original and derivative works, with a debounced session on top for
//! search-as-you-type.

pub mod error;
mod pipeline;
mod session;
#[cfg(test)]
mod testing;

pub use crate::pipeline::SearchPipeline;
pub use crate::session::{DEFAULT_DEBOUNCE, SearchSession};
