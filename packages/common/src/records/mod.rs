mod error;
mod row;
mod traits;

#[cfg(feature = "tabular-store")]
pub mod database;

pub use error::RecordError;
pub use row::{COLUMNS, RecordRow};
pub use traits::RecordStore;
