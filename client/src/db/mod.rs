//! Local persistence: the SQLite record store and settings.

mod pool;
mod records;
pub mod settings;
mod store;

pub use pool::*;
pub use records::*;
pub use settings::keys;
pub use store::*;
