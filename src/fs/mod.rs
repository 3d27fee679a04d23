pub mod codec;
pub mod timestamp;

pub use codec::{load, save, StoreFile};
