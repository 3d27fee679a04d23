pub mod category;
pub mod task;

pub use category::{CategoryRegistry, DEFAULT_CATEGORIES, FALLBACK_CATEGORY};
pub use task::{Priority, Task, TaskStatus};
