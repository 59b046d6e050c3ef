//! Leaf helpers: hashing, image payloads, retryable tasks and queues.

pub mod callbacks;
pub mod hash;
pub mod image;
pub mod queue;
pub mod task;

pub use callbacks::CallbackList;
pub use hash::{hash_code, temporary_hash};
pub use queue::{Failed, TaskQueue};
pub use task::{RoutingPolicy, Task, TaskFuture};
