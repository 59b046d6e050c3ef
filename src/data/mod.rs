//! Data — orchestration of photo flows across the api and offline modules.
//!
//! DESIGN
//! ======
//! `ApiGate` owns join state and task routing. `DataStore` owns the per-photo
//! flows (save, create, rename, list) and reports them to a `PhotoObserver`.
//! Both are cheap `Arc` handles built once at startup and passed in.

pub mod events;
pub mod gate;
pub mod store;

pub use events::{PhotoObserver, TracingObserver};
pub use gate::{ApiGate, Route};
pub use store::DataStore;
