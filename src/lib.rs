//! Picturesque — offline-first photo capture and sync.
//!
//! Photos are saved locally the moment they are captured and uploaded once
//! the user has joined the service and the network allows. Remote photos are
//! paged in incrementally behind a last-updated cursor.

pub mod api;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod event_log;
pub mod offline;
pub mod photo;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;
