//! Offline-durable upload pipeline for position-tracking clients.
//!
//! Buffers position samples in a bounded, persisted FIFO, uploads them in
//! bulk behind an OAuth client-credentials bearer token, and retries a
//! failed upload at a persisted deadline that survives process restarts.
//! Platform concerns (UI, the OS positioning stack, the storage engine)
//! stay outside, behind the [`domain::LocationSource`] and
//! [`persistence::KeyValueStore`] traits.

pub mod api;
pub mod app_config;
pub mod controller;
pub mod domain;
pub mod persistence;
pub mod scheduler;
pub mod store;
