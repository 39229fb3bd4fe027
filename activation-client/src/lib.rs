//! REST client implementing the activation remote store
//!
//! Talks to the console's entity API:
//! - `GET {base}/{collection}` lists entities
//! - `GET {base}/{collection}/{id}` fetches one entity
//! - `PUT {base}/{collection}/{id}` with `{"isActive": bool}` flips the flag
//!
//! Responses may be bare JSON or wrapped in `{ "data": ... }`.

pub mod client;
mod error;
pub mod types;

// Re-export main types
pub use client::StoreClient;
pub use types::ClientConfig;
