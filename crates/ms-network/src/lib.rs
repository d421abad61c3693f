//! `ms-network`: the link/node graph the queue engine and routers run on.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `Network` (CSR + R-trees), `NetworkBuilder`, `LinkAttrs`    |
//! | [`filter`]  | `ModeFilterCache`: lazily built per-mode link masks         |
//! | [`path`]    | `PathFinder` trait, `Path`, `Dijkstra`                      |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `LinkAttrs`.            |

pub mod error;
pub mod filter;
pub mod network;
pub mod path;

#[cfg(test)]
mod tests;

pub use error::{NetworkError, NetworkResult};
pub use filter::ModeFilterCache;
pub use network::{LinkAttrs, Network, NetworkBuilder};
pub use path::{Dijkstra, Path, PathFinder};
