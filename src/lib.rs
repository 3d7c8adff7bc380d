//! Marina position editor: the network side.
//!
//! The editing core lives in the `canvas` crate and never performs I/O. This
//! crate connects it to the marina CRUD service:
//!
//! | Module | Role |
//! |--------|------|
//! | [`api`] | `MarinaApi` seam and its reqwest implementation |
//! | [`session`] | Executes the core's sync requests; debounce and single-flight |
//! | [`config`] | Environment configuration |

pub mod api;
pub mod config;
pub mod session;
