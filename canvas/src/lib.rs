//! Position editor core for the marina map.
//!
//! This crate owns everything about editing boat placements that does not
//! touch the network: converting between image and viewport coordinates,
//! holding the loaded map and its placements, tracking selection and zoom,
//! translating raw pointer/keyboard input into store mutations, and building
//! the display list the host draws. Remote persistence is described by
//! tickets ([`store::SyncRequest`]) that the host executes and feeds back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Input dispatch and toolbar commands ([`engine::EngineCore`]) |
//! | [`store`] | Optimistic position store with revision tracking and rollback |
//! | [`doc`] | Map, placement and binding types plus wire records |
//! | [`camera`] | Image/viewport transforms and the fit scale |
//! | [`input`] | Selection/drag state machine, zoom, keyboard commands |
//! | [`hit`] | Hit-testing placements under the pointer |
//! | [`render`] | Scene (display list) construction |
//! | [`config`] | Editor tuning: steps, zoom range, default style |
//! | [`error`] | Load, sync, store and interaction errors |
//! | [`consts`] | Shared numeric and style constants |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod hit;
pub mod input;
pub mod render;
pub mod store;
