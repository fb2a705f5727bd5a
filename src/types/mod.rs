// bookmark-sync shared type definitions
// Each submodule defines types used across the engine, session and RPC layers.

pub mod bookmark;
pub mod errors;
pub mod event;
pub mod settings;
pub mod view;
