//! bookmark-sync: a personal bookmark list kept in sync across clients.
//!
//! The core is [`managers::reconciliation_engine`], which merges optimistic
//! local mutations, a push subscription and a periodic poll into one
//! deduplicated list. [`managers::sync_session`] wires it to a
//! [`services::remote_service::RemoteDataService`].

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
