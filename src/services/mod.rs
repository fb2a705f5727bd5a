// bookmark-sync services
// Remote data service contract and its implementations, plus settings loading.

pub mod remote_service;
#[cfg(feature = "rest")]
pub mod rest_service;
pub mod settings_engine;
pub mod sqlite_service;
