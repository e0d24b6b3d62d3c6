pub mod config_store;
pub mod config_watcher;
