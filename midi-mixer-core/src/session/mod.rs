pub mod controller;
pub mod coordinator;
pub mod dispatcher;
pub mod endpoint;
pub mod engine;
pub mod registry;
pub mod signals;
