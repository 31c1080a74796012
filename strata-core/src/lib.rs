pub mod config;
pub mod document;
pub mod events;
pub mod geometry;
pub mod history;
pub mod identity;
pub mod migrate;
pub mod navigator;
pub mod session;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod text;
pub mod types;
