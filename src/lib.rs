// Crate root library declaration and module exports.
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod llm;
pub mod logging;
pub mod mail;
pub mod model;
pub mod parser;
pub mod service;
pub mod storage;
pub mod store;
