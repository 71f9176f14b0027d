pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod errors;
pub mod index;
pub mod logging;
pub mod retrieval;
pub mod search;
pub mod server;
pub mod tokenizer;
