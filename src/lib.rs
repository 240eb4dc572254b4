pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod gemini;
pub mod instructions;
pub mod models;
pub mod prompt;
pub mod routes;
