pub mod app;
pub mod assembler;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod keyring;
pub mod message;
pub mod mode;
pub mod oauth;
pub mod prompt;
pub mod safety;
pub mod session;
pub mod tags;
pub mod transcript;
