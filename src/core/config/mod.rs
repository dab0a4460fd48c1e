pub mod data;
pub mod io;
pub mod keys;
pub mod printing;

pub use data::{Config, SafetyConfig, TranscriptConfig};
pub use io::ConfigError;

#[cfg(test)]
pub mod tests;
