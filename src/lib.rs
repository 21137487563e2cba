pub mod config;
pub mod core;
pub mod feed;
pub mod models;
pub mod scanner;
#[cfg(test)]
pub mod test_helpers;
