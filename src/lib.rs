pub mod cli;
pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod web;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use store::MediaStore;
