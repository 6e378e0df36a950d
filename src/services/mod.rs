pub mod auth;
pub mod catalog;
pub mod deletion;
pub mod existence;
pub mod folders;
pub mod session;
pub mod upload;
