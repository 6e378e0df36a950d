mod asset;
mod session;
mod upload;

pub use asset::*;
pub use session::*;
pub use upload::*;
