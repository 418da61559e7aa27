pub mod export;
pub mod get;

pub use export::*;
pub use get::*;
