pub mod errors;
pub mod path;
pub mod payload;
pub mod report;

pub use errors::*;
pub use path::*;
pub use payload::*;
pub use report::*;
