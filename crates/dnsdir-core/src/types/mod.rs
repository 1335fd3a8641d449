mod codes;
mod group;
mod record;

pub use codes::*;
pub use group::*;
pub use record::*;
