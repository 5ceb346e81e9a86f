mod dns;
mod entities;
mod format;
mod record;
mod timestamp;

pub use dns::*;
pub use entities::*;
pub use format::*;
pub use record::*;
pub use timestamp::*;
