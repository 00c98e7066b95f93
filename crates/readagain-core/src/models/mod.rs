pub mod history;
pub mod profile;
pub mod recommendation;
pub mod session;
pub mod stats;

pub use history::*;
pub use profile::*;
pub use recommendation::*;
pub use session::*;
pub use stats::*;
