pub mod change;
pub mod ledger;
pub mod project;
pub mod session;
pub mod turn;

pub use change::*;
pub use ledger::*;
pub use project::*;
pub use session::*;
pub use turn::*;
