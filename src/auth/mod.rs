mod claims;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod session;

pub use claims::Claims;
pub use repo_types::{Account, AccountSummary, NewAccount, Role};
pub use session::{SessionIdentity, SessionKeys};
