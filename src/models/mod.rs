//! GitHub API model types.

mod commit;
mod compare;
mod content;
mod deployment;
mod issue;
mod myself;
mod pull_request;
mod reaction;
mod repository;
mod statistics;
mod user;

pub use commit::*;
pub use compare::*;
pub use content::*;
pub use deployment::*;
pub use issue::*;
pub use myself::*;
pub use pull_request::*;
pub use reaction::*;
pub use repository::*;
pub use statistics::*;
pub use user::*;
