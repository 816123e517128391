mod guard;
mod role;

pub(crate) use guard::authorize;
pub use guard::{get_role, require_role};
pub use role::Role;
