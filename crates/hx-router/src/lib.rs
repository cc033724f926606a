//! Route table and route-string grammar for the hx edge request router.
//!
//! A route maps a client-visible path to an optional RPC binding and an
//! optional template. Routes come from a JSON manifest whose values are either
//! structured objects or compact route strings:
//!
//! ```text
//! route   := [ function "@" ] path [ "=>" template ]
//! ```
//!
//! For example `addTask@todo.php=>task.html` binds `addTask` on `todo.php`
//! and renders `task.html`; `()@todo.php` calls nothing.

mod grammar;
mod loader;
mod manifest;
mod table;

pub use grammar::*;
pub use loader::*;
pub use manifest::*;
pub use table::*;
