//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use dtoforge::prelude::*;
//! ```

pub use crate::traits::{MapHooks, MapTo};
pub use dtoforge_macros::{dto, dto_module};
