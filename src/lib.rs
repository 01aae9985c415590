//! # dtoforge
//!
//! Attribute-driven mirror-type and mapping generator: annotate the types
//! in a module and get wire/DTO counterparts with bidirectional conversion
//! code, all at compile time.
//!
//! ## Features
//!
//! - **Declaration pairs**: every annotated struct projects into a
//!   capability trait (`IAddressDto`) and a concrete struct (`AddressDto`)
//! - **Ancestor linkage**: embedded-base inheritance is mirrored, with the
//!   concrete type satisfying every ancestor capability by delegation
//! - **Bidirectional mappings**: assign and construct functions in both
//!   directions, nested composites routed through one generic entry point
//! - **Enum mirrors**: annotated enums get a mirrored declaration and
//!   `From` impls both ways
//! - **Configurable passes**: naming, namespaces and output routing driven
//!   by `dtoforge.toml` job configurations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dtoforge::prelude::*;
//!
//! #[dto_module]
//! mod model {
//!     #[dto(suffix = "Dto")]
//!     #[derive(Clone, Default)]
//!     pub struct Address {
//!         pub street: String,
//!         pub city: String,
//!     }
//! }
//!
//! let addr = model::Address { street: "1 Main St".into(), city: "Springfield".into() };
//! let dto = addr.to_dto();
//! assert_eq!(dto.street, "1 Main St");
//! let back = dto.to_net();
//! assert_eq!(back.city, "Springfield");
//! ```

pub mod prelude;
pub mod traits;

pub use dtoforge_macros::{dto, dto_module};
pub use traits::{MapHooks, MapTo};

// Generated interop derives resolve serde through this re-export, so using
// crates do not need their own serde dependency.
pub use serde;
