//! `mkdi-core` — identifiers and errors shared by every back-office crate.
//!
//! Nothing here knows about HTTP, tokens or storage.

pub mod error;
pub mod id;

pub use error::{CoreError, CoreResult};
pub use id::{OfficeId, OrganizationId, PrincipalId};
