//! State module for per-domain crawl bookkeeping
//!
//! # Components
//!
//! - `DomainState`: Next request slot and request count for one domain
//! - `DomainStates`: Shared map of domain states used to space requests

mod domain_state;

pub use domain_state::{DomainState, DomainStates};
