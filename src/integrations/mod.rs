//! Outbound integrations: thin HTTP wrappers with no algorithmic content.
//!
//! - [`home_assistant`] — state queries and service calls against the local
//!   Home Assistant instance, authenticated with a long-lived token.
//! - [`smhi`] — point forecast fetch from SMHI open data.

pub mod home_assistant;
pub mod smhi;
