//! Hemma — a small self-hosted web gateway for a household Home Assistant
//! deployment.
//!
//! The interesting part is the stateless session scheme: a three-segment
//! HMAC-SHA256 signed token (JWT-shaped) carried in an HTTP-only cookie,
//! verified by two independent implementations — the signer-side verifier in
//! [`auth::token`] and the request-gate verifier in [`auth::edge`] — that
//! must agree on every token. Everything else is thin I/O plumbing around
//! Home Assistant and the SMHI forecast API.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod integrations;
