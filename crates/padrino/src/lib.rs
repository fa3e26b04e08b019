//! Back-office core for a student sponsorship program.
//!
//! The program tracks scholarship candidates, the sponsors funding them, the
//! students they become once approved, and the tuition payments recorded per
//! student. The interesting part is the lifecycle coupling between those
//! collections (`program::lifecycle`); everything else is CRUD over a managed
//! document store reached through narrow repository traits.

pub mod config;
pub mod error;
pub mod media;
pub mod program;
pub mod relay;
pub mod report;
pub mod store;
pub mod telemetry;
