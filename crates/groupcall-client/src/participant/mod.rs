//! Room participants and their registry

#[allow(clippy::module_inception)]
pub mod participant;
pub mod registry;

pub use participant::{NegotiationState, Participant};
pub use registry::ParticipantRegistry;
