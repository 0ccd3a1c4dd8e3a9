//! Client-side RSBSA enrollment: the multi-step form state machine, its local
//! persistence, and the REST boundary it submits through.
pub mod auth;
pub mod backend;
pub mod enrollment;
pub mod storage;
pub mod workspace;
