//! HTTP surface — JSON triage trigger, HTML table variant, deletion.

pub mod html;
pub mod routes;

pub use routes::{TriageRouteState, triage_routes};
