//! Low-level realtime primitives shared by both resonator engines.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside engine structs. Coefficients that depend on
//! user-facing settings are recomputed only when a setting actually changes.

/// Automatic gain control (envelope-following limiter).
pub mod agc;
/// Control value clamping, control groups and gate debouncing.
pub mod control;
/// One-pole DC rejection filter.
pub mod dc_reject;
/// Linear-ramp power slewer for click-free on/off transitions.
pub mod slewer;

pub use agc::AutomaticGainControl;
pub use control::{AgcLevelControl, ControlGroup, GateTrigger};
pub use dc_reject::{DcRejectFilter, StereoDcReject};
pub use slewer::{PowerSlewer, SlewState, SlewStatus};
