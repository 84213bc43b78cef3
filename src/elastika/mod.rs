//! Spring-mass mesh resonator with a magnetic curl force.

pub mod controls;
pub mod engine;
pub mod mesh;
pub mod vector;

pub use engine::ElastikaEngine;
pub use mesh::{Ball, BallKind, Mesh, MeshPorts, Spring, StepParams};
pub use vector::Vec3;
