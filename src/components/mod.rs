//! UI components.

pub mod particle_surface;
