/// Shared tunables for plane calibration and feature point capture
pub mod capture;
pub mod coordinate_system;
pub mod placement;
pub mod wire;
