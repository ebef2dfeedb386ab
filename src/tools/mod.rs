pub mod colmap;
pub mod opensplat;
pub mod runner;
