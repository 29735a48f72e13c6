//! Background tasks spawned from `main`.

pub mod detection_simulator;
pub mod session_sweeper;
