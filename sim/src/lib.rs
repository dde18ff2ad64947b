// Library exports for the simulated strut-length device

pub mod device;
pub mod server;
pub mod sim_config;

pub use device::SimulatedPlatform;
pub use server::serve;
pub use sim_config::{Fault, SimConfig};
