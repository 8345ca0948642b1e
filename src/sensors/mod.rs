pub mod registry;
pub mod status;

pub use registry::SensorRegistry;
