pub mod median;
pub mod window;

pub use median::median;
pub use window::SampleSet;
