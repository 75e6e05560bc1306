pub mod audio;
pub mod color;
pub mod governor;
pub mod memory;
pub mod simd;
mod utils;
pub mod video;

pub use governor::{CpuGovernor, GovernorConfig, GovernorError, GovernorState};
pub use simd::{BACKEND, BLEND_BATCH, CONVERT_BATCH, COPY_BLOCK, MAC_BATCH};
