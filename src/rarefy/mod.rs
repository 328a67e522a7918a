pub mod read_pool;
pub mod sampler;
pub mod steps;

pub use read_pool::{build_read_pool, ReadPool, SamplingUnit};
pub use sampler::{rarefy, summarize_recovery, Recovery, RecoverySummary, SamplingMode, Seeding};
pub use steps::generate_steps;
