pub mod entry;
pub mod sample;

pub use entry::QueueEntry;
pub use sample::{Occupancy, Sample};
