pub mod queue;

pub use queue::{dispatch_queue, DispatchReceiver, DispatchSender};
