pub mod batch;
pub mod pool;

pub use batch::{process_paths, process_uploads, BatchOutcome, FileFailure, FileSummary, Upload};
pub use pool::WorkerPool;
