pub mod status_update_worker;

pub use status_update_worker::StatusUpdateWorker;
