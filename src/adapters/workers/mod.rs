//! Background workers.

mod reconciliation_worker;

pub use reconciliation_worker::{ReconciliationWorker, WorkerError};
