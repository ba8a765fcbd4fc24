pub mod engine;
pub mod errors;
pub mod peer;
pub mod room;
pub mod sfu;
pub mod signal;
pub mod task_queue;

#[cfg(test)]
mod task_queue_test;
