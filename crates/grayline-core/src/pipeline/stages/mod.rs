//! The three long-lived pipeline workers.
//!
//! Each stage owns its input receiver and output sender. When its input is
//! exhausted it drops the sender (closing the next channel) and then releases
//! its completion token, in that order.

mod collect;
mod fetch;
mod transform;

pub use collect::CollectStage;
pub use fetch::FetchStage;
pub use transform::TransformStage;

/// Run CPU-bound work on the blocking pool.
///
/// A panic inside `f` is resumed on the calling task so it surfaces as a
/// stage failure rather than a silently dropped item.
pub(crate) async fn run_blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}
