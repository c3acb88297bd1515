//! Classifier trait and common helpers

use candle_core::{Device, Tensor};
use threatscan_core::Result;

/// A sequence classifier producing one raw score per class
///
/// Implementations are synchronous; callers on an async runtime should run
/// them on a blocking thread.
pub trait Classifier: Send + Sync {
    /// Unnormalized class scores for `text`, as a `(num_labels,)` or
    /// `(1, num_labels)` tensor
    fn logits(&self, text: &str) -> Result<Tensor>;

    /// Number of output classes
    fn num_labels(&self) -> usize;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Device the classifier runs on
    fn device(&self) -> &Device;
}

/// Wrap a candle error with context
pub(crate) fn candle_err(context: &'static str) -> impl Fn(candle_core::Error) -> threatscan_core::Error {
    move |e| threatscan_core::Error::classifier(format!("{}: {}", context, e))
}
