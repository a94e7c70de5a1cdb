//! Logging hooks that compile away without the `tracing` feature.
//!
//! Spans wrap the expensive stages (correlation scans, feature extraction,
//! multi-template selection). Events carry the numbers worth inspecting when
//! a match is missed: peak scores, keypoint and correspondence counts, RANSAC
//! inliers. Warnings and errors report failures that a caller only sees as a
//! collapsed error value.

/// Opens an info-level span; use as `let _span = trace_span!(..).entered();`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::DisabledSpan
    };
}

/// Records named measurements at info level.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Reports a recoverable failure, such as a skipped template.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)+) => {
        tracing::warn!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)+) => {
        let _ = format_args!($($arg)+);
    };
}

/// Reports a failure that is swallowed or collapsed into another error.
#[cfg(feature = "tracing")]
macro_rules! trace_error {
    ($($arg:tt)+) => {
        tracing::error!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_error {
    ($($arg:tt)+) => {
        let _ = format_args!($($arg)+);
    };
}

pub(crate) use trace_error;
pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Stand-in span guard for builds without `tracing`.
#[cfg(not(feature = "tracing"))]
pub struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
