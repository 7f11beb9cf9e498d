//! Macros for building [`crate::error::StreamError`] values.

/// Creates a [`crate::error::StreamError`] from an error kind and a static description.
///
/// Optional dynamic detail is given either positionally (anything implementing `Display`) or
/// with `detail =` to move an owned [`String`]. A source error is attached with `source:`.
#[macro_export]
macro_rules! stream_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::StreamError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::StreamError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::StreamError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        $crate::error::StreamError::from(($kind, $desc, $detail)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::StreamError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Returns early with a [`crate::error::StreamError`], accepting the same forms as [`stream_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::stream_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::stream_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        return ::core::result::Result::Err($crate::stream_error!($kind, $desc, detail = $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::stream_error!($kind, $desc, $detail))
    };
}
