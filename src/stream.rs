//! Streaming API: conversion events as a `Stream`.
//!
//! Same events as [`crate::worker::ConversionHandle::next_event`], wrapped
//! so they compose with `tokio_stream::StreamExt` combinators. The stream
//! ends right after the `Finished` event.
//!
//! # Example
//! ```rust,no_run
//! use parsija::{convert_stream, ConversionConfig, ConversionEvent};
//! use tokio_stream::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConversionConfig::default();
//! let mut events = convert_stream("https://www.verke.org/artikkelit/esimerkki/", &config)?;
//! while let Some(event) = events.next().await {
//!     if let ConversionEvent::Finished { message } = event {
//!         println!("{}", message.render(&config.messages));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::worker::{ConversionEvent, ConversionHandle, Converter};
use std::pin::Pin;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

/// A boxed stream of conversion events.
pub type EventStream = Pin<Box<dyn Stream<Item = ConversionEvent> + Send>>;

impl ConversionHandle {
    /// Turn the handle into a [`Stream`] of its events.
    pub fn into_stream(self) -> EventStream {
        Box::pin(UnboundedReceiverStream::new(self.events))
    }
}

/// Start a one-off background conversion and return its events.
///
/// Must be called from within a tokio runtime.
pub fn convert_stream(
    url: impl Into<String>,
    config: &ConversionConfig,
) -> Result<EventStream, ConvertError> {
    Converter::new(config.clone())
        .start(url)
        .map(ConversionHandle::into_stream)
}
