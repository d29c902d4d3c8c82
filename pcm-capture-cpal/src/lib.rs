//! # pcm-capture-cpal
//!
//! Cross-platform input backend for pcm-capture, built on cpal.
//!
//! Provides:
//! - `CpalProvider` / `CpalFrameSource` (feature `cpal`) for the default input device
//! - `ByteQueue` between the device callback and the capture worker
//! - `convert` for turning device samples into the configured PCM encoding
//!
//! ## Usage
//! ```ignore
//! use pcm_capture_core::{CaptureConfiguration, SessionController};
//! use pcm_capture_cpal::CpalProvider;
//!
//! let mut controller = SessionController::new(CpalProvider::default());
//! controller.init(CaptureConfiguration::default())?;
//! controller.start()?;
//! ```

pub mod byte_queue;
pub mod convert;

#[cfg(feature = "cpal")]
pub mod cpal_input;

pub use byte_queue::ByteQueue;

#[cfg(feature = "cpal")]
pub use cpal_input::{CpalFrameSource, CpalProvider};
