//! Model loading plumbing
//!
//! Shared infrastructure for the candle backends: device selection,
//! HuggingFace Hub downloads, and tokenizer handling.

pub mod device;
pub mod hub;
pub mod tokenizer;

pub use device::{device_label, select_device, DevicePreference};
pub use hub::{ModelLoader, ModelPath};
pub use tokenizer::{EncodedInput, TokenizerWrapper};
