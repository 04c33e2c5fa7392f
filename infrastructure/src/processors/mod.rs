//! Result processors run by the application's `ProcessorRegistry`.

mod address;

pub use address::{AddressRecognitionProcessor, DEFAULT_ADDRESS_PATTERNS};
