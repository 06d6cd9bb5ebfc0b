//! Asynchronous texture loading.
//!
//! Decoding happens off the frame thread; the renderer polls for completion
//! at the start of each frame and uploads the pixels exactly once.

mod load;
mod source;

pub use load::{DecodeTicket, LoadPhase, TextureLoader};
pub use source::{DecodedImage, FileImageSource, ImageSource};
