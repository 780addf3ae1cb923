// author: kodeholic (powered by Claude)

pub mod codec;
#[cfg(feature = "cpal")]
pub mod cpal_io;
pub mod device;
pub mod frame;

pub use codec::{AudioDecoder, AudioEncoder, CodecKind, CodecSpec};
pub use device::{AudioBackend, AudioSink, AudioSource};
pub use frame::AudioFrame;
