// author: kodeholic (powered by Claude)

pub mod net;
pub mod rtp;
pub mod srtp;

pub use net::{bind_rtp_socket, AudioPipeline, PipelineContext};
pub use srtp::SrtpContext;
