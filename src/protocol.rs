// author: kodeholic (powered by Claude)

pub mod message;
pub mod sdp;

pub use message::{JanusRequest, JanusResponse};
pub use sdp::{build_sdp_offer, gateway_host, parse_sdp_answer, RemoteEndpoint, SdpAnswer};
