//! Protocol module containing control-plane message types and the frame codec.

pub mod codec;
pub mod messages;
pub mod sequence;

pub use codec::{decode_frame, decode_request, encode_frame, ProtocolError};
pub use messages::*;
pub use sequence::SequenceCounter;
