//! Protocol module containing the JSON envelope codec, correlation ids and the
//! typed message catalogue.

pub mod codec;
pub mod events;
pub mod frame;
pub mod id;
pub mod requests;

pub use codec::{decode_payload, encode_params, Codec, CodecError, JsonCodec};
pub use events::Event;
pub use frame::InboundFrame;
pub use id::RequestId;
pub use requests::Request;
