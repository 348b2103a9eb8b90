//! AMF0 as defined in amf0_spec_121207.pdf.

mod decode;
mod define;
mod encode;

pub use self::decode::Amf0Decoder;
pub use self::define::Amf0Marker;
pub use self::encode::Amf0Encoder;
