//! AMF3 as defined in amf-file-format-spec.pdf.

mod decode;
mod define;
mod encode;
mod u29;

pub use self::decode::Amf3Decoder;
pub use self::define::Amf3Marker;
pub use self::encode::Amf3Encoder;
pub use self::u29::{U29_LIMIT, read_u29, write_u29};
