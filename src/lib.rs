//! Full-speed USB line codec.
//!
//! Decoding turns a per-tick stream of line states into bytes and typed packets; encoding
//! turns a packet or a raw byte sequence back into line states. Both directions use the same
//! 4x oversampled timing, SYNC, NRZI, bit stuffing and EOP conventions.

pub mod error;
pub mod text;
pub mod usb;

pub use error::{BuildError, Error, FramingError, PacketError};
pub use usb::decoder::Decoder;
pub use usb::encoder::Encoder;
pub use usb::line::LineState;
pub use usb::packet::{decode, Packet};
