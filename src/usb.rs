// Based on USB 2.0 specifications
// https://www.usb.org/document-library/usb-20-specification
// especially usb_20.pdf, chapters 7.1 (signaling) and 8 (packets)

pub mod byte;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod line;
pub mod packet;
pub mod types;
