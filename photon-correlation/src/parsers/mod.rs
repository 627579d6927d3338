pub mod binary;
pub mod text;

pub use binary::{BinaryStream, T2BinaryStream, T3BinaryStream};
pub use text::{TextRecord, TextStream};
