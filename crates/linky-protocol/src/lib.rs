pub mod checksum;
pub mod codec;
pub mod dataset;
pub mod decoder;
pub mod extractor;
pub mod mode;
pub mod parser;
pub mod unframer;

pub use codec::TicCodec;
pub use dataset::{Dataset, Quantity, RawDataset};
pub use decoder::TicDecoder;
pub use extractor::{DatasetExtractor, ExtractorState};
pub use mode::TicMode;
pub use parser::{DecoderConfig, FrameParser};
pub use unframer::{FrameListener, Unframer, UnframerState};
