mod error;
mod extractor;
mod language;
mod source_location;

pub use error::{ExtractError, Result};
pub use extractor::{
    extract_from_file, extract_from_source, CachedContent, DefaultSourceParser, ExtractConfig,
    SourceParser,
};
pub use language::{Language, SUPPORTED_EXTENSIONS};
pub use source_location::{position_from_offset, Position, Range};
