//! PDF ingestion: page extraction and chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{clean_page_text, PdfParser};
pub use processor::{Extraction, IngestOutcome, IngestPipeline};
