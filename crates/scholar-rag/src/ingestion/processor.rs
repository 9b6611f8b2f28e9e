//! Ingestion pipeline orchestration

use crate::error::{Error, Result};
use crate::types::{Chunk, Document, FileReport, UploadedFile};

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// Outcome of extracting a single upload
#[derive(Debug, Clone)]
pub enum Extraction {
    /// At least one page yielded text
    Extracted(Document),
    /// The PDF opened but no page yielded text
    Empty {
        /// Filename
        filename: String,
        /// Pages in the PDF
        total_pages: u32,
    },
    /// The file could not be read
    Failed {
        /// Filename
        filename: String,
        /// Parser message
        error: String,
    },
}

/// Documents and chunks produced from a set of uploads
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Documents with text, in upload order
    pub documents: Vec<Document>,
    /// Chunks of all documents, in document order
    pub chunks: Vec<Chunk>,
    /// One report per upload, in upload order
    pub reports: Vec<FileReport>,
    /// Messages for files that were excluded
    pub warnings: Vec<String>,
}

/// Main ingestion pipeline: parse + chunk
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    /// PDF parser
    parser: PdfParser,
    /// Text chunker
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(parser: PdfParser, chunker: TextChunker) -> Self {
        Self { parser, chunker }
    }

    /// Extract one upload without failing the batch
    pub fn extract(&self, file: &UploadedFile) -> Extraction {
        match self.parser.parse(&file.filename, &file.data) {
            Ok(pages) => {
                let doc = Document::new(
                    file.filename.clone(),
                    file.content_hash.clone(),
                    file.size(),
                    pages,
                );
                if doc.has_text() {
                    Extraction::Extracted(doc)
                } else {
                    Extraction::Empty {
                        filename: file.filename.clone(),
                        total_pages: doc.total_pages(),
                    }
                }
            }
            Err(Error::FileParse { filename, message }) => Extraction::Failed {
                filename,
                error: message,
            },
            Err(e) => Extraction::Failed {
                filename: file.filename.clone(),
                error: e.to_string(),
            },
        }
    }

    /// Extract and chunk every upload.
    ///
    /// Unreadable and image-only files are reported and skipped. Fails with
    /// [`Error::NoExtractableText`] when none of the files yields text.
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestOutcome> {
        let mut outcome = IngestOutcome::default();

        for file in files {
            match self.extract(file) {
                Extraction::Extracted(mut doc) => {
                    let chunks = self.chunker.chunk_document(&doc);
                    doc.total_chunks = chunks.len() as u32;

                    tracing::info!(
                        "Extracted '{}': {} pages, {} chars, {} chunks",
                        doc.filename,
                        doc.total_pages(),
                        doc.total_text_length(),
                        chunks.len()
                    );

                    outcome.reports.push(FileReport::indexed(&doc));
                    outcome.chunks.extend(chunks);
                    outcome.documents.push(doc);
                }
                Extraction::Empty { filename, total_pages } => {
                    tracing::warn!("No text extracted from '{}' ({} pages)", filename, total_pages);
                    outcome.warnings.push(format!(
                        "{}; the file was excluded",
                        Error::EmptyDocument(filename.clone())
                    ));
                    outcome.reports.push(FileReport::empty(filename, total_pages));
                }
                Extraction::Failed { filename, error } => {
                    tracing::warn!("Skipping unreadable file '{}': {}", filename, error);
                    outcome.warnings.push(format!("{}: could not be read ({})", filename, error));
                    outcome.reports.push(FileReport::failed(filename, error));
                }
            }
        }

        if outcome.documents.is_empty() {
            return Err(Error::NoExtractableText {
                files: outcome.reports,
            });
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileStatus;

    fn pipeline() -> IngestPipeline {
        IngestPipeline::new(PdfParser::default(), TextChunker::new(1000, 200).unwrap())
    }

    #[test]
    fn test_unreadable_file_is_failed() {
        let file = UploadedFile::new("broken.pdf", b"not a pdf".to_vec());
        match pipeline().extract(&file) {
            Extraction::Failed { filename, .. } => assert_eq!(filename, "broken.pdf"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_no_text_anywhere_is_error() {
        let files = vec![
            UploadedFile::new("a.pdf", b"junk".to_vec()),
            UploadedFile::new("b.pdf", b"more junk".to_vec()),
        ];
        match pipeline().ingest(&files) {
            Err(Error::NoExtractableText { files }) => {
                assert_eq!(files.len(), 2);
                assert_eq!(files[0].filename, "a.pdf");
                assert!(files.iter().all(|f| f.status == FileStatus::Failed));
            }
            other => panic!("expected NoExtractableText, got {:?}", other.map(|o| o.chunks.len())),
        }
    }
}
