//! Shared helpers: generated PDFs and deterministic providers
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use parking_lot::Mutex;

use scholar_rag::config::{ApiKey, RagConfig};
use scholar_rag::error::{Error, Result, ServiceErrorKind};
use scholar_rag::providers::{EmbeddingProvider, LlmProvider, ProviderFactory};
use scholar_rag::types::Citation;

pub const PAGE_ONE: &str = "Survey introduction covering sequence modelling history.";
pub const PAGE_TWO: &str = "Transformer attention heads: eight parallel attention heads per layer.";
pub const PAGE_THREE: &str = "Benchmark results report translation quality scores.";

/// Build a PDF with one line of text per entry; an empty entry makes a blank page
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf should serialize");
    bytes
}

/// The three-page paper used across scenarios
pub fn three_page_pdf() -> Vec<u8> {
    pdf_with_pages(&[PAGE_ONE, PAGE_TWO, PAGE_THREE])
}

/// A PDF whose pages carry no text at all
pub fn image_only_pdf() -> Vec<u8> {
    pdf_with_pages(&["", ""])
}

const DIMENSIONS: usize = 64;

/// Bag-of-words vector: one FNV-hashed bucket per lowercased word
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.to_lowercase().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
    }
    vector
}

/// Everything the fakes observed
#[derive(Default)]
pub struct Calls {
    /// Providers created
    pub factory: AtomicUsize,
    /// Embedding requests
    pub embed: AtomicUsize,
    /// Completion requests
    pub generate: AtomicUsize,
    /// Keys the providers were created with
    pub keys: Mutex<Vec<String>>,
    /// Context passed to the last completion
    pub last_context: Mutex<String>,
    /// Make embedding requests fail
    pub fail_embedding: AtomicBool,
    /// Make completion requests fail
    pub fail_generation: AtomicBool,
    /// Make building the completion provider fail
    pub fail_llm_setup: AtomicBool,
}

impl Calls {
    pub fn factory_calls(&self) -> usize {
        self.factory.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed.load(Ordering::SeqCst)
    }

    pub fn set_fail_embedding(&self, fail: bool) {
        self.fail_embedding.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_generation(&self, fail: bool) {
        self.fail_generation.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_llm_setup(&self, fail: bool) {
        self.fail_llm_setup.store(fail, Ordering::SeqCst);
    }

    pub fn generate_calls(&self) -> usize {
        self.generate.load(Ordering::SeqCst)
    }
}

pub struct FakeEmbedder {
    model: String,
    calls: Arc<Calls>,
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.embed.fetch_add(1, Ordering::SeqCst);
        if self.calls.fail_embedding.load(Ordering::SeqCst) {
            return Err(Error::embedding(ServiceErrorKind::Server, "embedding service down"));
        }
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct FakeLlm {
    model: String,
    calls: Arc<Calls>,
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        citations: &[Citation],
    ) -> Result<String> {
        self.calls.generate.fetch_add(1, Ordering::SeqCst);
        if self.calls.fail_generation.load(Ordering::SeqCst) {
            return Err(Error::llm(ServiceErrorKind::RateLimit, "quota exceeded"));
        }
        *self.calls.last_context.lock() = context.to_string();
        let pages: Vec<String> = citations.iter().map(|c| c.page_number.to_string()).collect();
        Ok(format!("'{}' is answered on page(s) {}", question, pages.join(", ")))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

pub struct FakeProviders {
    pub calls: Arc<Calls>,
}

impl FakeProviders {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Calls::default()),
        }
    }
}

impl ProviderFactory for FakeProviders {
    fn embedder(&self, api_key: &ApiKey, model: &str) -> Result<Arc<dyn EmbeddingProvider>> {
        self.calls.factory.fetch_add(1, Ordering::SeqCst);
        self.calls.keys.lock().push(api_key.expose().to_string());
        Ok(Arc::new(FakeEmbedder {
            model: model.to_string(),
            calls: Arc::clone(&self.calls),
        }))
    }

    fn llm(&self, api_key: &ApiKey, model: &str) -> Result<Arc<dyn LlmProvider>> {
        self.calls.factory.fetch_add(1, Ordering::SeqCst);
        self.calls.keys.lock().push(api_key.expose().to_string());
        if self.calls.fail_llm_setup.load(Ordering::SeqCst) {
            return Err(Error::Config(format!("completion model '{}' unavailable", model)));
        }
        Ok(Arc::new(FakeLlm {
            model: model.to_string(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Config with defaults (size 1000, overlap 200, top_k 4)
pub fn test_config() -> RagConfig {
    RagConfig::default()
}
