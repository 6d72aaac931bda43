//! Knowledge base: the fixed support catalog
//!
//! Holds the ordered set of support documents the assistant answers from.
//! The catalog is built once at startup and never mutated; document position
//! doubles as the document's slot in the vector index, so the two collections
//! stay in lockstep by construction.

use serde::{Deserialize, Serialize};

/// A single support document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier (e.g. "doc2")
    pub id: String,
    /// Human-readable title, surfaced as a source citation
    pub title: String,
    /// Full text used for both embedding and prompt context
    pub content: String,
}

impl Document {
    /// Create a new document
    pub fn new(id: &str, title: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

/// Ordered, position-addressed store of support documents
///
/// `KnowledgeBase` is read-only after construction. Index `i` here
/// corresponds to vector `i` in the flat index built from it.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    documents: Vec<Document>,
}

impl KnowledgeBase {
    /// Build a knowledge base from an ordered document list
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// The built-in Shoplite support catalog
    pub fn builtin() -> Self {
        Self::new(vec![
            Document::new(
                "doc1",
                "Shoplite Registration",
                "To register on Shoplite, buyers provide name, email, and password. \
                 Email verification required within 24 hours. Sellers need business \
                 documents, tax ID, bank info. Verification takes 2-3 days.",
            ),
            Document::new(
                "doc2",
                "Shoplite Returns",
                "Returns accepted within 14 days if unused with original packaging. \
                 Digital downloads and personalized items non-returnable. Refunds \
                 processed in 5-7 days to original payment method.",
            ),
            Document::new(
                "doc3",
                "Shoplite Shipping",
                "We offer Standard (5-7 days, $5.99), Express (2-3 days, $12.99), and \
                 Overnight ($24.99) shipping. Free shipping on orders over $50.",
            ),
            Document::new(
                "doc4",
                "Shoplite Payment",
                "We accept all major credit cards, PayPal, and Apple Pay. All \
                 transactions are encrypted and secure. Payment is processed at \
                 checkout and charged when order ships.",
            ),
            Document::new(
                "doc5",
                "Shoplite Customer Support",
                "Our support team is available 24/7 via chat, email, and phone. \
                 Average response time is under 2 hours. We also have a comprehensive \
                 FAQ section and video tutorials.",
            ),
        ])
    }

    /// Number of documents in the store
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document at position `index`, if any
    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    /// Document contents in store order, for batch embedding
    pub fn contents(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.content.as_str()).collect()
    }

    /// Iterate over documents in store order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Consume the store, yielding the ordered document list
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}
