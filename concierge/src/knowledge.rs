//! Knowledge documents: the only facts the concierge may answer from.
//!
//! A document comes inline with the request or from the configured default
//! source. The default is read at most once per process and then shared
//! read-only between concurrent requests.

use std::{fmt, path::PathBuf, sync::Arc};

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::errors::ConciergeError;

/// Invisible characters that editors and exporters like to prepend.
const INVISIBLE_PREFIX: &[char] = &[
    '\u{feff}', // byte-order mark / zero-width no-break space
    '\u{200b}', // zero-width space
    '\u{200c}', // zero-width non-joiner
    '\u{200d}', // zero-width joiner
    '\u{2060}', // word joiner
];

/// Removes leading BOM / zero-width characters. Idempotent.
pub fn strip_invisible_prefix(text: &str) -> &str {
    text.trim_start_matches(INVISIBLE_PREFIX)
}

/// Immutable, cheaply clonable knowledge text with its invisible prefix removed.
#[derive(Clone, PartialEq, Eq)]
pub struct KnowledgeDocument(Arc<str>);

impl KnowledgeDocument {
    pub fn new(text: &str) -> Self {
        Self(Arc::from(strip_invisible_prefix(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for KnowledgeDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeDocument")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Where the default document comes from when a request carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeSource {
    /// UTF-8 text file, read on first use.
    File(PathBuf),
    /// [`BUILTIN_KNOWLEDGE_BASE`].
    Builtin,
    /// No default: every request must send its own document.
    Disabled,
}

impl KnowledgeSource {
    pub fn label(&self) -> &'static str {
        match self {
            KnowledgeSource::File(_) => "file",
            KnowledgeSource::Builtin => "builtin",
            KnowledgeSource::Disabled => "none",
        }
    }
}

/// Design guidelines shipped with the binary, used when no file is configured.
pub const BUILTIN_KNOWLEDGE_BASE: &str = "\
DESIGN GUIDELINES:
1. Primary Logo Asset: The main SVG file is located in the Shared Google Drive under /Assets/Logos/Primary.svg. Link: https://drive.google.com/folder/primary-logo-svg
2. Brand Colors: The primary color is Hex #4f46e5 (Indigo 600). The secondary color is Hex #10b981 (Emerald 500).
3. Typography: Use the 'Inter' font family exclusively for all user interface elements.
4. Iconography: Use Lucide icons only. Do not use FontAwesome or Material Icons.
";

/// Default-document holder: the source plus a write-once cache.
#[derive(Debug)]
pub struct KnowledgeBase {
    source: KnowledgeSource,
    cached: OnceCell<KnowledgeDocument>,
}

impl KnowledgeBase {
    pub fn new(source: KnowledgeSource) -> Self {
        Self {
            source,
            cached: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &KnowledgeSource {
        &self.source
    }

    /// Returns the default document, loading it on first call.
    ///
    /// A failed load is not cached, so fixing the file does not need a restart.
    ///
    /// # Errors
    /// [`ConciergeError::ConfigurationMissing`] when no source is configured,
    /// the file cannot be read, or it holds only whitespace.
    pub async fn default_document(&self) -> Result<KnowledgeDocument, ConciergeError> {
        self.cached
            .get_or_try_init(|| self.load())
            .await
            .cloned()
    }

    async fn load(&self) -> Result<KnowledgeDocument, ConciergeError> {
        let doc = match &self.source {
            KnowledgeSource::Builtin => KnowledgeDocument::new(BUILTIN_KNOWLEDGE_BASE),
            KnowledgeSource::File(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    warn!(path = %path.display(), error = %e, "failed to read knowledge base file");
                    ConciergeError::ConfigurationMissing(format!(
                        "cannot read knowledge base file {}: {e}",
                        path.display()
                    ))
                })?;
                KnowledgeDocument::new(&text)
            }
            KnowledgeSource::Disabled => {
                return Err(ConciergeError::ConfigurationMissing(
                    "no default knowledge document is configured; send `knowledgeBaseContent`"
                        .into(),
                ));
            }
        };

        if doc.is_blank() {
            return Err(ConciergeError::ConfigurationMissing(format!(
                "default knowledge document ({}) is empty",
                self.source.label()
            )));
        }

        info!(
            source = self.source.label(),
            len = doc.as_str().len(),
            "default knowledge document loaded"
        );
        Ok(doc)
    }
}
