pub mod attachment;
pub mod classifier;
pub mod fetcher;
pub mod providers;
pub mod templates;

pub use classifier::TopicClassifier;
pub use fetcher::{FetchError, PageFetcher};
pub use providers::{
    CompletionParams, CompletionProvider, EmailAttachment, EmailMessage, EmailProvider,
    HuggingFaceProvider, MockEmailProvider, ProviderError, SendReceipt, SmtpProvider,
};
