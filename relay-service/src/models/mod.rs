pub mod classification;
pub mod page;
pub mod post;

pub use classification::{ClassificationMethod, ClassificationResult};
pub use page::FetchResult;
pub use post::Post;
