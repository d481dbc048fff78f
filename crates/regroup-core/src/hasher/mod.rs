pub mod cache;
pub mod sha256;

pub use cache::HashCache;
pub use sha256::{hash_data, hash_file, ContentDigest};
