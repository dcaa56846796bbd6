//! GitHub release resolution, download and extraction
//!
//! ## Module Organization
//!
//! - `platform` - Target triple detection
//! - `resolver` - The asset resolution capability and its data types
//! - `github` - Releases API strategy (fuzzy asset matching)
//! - `convention` - Naming-template strategy (no API call)
//! - `core` - HTTP client and single-file fetch
//! - `extract` - Suffix-dispatched archive extraction

pub mod convention;
pub mod core;
pub mod extract;
pub mod github;
pub mod platform;
pub mod resolver;

// Re-export public API
pub use self::core::{fetch, http_client};
pub use extract::{Extracted, extract};
pub use platform::TargetTriple;
pub use resolver::{AssetResolver, ReleaseSelector, ResolvedAsset};
