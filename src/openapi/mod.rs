//! OpenAPI definition subsystem.
//!
//! # Data Flow
//! ```text
//! service base URI + definition URI
//!     → fetcher.rs (load text: http, https, file)
//!     → parser.rs (YAML/JSON → Document, warnings)
//!     → document.rs (paths, methods, extension maps)
//! ```
//!
//! # Design Decisions
//! - Fetching and parsing sit behind traits so the update loop can be
//!   exercised without a network
//! - Only the parts of the document relevant to routing are modelled

pub mod document;
pub mod fetcher;
pub mod parser;

pub use document::{Document, HttpMethod, OperationObject, PathItem};
pub use fetcher::{ResourceFetcher, ResourceLoader};
pub use parser::{DocumentParser, OpenApiParser, ParsedDocument};
