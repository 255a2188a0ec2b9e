pub mod digest;
pub mod error;
pub mod exclusion;
pub mod ingest;
pub mod materializer;
pub mod nesting;
pub mod selection;
pub mod tree_builder;
pub mod tree_generator;
pub mod unreadable;

pub use digest::{assemble, Digest, DigestGenerator, DirectoryDigester};
pub use error::{CoreError, ErrorCategory};
pub use exclusion::ExclusionMatcher;
pub use ingest::{create_ingest, IngestOutput};
pub use materializer::{materialize, MaterializeStats};
pub use nesting::collapse_double_nesting;
pub use selection::{CheckState, FsNode, NodeId, SelectionTree};
pub use tree_builder::TreeBuilder;
pub use tree_generator::TreeGenerator;
pub use unreadable::scan_unreadable;
