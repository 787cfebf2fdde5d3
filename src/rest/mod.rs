//! REST read path: resolve a topic or type, serialize it, attach resource links.

pub mod http;
pub mod links;
pub mod resolver;
pub mod serializer;
pub mod types;

pub use http::{build_router, AppState, RestServer};
pub use links::LinkBuilder;
pub use resolver::SchemaResolver;
pub use serializer::GraphSerializer;
pub use types::{Composite, CompositeValue, NodeDocument, TopicSummary, TypeDocument};
