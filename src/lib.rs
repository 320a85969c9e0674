//! Declare Entity-Relationship models in code and draw them in Chen's
//! notation, with Graphviz doing the placement.
//!
//! ```
//! use std::sync::Arc;
//! use erd::{Count, Entity, IdGenerator, LayoutOptions, Relation, er_renderer};
//!
//! let person = Arc::new(Entity::parse("Person", ["*id", "name: first last"]).unwrap());
//! let pen = Arc::new(Entity::parse("Pen", ["*serial", "~age"]).unwrap());
//! let owns = Relation::builder()
//!     .entity((&person, Count::Exactly(1)))
//!     .entity((&pen, Count::AtLeastOne))
//!     .name("Owns")
//!     .build()
//!     .unwrap();
//!
//! let ids = IdGenerator::new();
//! let graph = er_renderer::build(&[person, pen], &[owns], &LayoutOptions::default(), &ids).unwrap();
//! assert!(graph.source().contains("shape=\"diamond\""));
//! ```

pub mod demos;
pub mod dot_graph;
pub mod er_ast;
pub mod er_layout;
pub mod er_parser;
pub mod er_renderer;
pub mod error;
pub mod uid;

pub use er_ast::{Attribute, AttributeKind, Count, Entity, EntityInfo, EntitySpec, Relation};
pub use er_layout::{LayoutOptions, RenderOptions};
pub use er_parser::{parse_attribute, parse_attributes};
pub use error::{ErdError, ModelError, ParseError, RenderError};
pub use uid::IdGenerator;
