//! Style-document data model for the map style engine.
//!
//! This crate owns the declarative side of a style: property values, zoom
//! functions, layer and source descriptors, and the JSON document parser.
//! Evaluation (cascading classes, transitions, per-frame recalculation)
//! lives in the `style_engine` crate.

pub mod function;
pub mod parser;
pub mod types;
pub mod value;

pub use function::{Function, PropertyValue, Stops};
pub use parser::parse_style;
pub use types::{
    LayerDesc, LayerKind, PaintProperties, PropertyTransition, SourceDesc, SourceKind,
    StyleDocument, Visibility,
};
pub use value::{Color, Value, default_paint_value};
