//! # Thinner Scene
//!
//! Scene file model and its three interchangeable forms.
//!
//! ## Forms
//! - **Binary** ([`binary`]): the engine's on-disk layout, three schema
//!   versions (v1, v2-prototype, v2) detected from sentinel words
//! - **XML** ([`xml`]): the GSA document read by the level editor
//! - **JSON** ([`json`]): a serde mirror of the XML form
//!
//! Converting binary -> XML/JSON -> binary reproduces the same model.
//! [`detect_form`] tells the three apart by content, and [`designer`] renders
//! a one-way export for the Scene Designer.
//!
//! ## Model
//! A [`SceneFile`] owns a list of [`Entity`] values; each entity owns its
//! [`Component`]s and each component its [`Property`] list. Cross
//! references are plain [`Id`](thinner_core::Id) link IDs, resolved by
//! lookup on the file.
//!
//! ```rust
//! use thinner_core::{Endian, Id};
//! use thinner_scene::{Component, Entity, Point3, Property, SceneFile, SceneVersion, Value};
//!
//! let mut component = Component::new("JPSTransformationComponent", Id::from(2u32));
//! component.properties.push(Property::scalar("Translation", Value::Point3(Point3::new(1.0, 2.0, 3.0))));
//! let mut entity = Entity::new("Root", Id::from(1u32));
//! entity.components.push(component);
//!
//! let mut file = SceneFile::new(SceneVersion::V1);
//! file.objects.entities.push(entity);
//!
//! let bytes = file.encode(Endian::Big).unwrap();
//! assert_eq!(SceneFile::decode(&bytes, Endian::Big).unwrap(), file);
//! ```

pub mod binary;
pub mod designer;
pub mod form;
pub mod json;
pub mod model;
pub mod value;
pub mod version;
pub mod xml;

pub use designer::{designer_class, DESIGNER_DROPPED_PROPERTIES, DESIGNER_ID_WIDTH, PREFAB_COMPONENT};
pub use form::{detect_form, SceneForm};
pub use model::{
    component_label, Component, Entity, Objects, Property, Scene, SceneFile,
    DEFAULT_ENTITY_CLASS, UNKNOWN_LABEL,
};
pub use value::{ColorRgb, ColorRgba, Matrix3, Point2, Point3, PropertyValue, Value, ValueKind};
pub use version::{
    detect_version, detect_version_bytes, SceneVersion, VersionLayout, V2_PROTOTYPE_SENTINEL,
    V2_SENTINEL, WRAPPER_SENTINEL,
};
