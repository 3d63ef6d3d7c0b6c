//! Scene Designer export
//!
//! The editor wants a different XML arrangement from the GSA form:
//! - `JPS` class prefixes become `Ni`, and only `Ni` components survive
//!   (prefab components excepted)
//! - runtime-only properties are dropped
//! - IDs are written as 16 byte groups
//! - components move out of their entity into `<OBJECTS>`; the entity keeps a
//!   `<COMPONENT RefLinkID>` for each
//!
//! The export is one way. [`SceneFile::from_xml`] does not read it back.

use crate::model::{Component, Entity, SceneFile};
use crate::xml::XmlOut;
use thinner_core::Result;

/// Byte groups per ID in the export
pub const DESIGNER_ID_WIDTH: usize = 16;

/// Component class the editor rebuilds itself
pub const PREFAB_COMPONENT: &str = "NiPrefabComponent";

/// Properties the editor rejects
pub const DESIGNER_DROPPED_PROPERTIES: &[&str] = &[
    "DisallowRotation",
    "Force Update",
    "Stop Scene Designer Updates",
    "NoBatch",
    "Light Group",
    "Unique",
    "Static Lighting Participation",
    "Hardware Lighting Participation",
    "Special Rendering",
    "StartAnimationUsingGlobalTime",
    "AnimateWhenThinned",
    "Parent Entity",
    "Bone Attach Name",
    "Bone Attach Rotate Mode",
    "Bone Attach Offset",
    "Use Delta Time",
    "Dynamic Light Layers",
    "Hardware Light Affected Entities",
    "Player Camera",
    "Inherit Default Camera Properties",
];

/// `JPSFoo` -> `NiFoo`; other names unchanged
pub fn designer_class(class_name: &str) -> String {
    match class_name.strip_prefix("JPS") {
        Some(rest) => format!("Ni{}", rest),
        None => class_name.to_string(),
    }
}

fn designer_component(component: &Component) -> Option<Component> {
    let class_name = designer_class(&component.class_name);
    if !class_name.starts_with("Ni") || class_name == PREFAB_COMPONENT {
        return None;
    }

    let mut component = component.clone();
    component.class_name = class_name;
    component
        .properties
        .retain(|p| !DESIGNER_DROPPED_PROPERTIES.contains(&p.name.as_str()));
    Some(component)
}

fn designer_entity(entity: &Entity) -> Entity {
    Entity {
        class_name: designer_class(&entity.class_name),
        components: entity
            .components
            .iter()
            .filter_map(designer_component)
            .collect(),
        ..entity.clone()
    }
}

impl SceneFile {
    /// Copy with the renames and removals of the Scene Designer export applied
    pub fn to_designer(&self) -> SceneFile {
        let mut file = self.clone();
        file.objects.entities = self.objects.entities.iter().map(designer_entity).collect();
        file
    }

    /// Render the Scene Designer XML
    pub fn to_scene_designer_xml(&self, pretty: bool) -> Result<String> {
        let file = self.to_designer();
        let mut out = XmlOut::new(pretty, DESIGNER_ID_WIDTH);
        out.header(&file)?;

        let entities = &file.objects.entities;
        if entities.is_empty() {
            out.empty("OBJECTS", &[])?;
            return out.finish();
        }

        out.start("OBJECTS", &[])?;
        for entity in entities {
            let attrs = out.entity_attrs(entity, file.version);
            if entity.components.is_empty() {
                out.empty("ENTITY", &attrs)?;
                continue;
            }
            out.start("ENTITY", &attrs)?;
            for component in &entity.components {
                let reference = [("RefLinkID", out.id(component.link_id))];
                out.empty("COMPONENT", &reference)?;
            }
            out.end("ENTITY")?;
        }
        for component in entities.iter().flat_map(|e| &e.components) {
            out.component(component)?;
        }
        out.end("OBJECTS")?;

        tracing::debug!(
            "rendered Scene Designer XML: {} entities, {} components",
            entities.len(),
            file.component_count()
        );
        out.finish()
    }
}
