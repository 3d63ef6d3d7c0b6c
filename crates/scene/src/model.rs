//! Scene graph model: entities own components, components own properties

use crate::value::{PropertyValue, Value, ValueKind};
use crate::version::SceneVersion;
use thinner_core::Id;

/// Class given to every entity; the binary form does not store it
pub const DEFAULT_ENTITY_CLASS: &str = "JPSGeneralEntity";

/// Display label shown for components whose class has no entry in the table
pub const UNKNOWN_LABEL: &str = "unknown";

const COMPONENT_LABELS: &[(&str, &str)] = &[
    ("NiTransformationComponent", "Transformation"),
    ("JPSTransformationComponent", "Transformation"),
    ("NiSceneGraphComponent", "Scene Graph"),
    ("JPSSceneGraphComponent", "Scene Graph"),
    ("NiLightComponent", "Light"),
    ("JPSLightComponent", "Light"),
    ("NiCameraComponent", "Camera"),
    ("JPSCameraComponent", "Camera"),
];

/// Display label for a component class
pub fn component_label(class_name: &str) -> &'static str {
    COMPONENT_LABELS
        .iter()
        .find(|(class, _)| *class == class_name)
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_LABEL)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub class: ValueKind,
    pub name: String,
    pub asset: bool,
    pub palette: bool,
    pub template: bool,
    pub value: PropertyValue,
}

impl Property {
    /// Unflagged scalar property
    pub fn scalar(name: impl Into<String>, value: Value) -> Self {
        Self {
            class: value.kind(),
            name: name.into(),
            asset: false,
            palette: false,
            template: false,
            value: PropertyValue::Scalar(value),
        }
    }

    /// Unflagged list property; `class` is needed because the list may be empty
    pub fn list(name: impl Into<String>, class: ValueKind, values: Vec<Value>) -> Self {
        Self {
            class,
            name: name.into(),
            asset: false,
            palette: false,
            template: false,
            value: PropertyValue::List(values),
        }
    }

    pub fn with_asset(mut self) -> Self {
        self.asset = true;
        self
    }

    pub fn with_palette(mut self) -> Self {
        self.palette = true;
        self
    }

    pub fn with_template(mut self) -> Self {
        self.template = true;
        self
    }

    pub fn is_list(&self) -> bool {
        self.value.is_list()
    }

    pub fn values(&self) -> &[Value] {
        self.value.values()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub class_name: String,
    pub template_id: Id,
    pub link_id: Id,
    pub master_link_id: Option<Id>,
    pub properties: Vec<Property>,
}

impl Component {
    pub fn new(class_name: impl Into<String>, link_id: Id) -> Self {
        Self {
            class_name: class_name.into(),
            template_id: Id::NULL,
            link_id,
            master_link_id: None,
            properties: Vec::new(),
        }
    }

    /// Derived display name, always recomputed from the class
    pub fn name(&self) -> &'static str {
        component_label(&self.class_name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub class_name: String,
    pub name: String,
    pub link_id: Id,
    pub master_link_id: Option<Id>,
    pub reserved: u32,
    /// Only present in v2 and v2-prototype records
    pub reserved_v2: u32,
    pub components: Vec<Component>,
}

impl Entity {
    pub fn new(name: impl Into<String>, link_id: Id) -> Self {
        Self {
            class_name: DEFAULT_ENTITY_CLASS.to_string(),
            name: name.into(),
            link_id,
            master_link_id: None,
            reserved: 0,
            reserved_v2: 0,
            components: Vec::new(),
        }
    }

    pub fn component(&self, class_name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.class_name == class_name)
    }
}

/// Top-level entities referenced by the scene, in order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub referenced_entities: Vec<Id>,
}

/// Every entity of the file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objects {
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneFile {
    pub version: SceneVersion,
    /// Written only by versions whose layout has a GUID
    pub guid: Id,
    /// Written only by versions whose layout has the extra string table
    pub em2_extra_strings: Vec<String>,
    pub scene: Scene,
    pub objects: Objects,
}

impl SceneFile {
    pub fn new(version: SceneVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn entity_by_link_id(&self, link_id: Id) -> Option<&Entity> {
        self.objects.entities.iter().find(|e| e.link_id == link_id)
    }

    pub fn component_by_link_id(&self, link_id: Id) -> Option<(&Entity, &Component)> {
        self.objects.entities.iter().find_map(|e| {
            e.components
                .iter()
                .find(|c| c.link_id == link_id)
                .map(|c| (e, c))
        })
    }

    /// Entities named by the scene's reference list; unresolved IDs are skipped
    pub fn referenced_entities(&self) -> Vec<&Entity> {
        self.scene
            .referenced_entities
            .iter()
            .filter_map(|id| self.entity_by_link_id(*id))
            .collect()
    }

    /// Every string value of an asset-flagged property, in document order
    pub fn asset_references(&self) -> Vec<&str> {
        self.objects
            .entities
            .iter()
            .flat_map(|e| &e.components)
            .flat_map(|c| &c.properties)
            .filter(|p| p.asset)
            .flat_map(|p| p.values())
            .filter_map(Value::as_str)
            .collect()
    }

    pub fn component_count(&self) -> usize {
        self.objects.entities.iter().map(|e| e.components.len()).sum()
    }

    pub fn property_count(&self) -> usize {
        self.objects
            .entities
            .iter()
            .flat_map(|e| &e.components)
            .map(|c| c.properties.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Point3;

    fn sample() -> SceneFile {
        let mut mesh = Component::new("JPSMeshComponent", Id::from(0x20u32));
        mesh.properties.push(Property::scalar("NIF File Path", Value::String("models/a.nif".into())).with_asset());
        mesh.properties.push(Property::scalar("Label", Value::String("not an asset".into())));
        mesh.properties.push(
            Property::list(
                "Textures",
                ValueKind::String,
                vec![Value::String("t/a.tga".into()), Value::String("t/b.tga".into())],
            )
            .with_asset(),
        );

        let mut root = Entity::new("Root", Id::from(0x10u32));
        root.components.push(mesh);
        let other = Entity::new("Other", Id::from(0x11u32));

        let mut file = SceneFile::new(SceneVersion::V1);
        file.objects.entities = vec![root, other];
        file.scene.referenced_entities = vec![Id::from(0x11u32), Id::from(0x99u32)];
        file
    }

    #[test]
    fn test_component_labels() {
        assert_eq!(component_label("JPSTransformationComponent"), "Transformation");
        assert_eq!(component_label("NiSceneGraphComponent"), "Scene Graph");
        assert_eq!(component_label("JPSLightComponent"), "Light");
        assert_eq!(component_label("NiCameraComponent"), "Camera");
        assert_eq!(component_label("JPSMeshComponent"), "unknown");
    }

    #[test]
    fn test_lookups() {
        let file = sample();
        assert_eq!(file.entity_by_link_id(Id::from(0x11u32)).unwrap().name, "Other");
        let (owner, comp) = file.component_by_link_id(Id::from(0x20u32)).unwrap();
        assert_eq!(owner.name, "Root");
        assert_eq!(comp.class_name, "JPSMeshComponent");
        assert!(file.component_by_link_id(Id::from(0x10u32)).is_none());

        let refs: Vec<&str> = file.referenced_entities().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(refs, vec!["Other"]);
    }

    #[test]
    fn test_asset_references() {
        assert_eq!(
            sample().asset_references(),
            vec!["models/a.nif", "t/a.tga", "t/b.tga"]
        );
    }

    #[test]
    fn test_defaults_are_independent() {
        let mut a = Entity::new("A", Id::from(1u32));
        let b = Entity::new("B", Id::from(2u32));
        a.components.push(Component::new("X", Id::from(3u32)));
        assert!(b.components.is_empty());
        assert_eq!(b.class_name, DEFAULT_ENTITY_CLASS);
    }

    #[test]
    fn test_counts() {
        let mut file = sample();
        assert_eq!(file.component_count(), 1);
        assert_eq!(file.property_count(), 3);

        let comp = &mut file.objects.entities[0].components[0];
        comp.properties.push(Property::scalar("Translation", Value::Point3(Point3::new(1.0, 2.0, 3.0))));
        assert!(comp.property("Translation").is_some());
        assert!(comp.property_mut("Missing").is_none());
    }
}
