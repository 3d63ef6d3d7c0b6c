//! JSON form of scene files
//!
//! The document mirrors the XML layout with snake_case keys. IDs are
//! numbers except the template ID and GUID, which keep their hex-group
//! spelling. Property values follow the property class: numbers, booleans,
//! strings, `{"x","y","z"}` style objects, `{"m": [[..],[..],[..]]}` for
//! matrices, or an array of those for list properties.
//!
//! NaN and infinite floats have no JSON spelling and are written as `null`,
//! which reads back as an error.

use crate::model::{Component, Entity, Objects, Property, Scene, SceneFile, DEFAULT_ENTITY_CLASS};
use crate::value::{ColorRgb, ColorRgba, Matrix3, Point2, Point3, PropertyValue, Value, ValueKind};
use crate::version::SceneVersion;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thinner_core::{Id, Result, ThinnerError};

fn default_entity_class() -> String {
    DEFAULT_ENTITY_CLASS.to_string()
}

#[derive(Serialize, Deserialize)]
struct SceneDoc<V> {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    em2_extra_strings: Option<Vec<String>>,
    #[serde(default)]
    scene: Vec<u64>,
    #[serde(default)]
    objects: Vec<EntityDoc<V>>,
}

#[derive(Serialize, Deserialize)]
struct EntityDoc<V> {
    #[serde(default = "default_entity_class")]
    class_name: String,
    #[serde(default)]
    name: String,
    link_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master_link_id: Option<u64>,
    #[serde(default)]
    unknown: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unknown_em2: Option<u32>,
    #[serde(default)]
    components: Vec<ComponentDoc<V>>,
}

#[derive(Serialize, Deserialize)]
struct ComponentDoc<V> {
    class_name: String,
    /// Derived from the class; ignored on read
    #[serde(default)]
    name: String,
    template_id: String,
    link_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master_link_id: Option<u64>,
    #[serde(default)]
    properties: Vec<PropertyDoc<V>>,
}

#[derive(Serialize, Deserialize)]
struct PropertyDoc<V> {
    class: String,
    name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    asset: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    palette: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    template: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    list: bool,
    value: V,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Borrowed view of one value, written with the natural JSON shape
#[derive(Serialize)]
#[serde(untagged)]
enum ValueOut<'a> {
    Unsigned(u64),
    Signed(i64),
    Float(f32),
    Bool(bool),
    Text(&'a str),
    Point2(&'a Point2),
    Point3(&'a Point3),
    ColorRgb(&'a ColorRgb),
    ColorRgba(&'a ColorRgba),
    Matrix3(&'a Matrix3),
    List(Vec<ValueOut<'a>>),
}

fn id_number(id: Id, what: &str) -> Result<u64> {
    u64::try_from(id.get())
        .map_err(|_| ThinnerError::Json(format!("{} {} does not fit in a JSON number", what, id)))
}

fn optional_id_number(id: Option<Id>, what: &str) -> Result<Option<u64>> {
    id.map(|id| id_number(id, what)).transpose()
}

fn value_out(value: &Value) -> Result<ValueOut<'_>> {
    Ok(match value {
        Value::EntityPointer(id) => ValueOut::Unsigned(id_number(*id, "entity pointer")?),
        Value::ColorRgb(c) => ValueOut::ColorRgb(c),
        Value::ColorRgba(c) => ValueOut::ColorRgba(c),
        Value::Point2(p) => ValueOut::Point2(p),
        Value::Point3(p) => ValueOut::Point3(p),
        Value::Matrix3(m) => ValueOut::Matrix3(m),
        Value::Boolean(b) => ValueOut::Bool(*b),
        Value::Integer(v) => ValueOut::Signed(*v as i64),
        Value::UnsignedInteger(v) => ValueOut::Unsigned(*v as u64),
        Value::Float(v) => ValueOut::Float(*v),
        Value::String(s) => ValueOut::Text(s),
        Value::Short(v) => ValueOut::Signed(*v as i64),
        Value::UnsignedShort(v) => ValueOut::Unsigned(*v as u64),
    })
}

fn property_out(property: &Property) -> Result<PropertyDoc<ValueOut<'_>>> {
    let value = match &property.value {
        PropertyValue::Scalar(value) => value_out(value)?,
        PropertyValue::List(values) => {
            ValueOut::List(values.iter().map(value_out).collect::<Result<_>>()?)
        }
    };
    Ok(PropertyDoc {
        class: property.class.class_name().to_string(),
        name: property.name.clone(),
        asset: property.asset,
        palette: property.palette,
        template: property.template,
        list: property.is_list(),
        value,
    })
}

fn component_out(component: &Component) -> Result<ComponentDoc<ValueOut<'_>>> {
    Ok(ComponentDoc {
        class_name: component.class_name.clone(),
        name: component.name().to_string(),
        template_id: component.template_id.to_hex_groups(4),
        link_id: id_number(component.link_id, "link ID")?,
        master_link_id: optional_id_number(component.master_link_id, "master link ID")?,
        properties: component
            .properties
            .iter()
            .map(property_out)
            .collect::<Result<_>>()?,
    })
}

fn entity_out(entity: &Entity, version: SceneVersion) -> Result<EntityDoc<ValueOut<'_>>> {
    Ok(EntityDoc {
        class_name: entity.class_name.clone(),
        name: entity.name.clone(),
        link_id: id_number(entity.link_id, "link ID")?,
        master_link_id: optional_id_number(entity.master_link_id, "master link ID")?,
        unknown: entity.reserved,
        unknown_em2: version.layout().entity_reserved_v2.then_some(entity.reserved_v2),
        components: entity
            .components
            .iter()
            .map(component_out)
            .collect::<Result<_>>()?,
    })
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn json_err(message: String) -> ThinnerError {
    ThinnerError::Json(message)
}

fn typed<T: DeserializeOwned>(raw: &serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| json_err(format!("bad {}: {}", what, e)))
}

fn integer_in<T: TryFrom<i64>>(raw: &serde_json::Value, what: &str) -> Result<T> {
    raw.as_i64()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| json_err(format!("{} out of range: {}", what, raw)))
}

fn value_in(raw: &serde_json::Value, kind: ValueKind) -> Result<Value> {
    let what = kind.class_name();
    Ok(match kind {
        ValueKind::EntityPointer => {
            let id = raw
                .as_u64()
                .ok_or_else(|| json_err(format!("bad {}: {}", what, raw)))?;
            Value::EntityPointer(Id::from(id))
        }
        ValueKind::ColorRgb => Value::ColorRgb(typed(raw, what)?),
        ValueKind::ColorRgba => Value::ColorRgba(typed(raw, what)?),
        ValueKind::Point2 => Value::Point2(typed(raw, what)?),
        ValueKind::Point3 => Value::Point3(typed(raw, what)?),
        ValueKind::Matrix3 => Value::Matrix3(typed(raw, what)?),
        ValueKind::Boolean => Value::Boolean(typed(raw, what)?),
        ValueKind::Integer => Value::Integer(integer_in(raw, what)?),
        ValueKind::UnsignedInteger => Value::UnsignedInteger(integer_in(raw, what)?),
        ValueKind::Float => Value::Float(typed(raw, what)?),
        ValueKind::String => Value::String(typed(raw, what)?),
        ValueKind::Short => Value::Short(integer_in(raw, what)?),
        ValueKind::UnsignedShort => Value::UnsignedShort(integer_in(raw, what)?),
    })
}

fn property_in(doc: PropertyDoc<serde_json::Value>) -> Result<Property> {
    let class = ValueKind::from_class_name(&doc.class)
        .ok_or_else(|| json_err(format!("unknown property class {:?}", doc.class)))?;

    let value = match doc.value {
        serde_json::Value::Array(items) => PropertyValue::List(
            items
                .iter()
                .map(|item| value_in(item, class))
                .collect::<Result<_>>()?,
        ),
        raw if doc.list => {
            return Err(json_err(format!(
                "list property {:?} needs an array, got {}",
                doc.name, raw
            )))
        }
        raw => PropertyValue::Scalar(value_in(&raw, class)?),
    };

    Ok(Property {
        class,
        name: doc.name,
        asset: doc.asset,
        palette: doc.palette,
        template: doc.template,
        value,
    })
}

fn parse_id(text: &str) -> Result<Id> {
    text.parse::<Id>().map_err(|e| json_err(e.to_string()))
}

fn master_in(id: Option<u64>) -> Option<Id> {
    id.filter(|v| *v != 0).map(Id::from)
}

fn component_in(doc: ComponentDoc<serde_json::Value>) -> Result<Component> {
    Ok(Component {
        class_name: doc.class_name,
        template_id: parse_id(&doc.template_id)?,
        link_id: Id::from(doc.link_id),
        master_link_id: master_in(doc.master_link_id),
        properties: doc
            .properties
            .into_iter()
            .map(property_in)
            .collect::<Result<_>>()?,
    })
}

fn entity_in(doc: EntityDoc<serde_json::Value>) -> Result<Entity> {
    Ok(Entity {
        class_name: doc.class_name,
        name: doc.name,
        link_id: Id::from(doc.link_id),
        master_link_id: master_in(doc.master_link_id),
        reserved: doc.unknown,
        reserved_v2: doc.unknown_em2.unwrap_or(0),
        components: doc
            .components
            .into_iter()
            .map(component_in)
            .collect::<Result<_>>()?,
    })
}

impl SceneFile {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let layout = self.version.layout();
        let doc = SceneDoc {
            version: self.version.number(),
            guid: layout.has_guid.then(|| self.guid.to_hex_groups(16)),
            em2_extra_strings: layout
                .has_extra_strings
                .then(|| self.em2_extra_strings.clone()),
            scene: self
                .scene
                .referenced_entities
                .iter()
                .map(|id| id_number(*id, "scene reference"))
                .collect::<Result<_>>()?,
            objects: self
                .objects
                .entities
                .iter()
                .map(|e| entity_out(e, self.version))
                .collect::<Result<_>>()?,
        };

        let text = if pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let doc: SceneDoc<serde_json::Value> = serde_json::from_str(text)?;
        let version = SceneVersion::from_number(doc.version)
            .ok_or_else(|| json_err(format!("unknown scene version {}", doc.version)))?;
        let layout = version.layout();

        let mut file = SceneFile::new(version);
        if layout.has_guid {
            if let Some(guid) = &doc.guid {
                file.guid = parse_id(guid)?;
            }
        }
        if layout.has_extra_strings {
            file.em2_extra_strings = doc.em2_extra_strings.unwrap_or_default();
        }
        file.scene = Scene {
            referenced_entities: doc.scene.into_iter().map(Id::from).collect(),
        };
        file.objects = Objects {
            entities: doc
                .objects
                .into_iter()
                .map(entity_in)
                .collect::<Result<_>>()?,
        };
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SceneFile {
        let mut component = Component::new("JPSCameraComponent", Id::from(0x0001_0002u32));
        component.template_id = Id::from(0x11au32);
        component.properties = vec![
            Property::scalar("Position", Value::Point3(Point3::new(0.1, 2.0, -3.5))),
            Property::scalar("Orientation", Value::Matrix3(Matrix3::IDENTITY)),
            Property::list(
                "Stack",
                ValueKind::Matrix3,
                vec![Value::Matrix3(Matrix3::IDENTITY)],
            ),
            Property::list("Empty", ValueKind::Short, vec![]).with_template(),
            Property::scalar("Owner", Value::EntityPointer(Id::from(0x0001_0001u32))),
            Property::scalar("Fov", Value::Float(0.785)),
            Property::scalar("Tag", Value::String("cam".into())).with_palette(),
            Property::scalar("Depth", Value::Short(-2)),
            Property::scalar("Mask", Value::UnsignedShort(65535)),
            Property::scalar("Ortho", Value::Boolean(false)),
        ];
        let mut entity = Entity::new("Camera", Id::from(0x0001_0001u32));
        entity.master_link_id = Some(Id::from(5u32));
        entity.components.push(component);

        let mut file = SceneFile::new(SceneVersion::V2Prototype);
        file.guid = Id::new(u128::MAX - 1);
        file.em2_extra_strings = vec!["x".into()];
        file.objects.entities.push(entity);
        file.scene.referenced_entities.push(Id::from(0x0001_0001u32));
        file
    }

    #[test]
    fn test_roundtrip() {
        let file = sample();
        for pretty in [true, false] {
            let text = file.to_json(pretty).unwrap();
            assert_eq!(SceneFile::from_json(&text).unwrap(), file, "{}", text);
        }
    }

    #[test]
    fn test_document_shape() {
        let text = sample().to_json(false).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["version"], 2);
        assert_eq!(doc["scene"][0], 0x0001_0001);
        let entity = &doc["objects"][0];
        assert_eq!(entity["master_link_id"], 5);
        assert_eq!(entity["unknown_em2"], 0);
        let component = &entity["components"][0];
        assert_eq!(component["name"], "Camera");
        assert_eq!(component["template_id"], "00,00,01,1a");
        assert!(component.get("master_link_id").is_none());
        let props = &component["properties"];
        assert_eq!(props[0]["value"]["z"], -3.5);
        assert_eq!(props[1]["value"]["m"][1][1], 1.0);
        assert_eq!(props[3]["list"], true);
        assert_eq!(props[3]["template"], true);
        assert!(props[4].get("asset").is_none());
        assert_eq!(props[4]["value"], 0x0001_0001);
        // f32 digits, not the widened f64 ones
        assert!(text.contains("0.785"));
        assert!(!text.contains("0.78500"));
    }

    #[test]
    fn test_v1_omits_v2_fields() {
        let mut file = sample();
        file.version = SceneVersion::V1;
        file.em2_extra_strings.clear();
        let text = file.to_json(false).unwrap();
        assert!(!text.contains("em2_extra_strings"));
        assert!(!text.contains("unknown_em2"));
        assert!(text.contains("\"guid\""));
    }

    #[test]
    fn test_rejects_bad_values() {
        let doc = |class: &str, value: &str| {
            format!(
                r#"{{"version":1,"objects":[{{"link_id":1,"components":[{{"class_name":"C","template_id":"0,0,0,0","link_id":2,
                "properties":[{{"class":"{}","name":"p","value":{}}}]}}]}}]}}"#,
                class, value
            )
        };
        assert!(SceneFile::from_json(&doc("Short", "40000")).is_err());
        assert!(SceneFile::from_json(&doc("Unsigned Integer", "-1")).is_err());
        assert!(SceneFile::from_json(&doc("Point2", "{\"x\":1}")).is_err());
        assert!(SceneFile::from_json(&doc("Float", "null")).is_err());
        assert!(matches!(
            SceneFile::from_json(&doc("Quaternion", "1")),
            Err(ThinnerError::Json(_))
        ));
        let ok = SceneFile::from_json(&doc("Integer", "-7")).unwrap();
        let entity = &ok.objects.entities[0];
        assert_eq!(entity.class_name, DEFAULT_ENTITY_CLASS);
        assert_eq!(
            entity.components[0].properties[0].value,
            PropertyValue::Scalar(Value::Integer(-7))
        );
    }
}
