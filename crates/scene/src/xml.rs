//! GSA XML form of scene files
//!
//! ```text
//! <GSA Major="2" Minor="0" Patch="0" Version="1" UniqueID="...">
//!   <EM2ExtraStrings><String>...</String></EM2ExtraStrings>
//!   <SCENE Class="NiScene" Name="Main Scene"><ENTITY RefLinkID="..."/></SCENE>
//!   <OBJECTS>
//!     <ENTITY Class Name LinkID MasterLinkID Unknown UnknownEM2>
//!       <COMPONENT Class Name TemplateID LinkID MasterLinkID>
//!         <PROPERTY Class Name Asset Palette Template List>value or ITEMs</PROPERTY>
//! ```
//! Text content is kept verbatim, so string values survive leading and
//! trailing whitespace. Text inside elements that have child elements is
//! ignored.

use crate::model::{Component, Entity, Objects, Property, Scene, SceneFile, DEFAULT_ENTITY_CLASS};
use crate::value::{ColorRgb, ColorRgba, Matrix3, Point2, Point3, PropertyValue, Value, ValueKind};
use crate::version::SceneVersion;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;
use thinner_core::{Id, Result, ThinnerError};

const TRUE: &str = "TRUE";
const FALSE: &str = "FALSE";
const NULL_REF: &str = "NULL";

fn xml_err<E: Display>(err: E) -> ThinnerError {
    ThinnerError::Xml(err.to_string())
}

fn float_text(value: f32) -> String {
    // Debug formatting is the shortest text that parses back to the same f32
    format!("{:?}", value)
}

fn floats_text(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| float_text(*v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Byte groups written for link and template IDs
pub(crate) const ID_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub(crate) struct XmlOut {
    writer: Writer<Vec<u8>>,
    pretty: bool,
    id_width: usize,
}

impl XmlOut {
    pub(crate) fn new(pretty: bool, id_width: usize) -> Self {
        let writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 4)
        } else {
            Writer::new(Vec::new())
        };
        Self {
            writer,
            pretty,
            id_width,
        }
    }

    pub(crate) fn id(&self, id: Id) -> String {
        id.to_hex_groups(self.id_width)
    }

    fn reference(&self, id: Id) -> String {
        if id.is_null() {
            NULL_REF.to_string()
        } else {
            self.id(id)
        }
    }
    fn element<'a>(name: &'a str, attrs: &[(&str, String)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (key, value) in attrs {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.writer
            .write_event(Event::Start(Self::element(name, attrs)))
            .map_err(xml_err)
    }

    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        self.writer
            .write_event(Event::Empty(Self::element(name, attrs)))
            .map_err(xml_err)
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_err)
    }

    /// Element holding only text; empty text becomes an empty element
    fn leaf(&mut self, name: &str, attrs: &[(&str, String)], text: &str) -> Result<()> {
        if text.is_empty() {
            return self.empty(name, attrs);
        }
        self.start(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_err)?;
        self.end(name)
    }

    fn value(&mut self, name: &str, attrs: &[(&str, String)], value: &Value) -> Result<()> {
        match value {
            Value::EntityPointer(id) => {
                let mut attrs = attrs.to_vec();
                attrs.push(("RefLinkID", self.reference(*id)));
                self.empty(name, &attrs)
            }
            Value::Matrix3(matrix) => {
                self.start(name, attrs)?;
                for row in &matrix.m {
                    self.leaf("ROW", &[], &floats_text(row))?;
                }
                self.end(name)
            }
            other => self.leaf(name, attrs, &value_text(other)),
        }
    }

    fn property(&mut self, property: &Property) -> Result<()> {
        let mut attrs = vec![
            ("Class", property.class.class_name().to_string()),
            ("Name", property.name.clone()),
        ];
        for (key, set) in [
            ("Asset", property.asset),
            ("Palette", property.palette),
            ("Template", property.template),
        ] {
            if set {
                attrs.push((key, TRUE.to_string()));
            }
        }

        match &property.value {
            PropertyValue::Scalar(value) => self.value("PROPERTY", &attrs, value),
            PropertyValue::List(values) if values.is_empty() => {
                attrs.push(("List", TRUE.to_string()));
                self.empty("PROPERTY", &attrs)
            }
            PropertyValue::List(values) => {
                self.start("PROPERTY", &attrs)?;
                for value in values {
                    self.value("ITEM", &[], value)?;
                }
                self.end("PROPERTY")
            }
        }
    }

    pub(crate) fn component(&mut self, component: &Component) -> Result<()> {
        let mut attrs = vec![
            ("Class", component.class_name.clone()),
            ("Name", component.name().to_string()),
            ("TemplateID", self.id(component.template_id)),
            ("LinkID", self.id(component.link_id)),
        ];
        if let Some(master) = component.master_link_id {
            attrs.push(("MasterLinkID", self.id(master)));
        }

        if component.properties.is_empty() {
            return self.empty("COMPONENT", &attrs);
        }
        self.start("COMPONENT", &attrs)?;
        for property in &component.properties {
            self.property(property)?;
        }
        self.end("COMPONENT")
    }

    pub(crate) fn entity_attrs(
        &self,
        entity: &Entity,
        version: SceneVersion,
    ) -> Vec<(&'static str, String)> {
        let mut attrs = vec![
            ("Class", entity.class_name.clone()),
            ("Name", entity.name.clone()),
            ("LinkID", self.id(entity.link_id)),
        ];
        if let Some(master) = entity.master_link_id {
            attrs.push(("MasterLinkID", self.id(master)));
        }
        if entity.reserved != 0 {
            attrs.push(("Unknown", entity.reserved.to_string()));
        }
        if version.layout().entity_reserved_v2 {
            attrs.push(("UnknownEM2", entity.reserved_v2.to_string()));
        }
        attrs
    }

    fn entity(&mut self, entity: &Entity, version: SceneVersion) -> Result<()> {
        let attrs = self.entity_attrs(entity, version);
        if entity.components.is_empty() {
            return self.empty("ENTITY", &attrs);
        }
        self.start("ENTITY", &attrs)?;
        for component in &entity.components {
            self.component(component)?;
        }
        self.end("ENTITY")
    }

    /// Declaration, `<GSA>` and everything before `<OBJECTS>`
    pub(crate) fn header(&mut self, file: &SceneFile) -> Result<()> {
        let layout = file.version.layout();

        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(xml_err)?;

        let mut attrs = vec![
            ("Major", "2".to_string()),
            ("Minor", "0".to_string()),
            ("Patch", "0".to_string()),
            ("Version", file.version.number().to_string()),
        ];
        if layout.has_guid {
            attrs.push(("UniqueID", file.guid.to_hex_groups(16)));
        }
        self.start("GSA", &attrs)?;

        if layout.has_extra_strings {
            if file.em2_extra_strings.is_empty() {
                self.empty("EM2ExtraStrings", &[])?;
            } else {
                self.start("EM2ExtraStrings", &[])?;
                for text in &file.em2_extra_strings {
                    self.leaf("String", &[], text)?;
                }
                self.end("EM2ExtraStrings")?;
            }
        }

        let scene_attrs = [
            ("Class", "NiScene".to_string()),
            ("Name", "Main Scene".to_string()),
        ];
        if file.scene.referenced_entities.is_empty() {
            self.empty("SCENE", &scene_attrs)
        } else {
            self.start("SCENE", &scene_attrs)?;
            for id in &file.scene.referenced_entities {
                let attrs = [("RefLinkID", self.id(*id))];
                self.empty("ENTITY", &attrs)?;
            }
            self.end("SCENE")
        }
    }

    /// Close `<GSA>` and hand back the text
    pub(crate) fn finish(mut self) -> Result<String> {
        self.end("GSA")?;
        let mut bytes = self.writer.into_inner();
        if self.pretty {
            bytes.push(b'\n');
        }
        String::from_utf8(bytes).map_err(xml_err)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::EntityPointer(id) if id.is_null() => NULL_REF.to_string(),
        Value::EntityPointer(id) => id.to_hex_groups(ID_WIDTH),
        Value::ColorRgb(c) => floats_text(&[c.r, c.g, c.b]),
        Value::ColorRgba(c) => floats_text(&[c.r, c.g, c.b, c.a]),
        Value::Point2(p) => floats_text(&[p.x, p.y]),
        Value::Point3(p) => floats_text(&[p.x, p.y, p.z]),
        Value::Matrix3(m) => m.m.iter().map(|row| floats_text(row)).collect::<Vec<_>>().join("; "),
        Value::Boolean(b) => (if *b { TRUE } else { FALSE }).to_string(),
        Value::Integer(v) => v.to_string(),
        Value::UnsignedInteger(v) => v.to_string(),
        Value::Float(v) => float_text(*v),
        Value::String(s) => s.clone(),
        Value::Short(v) => v.to_string(),
        Value::UnsignedShort(v) => v.to_string(),
    }
}

impl SceneFile {
    /// Render as GSA XML
    pub fn to_xml(&self, pretty: bool) -> Result<String> {
        let mut out = XmlOut::new(pretty, ID_WIDTH);
        out.header(self)?;

        if self.objects.entities.is_empty() {
            out.empty("OBJECTS", &[])?;
        } else {
            out.start("OBJECTS", &[])?;
            for entity in &self.objects.entities {
                out.entity(entity, self.version)?;
            }
            out.end("OBJECTS")?;
        }
        out.finish()
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Minimal element tree built from reader events
#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut node = Node {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Node::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            node.attrs.push((key, value));
        }
        Ok(node)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| {
            ThinnerError::Xml(format!("<{}> is missing the {} attribute", self.name, key))
        })
    }

    fn flag(&self, key: &str) -> bool {
        self.attr(key)
            .map(|v| v.eq_ignore_ascii_case(TRUE))
            .unwrap_or(false)
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of a leaf element; empty for elements with children
    fn leaf_text(&self) -> &str {
        if self.children.is_empty() {
            &self.text
        } else {
            ""
        }
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(ThinnerError::Xml("more than one root element".into())),
    }
    Ok(())
}

fn parse_tree(text: &str) -> Result<Node> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(start) => stack.push(Node::from_start(&start)?),
            Event::Empty(start) => {
                let node = Node::from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ThinnerError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ThinnerError::Xml(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| ThinnerError::Xml("document has no root element".into()))
}

fn parse_id(text: &str) -> Result<Id> {
    text.parse::<Id>().map_err(xml_err)
}

fn parse_master(node: &Node) -> Result<Option<Id>> {
    match node.attr("MasterLinkID") {
        Some(text) => {
            let id = parse_id(text)?;
            Ok((!id.is_null()).then_some(id))
        }
        None => Ok(None),
    }
}

fn parse_ref(text: &str) -> Result<Id> {
    if text.trim() == NULL_REF {
        Ok(Id::NULL)
    } else {
        parse_id(text)
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str) -> Result<T>
where
    T::Err: Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| ThinnerError::Xml(format!("bad {} {:?}: {}", what, text, e)))
}

fn parse_floats<const N: usize>(text: &str, what: &str) -> Result<[f32; N]> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != N {
        return Err(ThinnerError::Xml(format!(
            "{} needs {} components, got {:?}",
            what, N, text
        )));
    }
    let mut out = [0.0f32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = parse_number(part, what)?;
    }
    Ok(out)
}

fn parse_bool(text: &str) -> Result<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case(TRUE) || text == "1" {
        Ok(true)
    } else if text.eq_ignore_ascii_case(FALSE) || text == "0" {
        Ok(false)
    } else {
        Err(ThinnerError::Xml(format!("bad Boolean {:?}", text)))
    }
}

fn parse_value(node: &Node, kind: ValueKind) -> Result<Value> {
    let text = node.leaf_text();
    let what = kind.class_name();
    Ok(match kind {
        ValueKind::EntityPointer => Value::EntityPointer(parse_ref(node.required("RefLinkID")?)?),
        ValueKind::ColorRgb => {
            let [r, g, b] = parse_floats(text, what)?;
            Value::ColorRgb(ColorRgb { r, g, b })
        }
        ValueKind::ColorRgba => {
            let [r, g, b, a] = parse_floats(text, what)?;
            Value::ColorRgba(ColorRgba { r, g, b, a })
        }
        ValueKind::Point2 => {
            let [x, y] = parse_floats(text, what)?;
            Value::Point2(Point2 { x, y })
        }
        ValueKind::Point3 => {
            let [x, y, z] = parse_floats(text, what)?;
            Value::Point3(Point3 { x, y, z })
        }
        ValueKind::Matrix3 => {
            let rows: Vec<&Node> = node.children_named("ROW").collect();
            if rows.len() != 3 {
                return Err(ThinnerError::Xml(format!(
                    "Matrix3 needs 3 ROW elements, got {}",
                    rows.len()
                )));
            }
            let mut m = [[0.0f32; 3]; 3];
            for (slot, row) in m.iter_mut().zip(rows) {
                *slot = parse_floats(row.leaf_text(), "Matrix3 row")?;
            }
            Value::Matrix3(Matrix3 { m })
        }
        ValueKind::Boolean => Value::Boolean(parse_bool(text)?),
        ValueKind::Integer => Value::Integer(parse_number(text, what)?),
        ValueKind::UnsignedInteger => Value::UnsignedInteger(parse_number(text, what)?),
        ValueKind::Float => Value::Float(parse_number(text, what)?),
        ValueKind::String => Value::String(text.to_string()),
        ValueKind::Short => Value::Short(parse_number(text, what)?),
        ValueKind::UnsignedShort => Value::UnsignedShort(parse_number(text, what)?),
    })
}

fn parse_property(node: &Node) -> Result<Property> {
    let class_name = node.required("Class")?;
    let class = ValueKind::from_class_name(class_name)
        .ok_or_else(|| ThinnerError::Xml(format!("unknown property class {:?}", class_name)))?;

    let items: Vec<&Node> = node.children_named("ITEM").collect();
    let value = if !items.is_empty() || node.flag("List") {
        PropertyValue::List(
            items
                .into_iter()
                .map(|item| parse_value(item, class))
                .collect::<Result<_>>()?,
        )
    } else {
        PropertyValue::Scalar(parse_value(node, class)?)
    };

    Ok(Property {
        class,
        name: node.required("Name")?.to_string(),
        asset: node.flag("Asset"),
        palette: node.flag("Palette"),
        template: node.flag("Template"),
        value,
    })
}

fn parse_component(node: &Node) -> Result<Component> {
    Ok(Component {
        class_name: node.required("Class")?.to_string(),
        template_id: parse_id(node.required("TemplateID")?)?,
        link_id: parse_id(node.required("LinkID")?)?,
        master_link_id: parse_master(node)?,
        properties: node
            .children_named("PROPERTY")
            .map(parse_property)
            .collect::<Result<_>>()?,
    })
}

fn parse_entity(node: &Node) -> Result<Entity> {
    Ok(Entity {
        class_name: node.attr("Class").unwrap_or(DEFAULT_ENTITY_CLASS).to_string(),
        name: node.attr("Name").unwrap_or_default().to_string(),
        link_id: parse_id(node.required("LinkID")?)?,
        master_link_id: parse_master(node)?,
        reserved: node
            .attr("Unknown")
            .map(|t| parse_number(t, "Unknown"))
            .transpose()?
            .unwrap_or(0),
        reserved_v2: node
            .attr("UnknownEM2")
            .map(|t| parse_number(t, "UnknownEM2"))
            .transpose()?
            .unwrap_or(0),
        components: node
            .children_named("COMPONENT")
            .map(parse_component)
            .collect::<Result<_>>()?,
    })
}

impl SceneFile {
    /// Parse GSA XML
    pub fn from_xml(text: &str) -> Result<Self> {
        let root = parse_tree(text)?;
        if root.name != "GSA" {
            return Err(ThinnerError::Xml(format!(
                "expected <GSA> root, found <{}>",
                root.name
            )));
        }

        let number: u32 = parse_number(root.required("Version")?, "Version")?;
        let version = SceneVersion::from_number(number)
            .ok_or_else(|| ThinnerError::Xml(format!("unknown scene version {}", number)))?;
        let layout = version.layout();

        let mut file = SceneFile::new(version);
        if layout.has_guid {
            file.guid = parse_id(root.required("UniqueID")?)?;
        }
        if layout.has_extra_strings {
            if let Some(extra) = root.child("EM2ExtraStrings") {
                file.em2_extra_strings = extra
                    .children_named("String")
                    .map(|s| s.leaf_text().to_string())
                    .collect();
            }
        }

        if let Some(scene) = root.child("SCENE") {
            file.scene = Scene {
                referenced_entities: scene
                    .children_named("ENTITY")
                    .map(|e| parse_ref(e.required("RefLinkID")?))
                    .collect::<Result<_>>()?,
            };
        }
        if let Some(objects) = root.child("OBJECTS") {
            file.objects = Objects {
                entities: objects
                    .children_named("ENTITY")
                    .map(parse_entity)
                    .collect::<Result<_>>()?,
            };
        }

        tracing::debug!(
            "parsed {} scene XML: {} entities",
            version,
            file.objects.entities.len()
        );
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(version: SceneVersion) -> SceneFile {
        let mut component = Component::new("JPSTransformationComponent", Id::from(0x0001_0002u32));
        component.template_id = Id::from(0x0000_011au32);
        component.master_link_id = Some(Id::from(0x42u32));
        component.properties = vec![
            Property::scalar("Translation", Value::Point3(Point3::new(1.0, -2.5, 0.1))),
            Property::scalar("Rotation", Value::Matrix3(Matrix3::IDENTITY)),
            Property::scalar("Target", Value::EntityPointer(Id::NULL)),
            Property::list(
                "Children",
                ValueKind::EntityPointer,
                vec![Value::EntityPointer(Id::from(7u32))],
            ),
            Property::scalar("Label", Value::String("  padded & <odd>  ".into())),
            Property::scalar("Blank", Value::String(String::new())),
            Property::list("None", ValueKind::Float, vec![]).with_template(),
            Property::scalar("Mesh", Value::String("models/a.nif".into())).with_asset(),
            Property::scalar("Visible", Value::Boolean(true)),
            Property::scalar("Layer", Value::Short(-3)),
            Property::scalar("Tint", Value::ColorRgba(ColorRgba { r: 0.5, g: 0.25, b: 1.0, a: 0.0 })),
        ];

        let mut entity = Entity::new("Root", Id::from(0x0001_0001u32));
        entity.reserved = 9;
        entity.components.push(component);

        let mut file = SceneFile::new(version);
        if version.layout().has_guid {
            file.guid = Id::new(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10);
        }
        if version.layout().has_extra_strings {
            file.em2_extra_strings = vec!["alpha".into(), String::new()];
            file.objects.entities.push(Entity::new("Second", Id::from(3u32)));
        }
        file.objects.entities.insert(0, entity);
        file.scene.referenced_entities = vec![Id::from(0x0001_0001u32)];
        file
    }

    #[test]
    fn test_roundtrip_every_version() {
        for version in [SceneVersion::V1, SceneVersion::V2Prototype, SceneVersion::V2] {
            for pretty in [true, false] {
                let file = sample(version);
                let xml = file.to_xml(pretty).unwrap();
                let parsed = SceneFile::from_xml(&xml).unwrap();
                assert_eq!(parsed, file, "{} pretty={}\n{}", version, pretty, xml);
            }
        }
    }

    #[test]
    fn test_attribute_spelling() {
        let xml = sample(SceneVersion::V1).to_xml(true).unwrap();
        assert!(xml.contains(r#"Version="1""#));
        assert!(xml.contains(r#"UniqueID="01,02,03,04,05,06,07,08,09,0a,0b,0c,0d,0e,0f,10""#));
        assert!(xml.contains(r#"<SCENE Class="NiScene" Name="Main Scene">"#));
        assert!(xml.contains(r#"Name="Transformation""#));
        assert!(xml.contains(r#"TemplateID="00,00,01,1a""#));
        assert!(xml.contains(r#"RefLinkID="NULL""#));
        assert!(xml.contains(r#"Template="TRUE""#));
        assert!(xml.contains(r#"List="TRUE""#));
        assert!(xml.contains(r#"Asset="TRUE""#));
        assert!(xml.contains(r#"Unknown="9""#));
        assert!(xml.contains("<ROW>1.0, 0.0, 0.0</ROW>"));
        assert!(xml.contains(">1.0, -2.5, 0.1</PROPERTY>"));
        assert!(xml.contains(">TRUE</PROPERTY>"));
        assert!(!xml.contains("EM2ExtraStrings"));
        assert!(!xml.contains("UnknownEM2"));
    }

    #[test]
    fn test_v2_has_extra_strings_and_no_guid() {
        let xml = sample(SceneVersion::V2).to_xml(false).unwrap();
        assert!(xml.contains("<EM2ExtraStrings><String>alpha</String><String/></EM2ExtraStrings>"));
        assert!(!xml.contains("UniqueID"));
        assert!(xml.contains(r#"UnknownEM2="0""#));
    }

    #[test]
    fn test_hand_written_input() {
        let xml = r#"<?xml version="1.0"?>
<GSA Version="1" UniqueID="0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,1">
  <SCENE><ENTITY RefLinkID="0,0,0,5"/></SCENE>
  <OBJECTS>
    <ENTITY Name="Lamp" LinkID="0,0,0,5">
      <COMPONENT Class="JPSLightComponent" Name="ignored" TemplateID="0,0,0,1" LinkID="0,0,0,6" MasterLinkID="00,00,00,00">
        <PROPERTY Class="Color (RGB)" Name="Diffuse"> 1, 0.5 ,0 </PROPERTY>
        <PROPERTY Class="Unsigned Integer" Name="Count">
          <ITEM>1</ITEM>
          <ITEM>2</ITEM>
        </PROPERTY>
        <PROPERTY Class="Boolean" Name="On">false</PROPERTY>
      </COMPONENT>
    </ENTITY>
  </OBJECTS>
</GSA>"#;
        let file = SceneFile::from_xml(xml).unwrap();
        assert_eq!(file.guid, Id::from(1u32));
        let entity = &file.objects.entities[0];
        assert_eq!(entity.class_name, DEFAULT_ENTITY_CLASS);
        let component = &entity.components[0];
        assert_eq!(component.name(), "Light");
        assert_eq!(component.master_link_id, None);
        assert_eq!(
            component.properties[0].value,
            PropertyValue::Scalar(Value::ColorRgb(ColorRgb { r: 1.0, g: 0.5, b: 0.0 }))
        );
        assert_eq!(
            component.properties[1].value,
            PropertyValue::List(vec![Value::UnsignedInteger(1), Value::UnsignedInteger(2)])
        );
        assert_eq!(
            component.properties[2].value,
            PropertyValue::Scalar(Value::Boolean(false))
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(SceneFile::from_xml("<NOTGSA/>"), Err(ThinnerError::Xml(_))));
        assert!(SceneFile::from_xml(r#"<GSA Version="9"/>"#).is_err());
        assert!(SceneFile::from_xml("<GSA Version=\"3\">").is_err());
        let bad_class = r#"<GSA Version="3"><OBJECTS><ENTITY Name="a" LinkID="0,0,0,1">
            <COMPONENT Class="X" TemplateID="0,0,0,0" LinkID="0,0,0,2">
            <PROPERTY Class="Quaternion" Name="q">1</PROPERTY></COMPONENT></ENTITY></OBJECTS></GSA>"#;
        assert!(matches!(SceneFile::from_xml(bad_class), Err(ThinnerError::Xml(_))));
    }
}
