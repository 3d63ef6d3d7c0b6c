//! Scene file binary codec
//!
//! # Format
//! ```text
//! v1:        u32 data_offset | string table @4              | data @data_offset
//! v2, v2p:   u32 0x01000001 | u32 data_offset | table @8    | data @data_offset+4
//!
//! data:      [u32 sentinel]          v2 / v2p only
//!            [16-byte GUID]          v1 / v2p
//!            [u32 n, n jps strings]  v2 / v2p
//!            u32 entity count, u32 reference count
//!            entities, then u32 referenced link IDs
//!
//! entity:    u32 name ptr, u32 link, u32 master, u32 reserved,
//!            [u32 reserved]          v2 / v2p only
//!            u32 component count, components
//! component: u32 class ptr, u32 template-id ptr, u32 link, u32 master,
//!            u32 property count, properties
//! property:  u32 name ptr, u32 class ptr, u32 kind, u32 count, values
//! ```
//! String pointers are absolute in v1 and 4 short of absolute in the
//! wrapped versions. Decoding is a single forward pass that seeks out to
//! each string and back; encoding interns every string first and then
//! writes the records with resolved pointers.

use crate::model::{Component, Entity, Objects, Property, Scene, SceneFile, DEFAULT_ENTITY_CLASS};
use crate::value::{ColorRgb, ColorRgba, Matrix3, Point2, Point3, PropertyValue, Value, ValueKind};
use crate::version::{detect_version, SceneVersion, VersionLayout, WRAPPER_SENTINEL};
use thinner_binary::{BinaryCursor, PoolEncoding, StringPool};
use thinner_core::{Endian, Id, Result, ThinnerError};

const KIND_SCALAR: u32 = 0;
const KIND_LIST: u32 = 1;
const KIND_SCALAR_ASSET: u32 = 2;
const KIND_LIST_ASSET: u32 = 3;
const KIND_SCALAR_PALETTE: u32 = 4;
const KIND_LIST_TEMPLATE: u32 = 5;

/// Decoded kind word: list-ness plus at most one flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct KindFlags {
    list: bool,
    asset: bool,
    palette: bool,
    template: bool,
}

fn decode_kind(code: u32, offset: usize) -> Result<KindFlags> {
    let flags = match code {
        KIND_SCALAR => KindFlags::default(),
        KIND_LIST => KindFlags { list: true, ..Default::default() },
        KIND_SCALAR_ASSET => KindFlags { asset: true, ..Default::default() },
        KIND_LIST_ASSET => KindFlags { list: true, asset: true, ..Default::default() },
        KIND_SCALAR_PALETTE => KindFlags { palette: true, ..Default::default() },
        KIND_LIST_TEMPLATE => KindFlags { list: true, template: true, ..Default::default() },
        other => {
            return Err(ThinnerError::format(
                offset,
                format!("unknown property kind {}", other),
            ))
        }
    };
    Ok(flags)
}

fn encode_kind(property: &Property, offset: usize) -> Result<u32> {
    let list = property.is_list();
    let flag_count = [property.asset, property.palette, property.template]
        .iter()
        .filter(|&&f| f)
        .count();
    if flag_count > 1 {
        return Err(ThinnerError::encoding(
            offset,
            format!(
                "property {:?} sets more than one of asset/palette/template",
                property.name
            ),
        ));
    }

    match (list, property.asset, property.palette, property.template) {
        (false, false, false, false) => Ok(KIND_SCALAR),
        (true, false, false, false) => Ok(KIND_LIST),
        (false, true, _, _) => Ok(KIND_SCALAR_ASSET),
        (true, true, _, _) => Ok(KIND_LIST_ASSET),
        (false, _, true, _) => Ok(KIND_SCALAR_PALETTE),
        (true, _, _, true) => Ok(KIND_LIST_TEMPLATE),
        (true, _, true, _) => Err(ThinnerError::encoding(
            offset,
            format!("palette property {:?} cannot be a list", property.name),
        )),
        (false, _, _, true) => Err(ThinnerError::encoding(
            offset,
            format!("template property {:?} must be a list", property.name),
        )),
    }
}

fn wire_id(id: Id, offset: usize, what: &str) -> Result<u32> {
    id.to_u32().ok_or_else(|| {
        ThinnerError::encoding(offset, format!("{} {} does not fit in 32 bits", what, id))
    })
}

fn count_u32(len: usize, offset: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| ThinnerError::encoding(offset, format!("too many {}: {}", what, len)))
}

struct SceneReader {
    cursor: BinaryCursor,
    layout: VersionLayout,
}

impl SceneReader {
    fn u32(&mut self, what: &str) -> Result<u32> {
        self.cursor.read_u32().map_err(|e| e.while_reading(what))
    }

    fn f32(&mut self, what: &str) -> Result<f32> {
        self.cursor.read_f32().map_err(|e| e.while_reading(what))
    }

    fn optional_id(&mut self, what: &str) -> Result<Option<Id>> {
        let raw = self.u32(what)?;
        Ok((raw != 0).then(|| Id::from(raw)))
    }

    /// Follow a stored string pointer and come back
    fn string_at(&mut self, what: &str) -> Result<String> {
        let at = self.cursor.position();
        let stored = self.u32(what)?;
        let target = stored as usize + self.layout.pointer_adjust as usize;
        if target >= self.cursor.size() {
            return Err(ThinnerError::format(
                at,
                format!("{} pointer {:#x} outside file", what, stored),
            ));
        }

        let resume = self.cursor.position();
        self.cursor.seek(target)?;
        let text = self
            .cursor
            .read_str_jps()
            .map_err(|e| e.while_reading(what))?;
        self.cursor.seek(resume)?;
        Ok(text)
    }

    fn read_file(&mut self, version: SceneVersion) -> Result<SceneFile> {
        let start = self.cursor.position();
        if self.layout.wrapped {
            self.u32("scene wrapper")?;
        }
        let data_offset = start
            + self.u32("scene data offset")? as usize
            + if self.layout.wrapped { 4 } else { 0 };
        self.cursor
            .seek(data_offset)
            .map_err(|e| e.while_reading("scene data"))?;

        if let Some(expected) = self.layout.data_sentinel {
            let sentinel = self.u32("scene data sentinel")?;
            if sentinel != expected {
                return Err(ThinnerError::format(
                    data_offset,
                    format!(
                        "data sentinel {:#010x} does not match {} ({:#010x})",
                        sentinel, version, expected
                    ),
                ));
            }
        }

        let mut file = SceneFile::new(version);
        if self.layout.has_guid {
            file.guid = Id::new(
                self.cursor
                    .read_u128()
                    .map_err(|e| e.while_reading("scene GUID"))?,
            );
        }
        if self.layout.has_extra_strings {
            let count = self.u32("extra string count")?;
            for _ in 0..count {
                let text = self
                    .cursor
                    .read_str_jps()
                    .map_err(|e| e.while_reading("extra string"))?;
                file.em2_extra_strings.push(text);
            }
        }

        let entity_count = self.u32("entity count")?;
        let reference_count = self.u32("reference count")?;

        let mut entities = Vec::new();
        for _ in 0..entity_count {
            entities.push(self.read_entity()?);
        }
        let mut references = Vec::new();
        for _ in 0..reference_count {
            references.push(Id::from(self.u32("referenced entity")?));
        }

        file.objects = Objects { entities };
        file.scene = Scene {
            referenced_entities: references,
        };
        Ok(file)
    }

    fn read_entity(&mut self) -> Result<Entity> {
        let name = self.string_at("entity name")?;
        let link_id = Id::from(self.u32("entity link ID")?);
        let master_link_id = self.optional_id("entity master link ID")?;
        let reserved = self.u32("entity record")?;
        let reserved_v2 = if self.layout.entity_reserved_v2 {
            self.u32("entity record")?
        } else {
            0
        };

        let count = self.u32("component count")?;
        let mut components = Vec::new();
        for _ in 0..count {
            components.push(self.read_component()?);
        }

        tracing::trace!("entity {:?} ({}) with {} components", name, link_id, components.len());
        Ok(Entity {
            class_name: DEFAULT_ENTITY_CLASS.to_string(),
            name,
            link_id,
            master_link_id,
            reserved,
            reserved_v2,
            components,
        })
    }

    fn read_component(&mut self) -> Result<Component> {
        let class_name = self.string_at("component class")?;
        let template_at = self.cursor.position();
        let template_text = self.string_at("template ID")?;
        let template_id = Id::parse_hex_groups(&template_text)
            .map_err(|e| ThinnerError::format(template_at, e.to_string()))?;
        let link_id = Id::from(self.u32("component link ID")?);
        let master_link_id = self.optional_id("component master link ID")?;

        let count = self.u32("property count")?;
        let mut properties = Vec::new();
        for _ in 0..count {
            properties.push(self.read_property()?);
        }

        Ok(Component {
            class_name,
            template_id,
            link_id,
            master_link_id,
            properties,
        })
    }

    fn read_property(&mut self) -> Result<Property> {
        let name = self.string_at("property name")?;
        let class_at = self.cursor.position();
        let class_name = self.string_at("property class")?;
        let class = ValueKind::from_class_name(&class_name).ok_or_else(|| {
            ThinnerError::format(
                class_at,
                format!("unknown class {:?} for property {:?}", class_name, name),
            )
        })?;

        let kind_at = self.cursor.position();
        let flags = decode_kind(self.u32("property kind")?, kind_at)?;
        let count = self.u32("value count")? as usize;

        if !flags.list && count != 1 {
            return Err(ThinnerError::format(
                kind_at,
                format!("scalar property {:?} has {} values", name, count),
            ));
        }
        // Cheap plausibility check before allocating
        if count.saturating_mul(class.wire_size()) > self.cursor.remaining() {
            return Err(ThinnerError::format(
                kind_at,
                format!("property {:?} claims {} values past end of file", name, count),
            ));
        }

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_value(class)?);
        }

        let value = if flags.list {
            PropertyValue::List(values)
        } else {
            PropertyValue::Scalar(values.remove(0))
        };

        Ok(Property {
            class,
            name,
            asset: flags.asset,
            palette: flags.palette,
            template: flags.template,
            value,
        })
    }

    fn read_value(&mut self, kind: ValueKind) -> Result<Value> {
        let what = kind.class_name();
        Ok(match kind {
            ValueKind::EntityPointer => Value::EntityPointer(Id::from(self.u32(what)?)),
            ValueKind::ColorRgb => Value::ColorRgb(ColorRgb {
                r: self.f32(what)?,
                g: self.f32(what)?,
                b: self.f32(what)?,
            }),
            ValueKind::ColorRgba => Value::ColorRgba(ColorRgba {
                r: self.f32(what)?,
                g: self.f32(what)?,
                b: self.f32(what)?,
                a: self.f32(what)?,
            }),
            ValueKind::Point2 => Value::Point2(Point2 {
                x: self.f32(what)?,
                y: self.f32(what)?,
            }),
            ValueKind::Point3 => Value::Point3(Point3 {
                x: self.f32(what)?,
                y: self.f32(what)?,
                z: self.f32(what)?,
            }),
            ValueKind::Matrix3 => {
                let mut m = [[0.0f32; 3]; 3];
                for row in m.iter_mut() {
                    for cell in row.iter_mut() {
                        *cell = self.f32(what)?;
                    }
                }
                Value::Matrix3(Matrix3 { m })
            }
            ValueKind::Boolean => {
                Value::Boolean(self.cursor.read_bool32().map_err(|e| e.while_reading(what))?)
            }
            ValueKind::Integer => {
                Value::Integer(self.cursor.read_i32().map_err(|e| e.while_reading(what))?)
            }
            ValueKind::UnsignedInteger => Value::UnsignedInteger(self.u32(what)?),
            ValueKind::Float => Value::Float(self.f32(what)?),
            ValueKind::String => Value::String(self.string_at("string value")?),
            ValueKind::Short => Value::Short(
                self.cursor
                    .read_i16_filler()
                    .map_err(|e| e.while_reading(what))?,
            ),
            ValueKind::UnsignedShort => Value::UnsignedShort(
                self.cursor
                    .read_u16_filler()
                    .map_err(|e| e.while_reading(what))?,
            ),
        })
    }
}

/// Template IDs travel as text in the string table
fn template_text(id: Id) -> String {
    id.to_compact_groups(4)
}

/// First pass: every string the records will point at, in record order
fn intern_strings(file: &SceneFile, pool: &mut StringPool) -> Result<()> {
    for entity in &file.objects.entities {
        pool.intern(&entity.name)?;
        for component in &entity.components {
            pool.intern(&component.class_name)?;
            pool.intern(&template_text(component.template_id))?;
            for property in &component.properties {
                pool.intern(&property.name)?;
                pool.intern(property.class.class_name())?;
                for value in property.values() {
                    if let Value::String(text) = value {
                        pool.intern(text)?;
                    }
                }
            }
        }
    }
    Ok(())
}

struct SceneWriter {
    cursor: BinaryCursor,
    pool: StringPool,
}

impl SceneWriter {
    fn pointer(&mut self, text: &str) -> Result<()> {
        let offset = self.pool.offset_of(text).ok_or_else(|| {
            ThinnerError::encoding(self.cursor.position(), format!("string {:?} was not pooled", text))
        })?;
        self.cursor.write_u32(offset);
        Ok(())
    }

    fn id(&mut self, id: Id, what: &str) -> Result<()> {
        let raw = wire_id(id, self.cursor.position(), what)?;
        self.cursor.write_u32(raw);
        Ok(())
    }

    fn optional_id(&mut self, id: Option<Id>, what: &str) -> Result<()> {
        self.id(id.unwrap_or(Id::NULL), what)
    }

    fn count(&mut self, len: usize, what: &str) -> Result<()> {
        let count = count_u32(len, self.cursor.position(), what)?;
        self.cursor.write_u32(count);
        Ok(())
    }

    fn write_entity(&mut self, entity: &Entity, layout: &VersionLayout) -> Result<()> {
        self.pointer(&entity.name)?;
        self.id(entity.link_id, "entity link ID")?;
        self.optional_id(entity.master_link_id, "entity master link ID")?;
        self.cursor.write_u32(entity.reserved);
        if layout.entity_reserved_v2 {
            self.cursor.write_u32(entity.reserved_v2);
        }
        self.count(entity.components.len(), "components")?;
        for component in &entity.components {
            self.write_component(component)?;
        }
        Ok(())
    }

    fn write_component(&mut self, component: &Component) -> Result<()> {
        self.pointer(&component.class_name)?;
        self.pointer(&template_text(component.template_id))?;
        self.id(component.link_id, "component link ID")?;
        self.optional_id(component.master_link_id, "component master link ID")?;
        self.count(component.properties.len(), "properties")?;
        for property in &component.properties {
            self.write_property(property)?;
        }
        Ok(())
    }

    fn write_property(&mut self, property: &Property) -> Result<()> {
        let at = self.cursor.position();
        let kind = encode_kind(property, at)?;
        if let Some(bad) = property.values().iter().find(|v| v.kind() != property.class) {
            return Err(ThinnerError::encoding(
                at,
                format!(
                    "property {:?} of class {} holds a {} value",
                    property.name,
                    property.class,
                    bad.kind()
                ),
            ));
        }

        self.pointer(&property.name)?;
        self.pointer(property.class.class_name())?;
        self.cursor.write_u32(kind);
        self.count(property.values().len(), "values")?;
        for value in property.values() {
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        let c = &mut self.cursor;
        match value {
            Value::EntityPointer(id) => {
                let raw = wire_id(*id, c.position(), "entity pointer")?;
                c.write_u32(raw);
            }
            Value::ColorRgb(v) => {
                c.write_f32(v.r);
                c.write_f32(v.g);
                c.write_f32(v.b);
            }
            Value::ColorRgba(v) => {
                c.write_f32(v.r);
                c.write_f32(v.g);
                c.write_f32(v.b);
                c.write_f32(v.a);
            }
            Value::Point2(v) => {
                c.write_f32(v.x);
                c.write_f32(v.y);
            }
            Value::Point3(v) => {
                c.write_f32(v.x);
                c.write_f32(v.y);
                c.write_f32(v.z);
            }
            Value::Matrix3(v) => {
                for cell in v.m.iter().flatten() {
                    c.write_f32(*cell);
                }
            }
            Value::Boolean(v) => c.write_bool32(*v),
            Value::Integer(v) => c.write_i32(*v),
            Value::UnsignedInteger(v) => c.write_u32(*v),
            Value::Float(v) => c.write_f32(*v),
            Value::String(text) => self.pointer(text)?,
            Value::Short(v) => c.write_i16_filler(*v),
            Value::UnsignedShort(v) => c.write_u16_filler(*v),
        }
        Ok(())
    }
}

impl SceneFile {
    /// Decode a binary scene file, detecting its version
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self> {
        let mut cursor = BinaryCursor::from_bytes(bytes, endian);
        let version = detect_version(&mut cursor)?;
        let mut reader = SceneReader {
            cursor,
            layout: version.layout(),
        };
        let file = reader.read_file(version)?;

        tracing::debug!(
            "decoded {} scene: {} entities, {} components",
            version,
            file.objects.entities.len(),
            file.component_count()
        );
        Ok(file)
    }

    /// Encode in this file's version and the given byte order
    pub fn encode(&self, endian: Endian) -> Result<Vec<u8>> {
        let layout = self.version.layout();
        let mut pool = StringPool::new(layout.pointer_base(), PoolEncoding::Jps);
        intern_strings(self, &mut pool)?;

        let mut cursor = BinaryCursor::new(endian);
        if layout.wrapped {
            cursor.write_u32(WRAPPER_SENTINEL);
        }
        cursor.write_u32(count_u32(4 + pool.len(), cursor.position(), "string table bytes")?);
        cursor.write_bytes(pool.as_bytes());

        if let Some(sentinel) = layout.data_sentinel {
            cursor.write_u32(sentinel);
        }
        if layout.has_guid {
            cursor.write_u128(self.guid.get());
        }

        let mut writer = SceneWriter { cursor, pool };
        if layout.has_extra_strings {
            writer.count(self.em2_extra_strings.len(), "extra strings")?;
            for text in &self.em2_extra_strings {
                writer.cursor.write_str_jps(text)?;
            }
        }

        writer.count(self.objects.entities.len(), "entities")?;
        writer.count(self.scene.referenced_entities.len(), "referenced entities")?;
        for entity in &self.objects.entities {
            writer.write_entity(entity, &layout)?;
        }
        for id in &self.scene.referenced_entities {
            writer.id(*id, "referenced entity")?;
        }

        tracing::debug!(
            "encoded {} scene: {} entities, {} bytes of strings, {} bytes total",
            self.version,
            self.objects.entities.len(),
            writer.pool.len(),
            writer.cursor.size()
        );
        Ok(writer.cursor.into_inner())
    }
}
