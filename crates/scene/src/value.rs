//! Closed vocabulary of property value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thinner_core::{Id, ThinnerError};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Row-major 3x3 matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub m: [[f32; 3]; 3],
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Default for ColorRgb {
    fn default() -> Self {
        Self { r: 1.0, g: 1.0, b: 1.0 }
    }
}

impl Default for ColorRgba {
    fn default() -> Self {
        Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
    }
}

impl Matrix3 {
    pub const IDENTITY: Matrix3 = Matrix3 {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Rotation built from Euler angles in degrees, the editor's convention
    pub fn from_degrees(x: f32, y: f32, z: f32) -> Self {
        let x = -(x as f64).to_radians();
        let y = -(y as f64).to_radians();
        let z = (z as f64).to_radians();
        let (sx, cx) = x.sin_cos();
        let (sy, cy) = y.sin_cos();
        let (sz, cz) = z.sin_cos();

        let m = [
            [cy * cz, cx * sz + sx * sy * cz, sx * sz - cx * sy * cz],
            [-cy * sz, cx * cz - sx * sy * sz, sx * cz + cx * sy * sz],
            [sy, -sx * cy, cx * cy],
        ];
        Self {
            m: m.map(|row| row.map(|v| v as f32)),
        }
    }

    /// Euler angles in degrees; inverse of [`Matrix3::from_degrees`] away
    /// from gimbal lock (y = ±90)
    pub fn to_degrees(&self) -> [f32; 3] {
        let m = self.m.map(|row| row.map(f64::from));
        let x = m[2][1].atan2(m[2][2]);
        let y = (-m[2][0]).atan2(m[2][1].hypot(m[2][2]));
        let z = (-m[1][0]).atan2(m[0][0]);
        [x, y, z].map(|a| a.to_degrees() as f32)
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Wire type of a property, selected by its class name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    EntityPointer,
    ColorRgb,
    ColorRgba,
    Point2,
    Point3,
    Matrix3,
    Boolean,
    Integer,
    UnsignedInteger,
    Float,
    String,
    Short,
    UnsignedShort,
}

impl ValueKind {
    pub const ALL: [ValueKind; 13] = [
        ValueKind::EntityPointer,
        ValueKind::ColorRgb,
        ValueKind::ColorRgba,
        ValueKind::Point2,
        ValueKind::Point3,
        ValueKind::Matrix3,
        ValueKind::Boolean,
        ValueKind::Integer,
        ValueKind::UnsignedInteger,
        ValueKind::Float,
        ValueKind::String,
        ValueKind::Short,
        ValueKind::UnsignedShort,
    ];

    /// Class name as stored in scene files
    pub fn class_name(self) -> &'static str {
        match self {
            ValueKind::EntityPointer => "Entity Pointer",
            ValueKind::ColorRgb => "Color (RGB)",
            ValueKind::ColorRgba => "Color (RGBA)",
            ValueKind::Point2 => "Point2",
            ValueKind::Point3 => "Point3",
            ValueKind::Matrix3 => "Matrix3",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::UnsignedInteger => "Unsigned Integer",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
            ValueKind::Short => "Short",
            ValueKind::UnsignedShort => "Unsigned Short",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        if name == "EntityPointer" {
            return Some(ValueKind::EntityPointer);
        }
        Self::ALL.into_iter().find(|kind| kind.class_name() == name)
    }

    /// Bytes one value occupies in a property record
    pub fn wire_size(self) -> usize {
        match self {
            ValueKind::ColorRgb | ValueKind::Point3 => 12,
            ValueKind::ColorRgba => 16,
            ValueKind::Point2 => 8,
            ValueKind::Matrix3 => 36,
            _ => 4,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for ValueKind {
    type Err = ThinnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_class_name(s)
            .ok_or_else(|| ThinnerError::format(0, format!("unknown property class {:?}", s)))
    }
}

/// One typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    EntityPointer(Id),
    ColorRgb(ColorRgb),
    ColorRgba(ColorRgba),
    Point2(Point2),
    Point3(Point3),
    Matrix3(Matrix3),
    Boolean(bool),
    Integer(i32),
    UnsignedInteger(u32),
    Float(f32),
    String(String),
    Short(i16),
    UnsignedShort(u16),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::EntityPointer(_) => ValueKind::EntityPointer,
            Value::ColorRgb(_) => ValueKind::ColorRgb,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Point2(_) => ValueKind::Point2,
            Value::Point3(_) => ValueKind::Point3,
            Value::Matrix3(_) => ValueKind::Matrix3,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::UnsignedInteger(_) => ValueKind::UnsignedInteger,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Short(_) => ValueKind::Short,
            Value::UnsignedShort(_) => ValueKind::UnsignedShort,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A property holds either one value or an ordered list of same-typed values
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl PropertyValue {
    pub fn is_list(&self) -> bool {
        matches!(self, PropertyValue::List(_))
    }

    pub fn values(&self) -> &[Value] {
        match self {
            PropertyValue::Scalar(value) => std::slice::from_ref(value),
            PropertyValue::List(values) => values,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            PropertyValue::Scalar(value) => Some(value),
            PropertyValue::List(_) => None,
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<Vec<Value>> for PropertyValue {
    fn from(values: Vec<Value>) -> Self {
        PropertyValue::List(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_degrees() {
        assert_eq!(Matrix3::from_degrees(0.0, 0.0, 0.0), Matrix3::IDENTITY);

        let quarter = Matrix3::from_degrees(0.0, 0.0, 90.0);
        assert!(close(quarter.m[0][1], 1.0));
        assert!(close(quarter.m[1][0], -1.0));
        assert!(close(quarter.m[2][2], 1.0));

        for angles in [[10.0, 20.0, 30.0], [-45.0, 0.0, 170.0], [0.0, -60.0, -5.5]] {
            let back = Matrix3::from_degrees(angles[0], angles[1], angles[2]).to_degrees();
            for (got, want) in back.iter().zip(angles) {
                assert!(close(*got, want), "{:?} came back as {:?}", angles, back);
            }
        }
    }

    #[test]
    fn test_class_names_roundtrip() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_class_name(kind.class_name()), Some(kind));
        }
        assert_eq!(
            ValueKind::from_class_name("EntityPointer"),
            Some(ValueKind::EntityPointer)
        );
        assert!("Quaternion".parse::<ValueKind>().is_err());
    }

    #[test]
    fn test_wire_sizes() {
        assert_eq!(ValueKind::Matrix3.wire_size(), 36);
        assert_eq!(ValueKind::Short.wire_size(), 4);
        assert_eq!(ValueKind::String.wire_size(), 4);
    }

    #[test]
    fn test_property_value_views() {
        let scalar = PropertyValue::from(Value::Float(1.5));
        assert!(!scalar.is_list());
        assert_eq!(scalar.values().len(), 1);

        let empty = PropertyValue::List(Vec::new());
        assert!(empty.is_list());
        assert!(empty.values().is_empty());
        assert!(empty.as_scalar().is_none());
    }
}
