//! Capturing serializable values.
//!
//! This module provides [`ValueSerializer`], the serde `Serializer` that turns
//! any `T: Serialize` into a [`Value`] tree for the encoder to walk.
//!
//! ## Overview
//!
//! The serializer never fails for structural reasons. Instead, problems are
//! captured in the tree where they happen so the encoder can attribute them to
//! a key path and keep going:
//!
//! - enum variants carrying data become [`Value::Unsupported`],
//! - a `Serialize` impl returning an error becomes [`Value::Failed`],
//! - containers nested deeper than the limit become [`Value::DepthExceeded`]
//!   and their contents are not visited.
//!
//! ## Usage
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::{Value, ValueSerializer};
//!
//! #[derive(Serialize)]
//! enum Shape { Circle(f64) }
//!
//! let value = vec![Shape::Circle(1.0)]
//!     .serialize(ValueSerializer::new())
//!     .unwrap();
//! assert_eq!(
//!     value,
//!     Value::Seq(vec![Value::Unsupported("newtype variant Shape::Circle".to_string())])
//! );
//! ```

use crate::options::DEFAULT_MAX_DEPTH;
use crate::{Error, Number, Result, StructValue, Value};
use serde::{ser, Serialize};

/// Serializer producing a [`Value`].
///
/// `depth` counts the containers enclosing the value being serialized; a
/// container found deeper than `max_depth` is replaced by
/// [`Value::DepthExceeded`].
#[derive(Clone, Copy, Debug)]
pub struct ValueSerializer {
    depth: usize,
    max_depth: usize,
}

impl Default for ValueSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        ValueSerializer {
            depth: 0,
            max_depth,
        }
    }

    fn child(self) -> Self {
        ValueSerializer {
            depth: self.depth + 1,
            ..self
        }
    }

    fn sink(self) -> Sink {
        if self.depth > self.max_depth {
            Sink::Discard(Value::DepthExceeded)
        } else {
            Sink::Collect
        }
    }

    /// Serializes a contained element, capturing its failure in place.
    fn nested<T>(self, value: &T) -> Value
    where
        T: ?Sized + Serialize,
    {
        capture(value.serialize(self.child()))
    }
}

/// What a compound serializer does with its elements.
enum Sink {
    Collect,
    /// Elements are not visited; `end` yields the stored value.
    Discard(Value),
}

/// Converts a serialization failure into a [`Value::Failed`] marker.
pub(crate) fn capture(result: Result<Value>) -> Value {
    result.unwrap_or_else(|err| Value::Failed(err.to_string()))
}

pub struct SerializeVec {
    ser: ValueSerializer,
    sink: Sink,
    name: Option<&'static str>,
    vec: Vec<Value>,
}

pub struct SerializeMap {
    ser: ValueSerializer,
    sink: Sink,
    entries: Vec<(Value, Value)>,
    current_key: Option<Value>,
}

pub struct SerializeStruct {
    ser: ValueSerializer,
    sink: Sink,
    value: StructValue,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStruct;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Number(Number::Integer(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        match i64::try_from(v) {
            Ok(v) => self.serialize_i64(v),
            Err(_) => Ok(Value::Unsupported(format!("i128 value {} out of range", v))),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::Number(Number::Unsigned(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        match u64::try_from(v) {
            Ok(v) => self.serialize_u64(v),
            Err(_) => Ok(Value::Unsupported(format!("u128 value {} out of range", v))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        // Widen through the shortest decimal so 0.1f32 stays "0.1".
        let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
        self.serialize_f64(widened)
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(Number::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        if let Sink::Discard(marker) = self.sink() {
            return Ok(marker);
        }
        let vec = v
            .iter()
            .map(|&b| Value::Number(Number::Unsigned(u64::from(b))))
            .collect();
        Ok(Value::Seq(vec))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value
            .serialize(self)
            .map(|value| Value::Some(Box::new(value)))
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::None)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Ok(Value::Named {
            name,
            value: Box::new(Value::None),
        })
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::Named {
            name,
            value: Box::new(Value::String(variant.to_string())),
        })
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        // Newtypes add no path segment but still count towards the depth, so
        // a recursive newtype chain is cut off like any other container.
        let inner = self.child();
        let value = match inner.sink() {
            Sink::Discard(marker) => marker,
            Sink::Collect => capture(value.serialize(inner)),
        };
        Ok(Value::Named {
            name,
            value: Box::new(value),
        })
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(unsupported_variant("newtype", name, variant))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(self, None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(self, None, len))
    }

    fn serialize_tuple_struct(self, name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(self, Some(name), len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec {
            ser: self,
            sink: Sink::Discard(unsupported_variant("tuple", name, variant)),
            name: None,
            vec: Vec::new(),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            ser: self,
            sink: self.sink(),
            entries: Vec::with_capacity(len.unwrap_or(0)),
            current_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<SerializeStruct> {
        Ok(SerializeStruct {
            ser: self,
            sink: self.sink(),
            value: StructValue::new(name),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStruct> {
        Ok(SerializeStruct {
            ser: self,
            sink: Sink::Discard(unsupported_variant("struct", name, variant)),
            value: StructValue::new(name),
        })
    }
}

fn unsupported_variant(kind: &str, name: &str, variant: &str) -> Value {
    Value::Unsupported(format!("{} variant {}::{}", kind, name, variant))
}

impl SerializeVec {
    fn new(ser: ValueSerializer, name: Option<&'static str>, len: usize) -> Self {
        SerializeVec {
            ser,
            sink: ser.sink(),
            name,
            vec: Vec::with_capacity(len),
        }
    }

    fn push<T>(&mut self, value: &T)
    where
        T: ?Sized + Serialize,
    {
        if let Sink::Collect = self.sink {
            self.vec.push(self.ser.nested(value));
        }
    }

    fn finish(self) -> Value {
        match self.sink {
            Sink::Discard(marker) => marker,
            Sink::Collect => {
                let seq = Value::Seq(self.vec);
                match self.name {
                    Some(name) => Value::Named {
                        name,
                        value: Box::new(seq),
                    },
                    None => seq,
                }
            }
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Sink::Collect = self.sink {
            self.current_key = Some(self.ser.nested(key));
        }
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Sink::Collect = self.sink {
            let key = self
                .current_key
                .take()
                .ok_or_else(|| {
                    Error::Message("serialize_value called without serialize_key".to_string())
                })?;
            self.entries.push((key, self.ser.nested(value)));
        }
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(match self.sink {
            Sink::Discard(marker) => marker,
            Sink::Collect => Value::Map(self.entries),
        })
    }
}

impl SerializeStruct {
    fn push<T>(&mut self, key: &'static str, value: &T)
    where
        T: ?Sized + Serialize,
    {
        if let Sink::Collect = self.sink {
            let value = self.ser.nested(value);
            self.value.push(key, value);
        }
    }

    fn finish(self) -> Value {
        match self.sink {
            Sink::Discard(marker) => marker,
            Sink::Collect => Value::Struct(self.value),
        }
    }
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Inner {
        x: i32,
    }

    #[derive(Serialize)]
    struct Outer {
        inner: Inner,
        label: Option<String>,
        boxed: Box<u8>,
    }

    #[derive(Serialize)]
    enum Status {
        Active,
    }

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: ser::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(ser::Error::custom("cannot serialize Broken"))
        }
    }

    fn capture_value<T: Serialize + ?Sized>(value: &T, max_depth: usize) -> Value {
        capture(value.serialize(ValueSerializer::with_max_depth(max_depth)))
    }

    #[test]
    fn test_struct_is_dereferenced() {
        let value = capture_value(
            &Outer {
                inner: Inner { x: 1 },
                label: None,
                boxed: Box::new(7),
            },
            DEFAULT_MAX_DEPTH,
        );
        let outer = value.as_struct().unwrap();
        assert_eq!(outer.name(), "Outer");
        assert_eq!(
            outer.get("inner"),
            Some(&Value::Struct(StructValue::new("Inner").with_field("x", 1)))
        );
        assert_eq!(outer.get("label"), Some(&Value::None));

        let value = capture_value(
            &Outer {
                inner: Inner { x: 1 },
                label: Some(String::new()),
                boxed: Box::new(7),
            },
            DEFAULT_MAX_DEPTH,
        );
        assert_eq!(
            value.as_struct().unwrap().get("label"),
            Some(&Value::Some(Box::new(Value::from(""))))
        );
        assert_eq!(outer.get("boxed"), Some(&Value::from(7u32)));
    }

    #[test]
    fn test_unit_variant_is_named_string() {
        assert_eq!(
            capture_value(&Status::Active, DEFAULT_MAX_DEPTH),
            Value::Named {
                name: "Status",
                value: Box::new(Value::from("Active")),
            }
        );
    }

    #[test]
    fn test_failing_element_is_captured_in_place() {
        let value = capture_value(&(1, Broken), DEFAULT_MAX_DEPTH);
        assert_eq!(
            value,
            Value::Seq(vec![
                Value::from(1),
                Value::Failed("cannot serialize Broken".to_string()),
            ])
        );
    }

    #[test]
    fn test_depth_limit_marks_container() {
        let nested = vec![vec![vec![1]]];
        assert_eq!(
            capture_value(&nested, 1),
            Value::Seq(vec![Value::Seq(vec![Value::DepthExceeded])])
        );
        assert_eq!(
            capture_value(&nested, 2),
            Value::from(vec![vec![vec![1]]])
        );
    }

    #[derive(Serialize)]
    struct Chain(Option<Box<Chain>>);

    #[test]
    fn test_newtype_chain_respects_depth_limit() {
        let chain = Chain(Some(Box::new(Chain(Some(Box::new(Chain(None)))))));

        let Value::Named { value, .. } = capture_value(&chain, 1) else {
            panic!("expected a named value");
        };
        let Value::Some(inner) = *value else {
            panic!("expected a present option");
        };
        assert_eq!(
            *inner,
            Value::Named {
                name: "Chain",
                value: Box::new(Value::DepthExceeded),
            }
        );
    }

    #[test]
    fn test_map_preserves_serialization_order() {
        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(
            capture_value(&map, DEFAULT_MAX_DEPTH),
            Value::Map(vec![
                (Value::from("a"), Value::from(1)),
                (Value::from("b"), Value::from(2)),
            ])
        );
    }

    #[test]
    fn test_f32_keeps_short_form() {
        assert_eq!(
            capture_value(&0.1f32, DEFAULT_MAX_DEPTH),
            Value::Number(Number::Float(0.1))
        );
    }
}
