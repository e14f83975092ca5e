//! # serde deserializer for the directive list produced by [`crate::parse`]
use crate::{parse, Directive, Error};
use serde::de::{self, IntoDeserializer};

/// Deserializes a config file into `T`.
///
/// Every struct field is looked up by name (case-insensitively) among the
/// file's directives; missing fields fall back to `Default::default()`, so
/// callers should mark optional fields `#[serde(default)]`.
pub fn from_slice<'a, T: serde::Deserialize<'a>>(bytes: &[u8]) -> Result<T, Error> {
    let directives = parse(bytes)?;
    T::deserialize(ConfigDeserializer { directives })
}

struct ConfigDeserializer {
    directives: Vec<Directive>,
}

struct DirectiveMapAccess<'a> {
    directives: &'a [Directive],
    fields: std::slice::Iter<'static, &'static str>,
    current: Option<&'a str>,
}

impl<'de> de::Deserializer<'de> for ConfigDeserializer {
    type Error = Error;

    fn deserialize_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_map(DirectiveMapAccess {
            directives: Box::leak(self.directives.into_boxed_slice()),
            fields: fields.iter(),
            current: None,
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }

    fn deserialize_any<V: de::Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Error> {
        Err(Error::Message(
            "config files can only be deserialized into a struct".to_owned(),
        ))
    }
}

impl<'de, 'a> de::MapAccess<'de> for DirectiveMapAccess<'a> {
    type Error = Error;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Error> {
        match self.fields.next() {
            Some(field) => {
                self.current = Some(field);
                seed.deserialize(field.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        let field = self.current.take().expect("next_key_seed called first");
        let value = self
            .directives
            .iter()
            .find(|d| d.key == field)
            .map(|d| d.value.as_str())
            .unwrap_or("");

        seed.deserialize(ValueDeserializer { value })
    }
}

/// Deserializes a single raw directive value into whatever scalar/seq/option
/// shape the target field expects.
struct ValueDeserializer<'a> {
    value: &'a str,
}

macro_rules! deserialize_number {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            let n: $ty = self
                .value
                .parse()
                .map_err(|_| Error::Message(format!("'{}' is not a valid number", self.value)))?;
            visitor.$visit(n)
        }
    };
}

impl<'de, 'a> de::Deserializer<'de> for ValueDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.value)
    }

    fn deserialize_bool<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value.to_lowercase().as_str() {
            "yes" | "true" | "1" => visitor.visit_bool(true),
            _ => visitor.visit_bool(false),
        }
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_seq<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let items: Vec<&str> = if self.value.is_empty() {
            vec![]
        } else {
            self.value.split(',').map(|s| s.trim()).collect()
        };
        visitor.visit_seq(de::value::SeqDeserializer::new(items.into_iter()))
    }

    fn deserialize_str<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_str(self.value)
    }

    fn deserialize_string<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.value.to_owned())
    }

    deserialize_number!(deserialize_u8, visit_u8, u8);
    deserialize_number!(deserialize_u16, visit_u16, u16);
    deserialize_number!(deserialize_u32, visit_u32, u32);
    deserialize_number!(deserialize_u64, visit_u64, u64);
    deserialize_number!(deserialize_i8, visit_i8, i8);
    deserialize_number!(deserialize_i16, visit_i16, i16);
    deserialize_number!(deserialize_i32, visit_i32, i32);
    deserialize_number!(deserialize_i64, visit_i64, i64);
    deserialize_number!(deserialize_f32, visit_f32, f32);
    deserialize_number!(deserialize_f64, visit_f64, f64);

    serde::forward_to_deserialize_any! {
        i128 u128 char bytes byte_buf unit unit_struct newtype_struct tuple
        tuple_struct map struct enum identifier ignored_any
    }
}
