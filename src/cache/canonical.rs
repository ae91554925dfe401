//! Canonical Argument Encoding
//!
//! A serde `Serializer` that writes a tagged, self-delimiting byte encoding
//! of any `Serialize` value. Every node of the serde data model gets its own
//! tag, so `None`, `Some(None)` and `()` differ, floats are encoded by their
//! bits, and integers of every width share one representation. Map entries
//! are sorted by their encoded key, which makes hash maps encode the same
//! regardless of iteration order.

use serde::ser::{self, Error as _, Serialize, Serializer as _};
use serde_json::Error;

// == Tags ==
const UNIT: u8 = 0x00;
const NONE: u8 = 0x01;
const SOME: u8 = 0x02;
const BOOL: u8 = 0x03;
const INT: u8 = 0x04;
const WIDE_UINT: u8 = 0x05;
const FLOAT: u8 = 0x06;
const CHAR: u8 = 0x07;
const STR: u8 = 0x08;
const BYTES: u8 = 0x09;
const SEQ: u8 = 0x0a;
const MAP: u8 = 0x0b;
const UNIT_STRUCT: u8 = 0x0c;
const NEWTYPE_STRUCT: u8 = 0x0d;
const TUPLE_STRUCT: u8 = 0x0e;
const STRUCT: u8 = 0x0f;
const UNIT_VARIANT: u8 = 0x10;
const NEWTYPE_VARIANT: u8 = 0x11;
const TUPLE_VARIANT: u8 = 0x12;
const STRUCT_VARIANT: u8 = 0x13;

// == Encode ==
/// Encodes `value` into its canonical byte form.
///
/// Equal encodings imply equal serialized values. Fails only when the
/// value's own `Serialize` impl reports an error.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    value.serialize(Encoder { out: &mut out })?;
    Ok(out)
}

fn put_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_be_bytes());
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    put_len(out, bytes.len());
    out.extend_from_slice(bytes);
}

fn put_int(out: &mut Vec<u8>, v: i128) {
    out.push(INT);
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_variant(out: &mut Vec<u8>, tag: u8, name: &str, index: u32, variant: &str) {
    out.push(tag);
    put_bytes(out, name.as_bytes());
    out.extend_from_slice(&index.to_be_bytes());
    put_bytes(out, variant.as_bytes());
}

struct Encoder<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> Encoder<'a> {
    fn sequence(self, header: Vec<u8>) -> Sequence<'a> {
        Sequence {
            out: self.out,
            header,
            count: 0,
            body: Vec::new(),
        }
    }
}

impl<'a> ser::Serializer for Encoder<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Sequence<'a>;
    type SerializeTuple = Sequence<'a>;
    type SerializeTupleStruct = Sequence<'a>;
    type SerializeTupleVariant = Sequence<'a>;
    type SerializeMap = Map<'a>;
    type SerializeStruct = Sequence<'a>;
    type SerializeStructVariant = Sequence<'a>;

    fn serialize_bool(self, v: bool) -> Result<(), Error> {
        self.out.extend_from_slice(&[BOOL, v as u8]);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_i128(self, v: i128) -> Result<(), Error> {
        put_int(self.out, v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<(), Error> {
        self.serialize_i128(v.into())
    }

    fn serialize_u128(self, v: u128) -> Result<(), Error> {
        match i128::try_from(v) {
            Ok(v) => put_int(self.out, v),
            Err(_) => {
                self.out.push(WIDE_UINT);
                self.out.extend_from_slice(&v.to_be_bytes());
            }
        }
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), Error> {
        self.serialize_f64(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<(), Error> {
        self.out.push(FLOAT);
        self.out.extend_from_slice(&v.to_bits().to_be_bytes());
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<(), Error> {
        self.out.push(CHAR);
        self.out.extend_from_slice(&u32::from(v).to_be_bytes());
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), Error> {
        self.out.push(STR);
        put_bytes(self.out, v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), Error> {
        self.out.push(BYTES);
        put_bytes(self.out, v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), Error> {
        self.out.push(NONE);
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Error> {
        self.out.push(SOME);
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Error> {
        self.out.push(UNIT);
        Ok(())
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), Error> {
        self.out.push(UNIT_STRUCT);
        put_bytes(self.out, name.as_bytes());
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        index: u32,
        variant: &'static str,
    ) -> Result<(), Error> {
        put_variant(self.out, UNIT_VARIANT, name, index, variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.out.push(NEWTYPE_STRUCT);
        put_bytes(self.out, name.as_bytes());
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        put_variant(self.out, NEWTYPE_VARIANT, name, index, variant);
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Sequence<'a>, Error> {
        Ok(self.sequence(vec![SEQ]))
    }

    // Tuples and fixed arrays encode like any other sequence.
    fn serialize_tuple(self, _len: usize) -> Result<Sequence<'a>, Error> {
        Ok(self.sequence(vec![SEQ]))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Sequence<'a>, Error> {
        let mut header = vec![TUPLE_STRUCT];
        put_bytes(&mut header, name.as_bytes());
        Ok(self.sequence(header))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Sequence<'a>, Error> {
        let mut header = Vec::new();
        put_variant(&mut header, TUPLE_VARIANT, name, index, variant);
        Ok(self.sequence(header))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Map<'a>, Error> {
        Ok(Map {
            out: self.out,
            entries: Vec::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Sequence<'a>, Error> {
        let mut header = vec![STRUCT];
        put_bytes(&mut header, name.as_bytes());
        Ok(self.sequence(header))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Sequence<'a>, Error> {
        let mut header = Vec::new();
        put_variant(&mut header, STRUCT_VARIANT, name, index, variant);
        Ok(self.sequence(header))
    }
}

// == Sequence ==
/// Ordered compound: elements, tuple fields, or struct fields in declaration
/// order. The element count is written ahead of the body on `end`, since a
/// sequence need not report its length up front.
struct Sequence<'a> {
    out: &'a mut Vec<u8>,
    header: Vec<u8>,
    count: usize,
    body: Vec<u8>,
}

impl Sequence<'_> {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.count += 1;
        value.serialize(Encoder {
            out: &mut self.body,
        })
    }

    fn push_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        put_bytes(&mut self.body, key.as_bytes());
        self.push(value)
    }

    fn finish(self) -> Result<(), Error> {
        self.out.extend_from_slice(&self.header);
        put_len(self.out, self.count);
        self.out.extend_from_slice(&self.body);
        Ok(())
    }
}

impl ser::SerializeSeq for Sequence<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<(), Error> {
        self.finish()
    }
}

impl ser::SerializeTuple for Sequence<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<(), Error> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Sequence<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<(), Error> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Sequence<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<(), Error> {
        self.finish()
    }
}

impl ser::SerializeStruct for Sequence<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.push_field(key, value)
    }

    fn end(self) -> Result<(), Error> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Sequence<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.push_field(key, value)
    }

    fn end(self) -> Result<(), Error> {
        self.finish()
    }
}

// == Map ==
/// Unordered compound. Entries are buffered and written sorted by their
/// encoded key.
struct Map<'a> {
    out: &'a mut Vec<u8>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pending_key: Option<Vec<u8>>,
}

impl ser::SerializeMap for Map<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Error> {
        self.pending_key = Some(encode(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::custom("map value serialized before its key"))?;
        self.entries.push((key, encode(value)?));
        Ok(())
    }

    fn end(mut self) -> Result<(), Error> {
        self.entries.sort_unstable();
        self.out.push(MAP);
        put_len(self.out, self.entries.len());
        for (key, value) in &self.entries {
            self.out.extend_from_slice(key);
            self.out.extend_from_slice(value);
        }
        Ok(())
    }
}
