//! Pre-flight walk that rejects floats JSON cannot represent.
//!
//! `serde_json` writes NaN and the infinities as `null`, which would
//! silently replace the stored value. Walking the value first turns them
//! into encode failures instead.

use std::fmt::Display;

use serde::Serialize;
use serde::ser::{self, Error as _};

type Error = serde_json::Error;

pub(super) fn check<T: Serialize + ?Sized>(value: &T) -> Result<(), Error> {
	value.serialize(FiniteCheck)
}

fn float(value: f64) -> Result<(), Error> {
	if value.is_finite() {
		Ok(())
	} else {
		Err(Error::custom(format!("unsupported value: {value}")))
	}
}

#[derive(Clone, Copy)]
struct FiniteCheck;

impl ser::Serializer for FiniteCheck {
	type Ok = ();
	type Error = Error;
	type SerializeSeq = Self;
	type SerializeTuple = Self;
	type SerializeTupleStruct = Self;
	type SerializeTupleVariant = Self;
	type SerializeMap = Self;
	type SerializeStruct = Self;
	type SerializeStructVariant = Self;

	fn serialize_bool(self, _v: bool) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_i8(self, _v: i8) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_i16(self, _v: i16) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_i32(self, _v: i32) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_i64(self, _v: i64) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_i128(self, _v: i128) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_u8(self, _v: u8) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_u16(self, _v: u16) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_u32(self, _v: u32) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_u64(self, _v: u64) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_u128(self, _v: u128) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_f32(self, v: f32) -> Result<(), Error> {
		float(f64::from(v))
	}

	fn serialize_f64(self, v: f64) -> Result<(), Error> {
		float(v)
	}

	fn serialize_char(self, _v: char) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_str(self, _v: &str) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_bytes(self, _v: &[u8]) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_none(self) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Error> {
		value.serialize(self)
	}

	fn serialize_unit(self) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_unit_struct(self, _name: &'static str) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_unit_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
	) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_newtype_struct<T: Serialize + ?Sized>(
		self,
		_name: &'static str,
		value: &T,
	) -> Result<(), Error> {
		value.serialize(self)
	}

	fn serialize_newtype_variant<T: Serialize + ?Sized>(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		value: &T,
	) -> Result<(), Error> {
		value.serialize(self)
	}

	fn serialize_seq(self, _len: Option<usize>) -> Result<Self, Error> {
		Ok(self)
	}

	fn serialize_tuple(self, _len: usize) -> Result<Self, Error> {
		Ok(self)
	}

	fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, Error> {
		Ok(self)
	}

	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_len: usize,
	) -> Result<Self, Error> {
		Ok(self)
	}

	fn serialize_map(self, _len: Option<usize>) -> Result<Self, Error> {
		Ok(self)
	}

	fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, Error> {
		Ok(self)
	}

	fn serialize_struct_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_len: usize,
	) -> Result<Self, Error> {
		Ok(self)
	}

	fn collect_str<T: Display + ?Sized>(self, _value: &T) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeSeq for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeTuple for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeTupleStruct for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeTupleVariant for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeMap for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Error> {
		key.serialize(*self)
	}

	fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeStruct for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(
		&mut self,
		_key: &'static str,
		value: &T,
	) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeStructVariant for FiniteCheck {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(
		&mut self,
		_key: &'static str,
		value: &T,
	) -> Result<(), Error> {
		value.serialize(*self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}
