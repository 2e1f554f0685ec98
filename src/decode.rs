//! Decoding of AMQP primitive values.
//!
//! [`FieldDecoder`] is the set of primitive decode operations a content header needs, all sharing
//! a single position in a byte stream. [`WireDecoder`] implements it over any [`Read`] source.

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    error::{Error, Result},
    value::{Decimal, FieldTable, FieldValue, LongString},
    Timestamp, MAX_DEPTH,
};

/// Decode operations for every AMQP primitive type used in content headers. Each call consumes
/// exactly one encoded value from the underlying stream.
pub trait FieldDecoder {
    /// Read an unsigned 16-bit integer ("short").
    fn read_short(&mut self) -> Result<u16>;
    /// Read an unsigned 32-bit integer ("long").
    fn read_long(&mut self) -> Result<u32>;
    /// Read an unsigned 64-bit integer ("longlong").
    fn read_longlong(&mut self) -> Result<u64>;
    /// Read a single octet.
    fn read_octet(&mut self) -> Result<u8>;
    /// Read a short string: one length octet followed by that many bytes of UTF-8.
    fn read_shortstr(&mut self) -> Result<String>;
    /// Read a long string: a 32-bit length followed by that many opaque bytes.
    fn read_longstr(&mut self) -> Result<LongString>;
    /// Read a 64-bit timestamp in seconds.
    fn read_timestamp(&mut self) -> Result<Timestamp>;
    /// Read a field table.
    fn read_table(&mut self) -> Result<FieldTable>;
}

impl<D: FieldDecoder + ?Sized> FieldDecoder for &mut D {
    fn read_short(&mut self) -> Result<u16> {
        (**self).read_short()
    }
    fn read_long(&mut self) -> Result<u32> {
        (**self).read_long()
    }
    fn read_longlong(&mut self) -> Result<u64> {
        (**self).read_longlong()
    }
    fn read_octet(&mut self) -> Result<u8> {
        (**self).read_octet()
    }
    fn read_shortstr(&mut self) -> Result<String> {
        (**self).read_shortstr()
    }
    fn read_longstr(&mut self) -> Result<LongString> {
        (**self).read_longstr()
    }
    fn read_timestamp(&mut self) -> Result<Timestamp> {
        (**self).read_timestamp()
    }
    fn read_table(&mut self) -> Result<FieldTable> {
        (**self).read_table()
    }
}

// A nested body ran out of bytes before its last entry finished. The outer stream is fine; the
// declared length was a lie.
fn overrun(what: &'static str) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::Truncated { step } => Error::BadEncode(format!(
            "{} overran its declared length on step [{}]",
            what, step
        )),
        e => e,
    }
}

/// Big-endian AMQP primitive decoder over a byte stream.
#[derive(Debug)]
pub struct WireDecoder<R> {
    inner: R,
    depth: usize,
}

impl<R: Read> WireDecoder<R> {
    pub fn new(inner: R) -> WireDecoder<R> {
        Self { inner, depth: 0 }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    // Read exactly `len` bytes. The buffer grows with the data actually received, so a bogus
    // length can't force a huge allocation up front.
    fn read_bytes(&mut self, len: usize, step: &'static str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(Error::read_fail(step))?;
        if buf.len() != len {
            return Err(Error::Truncated { step });
        }
        Ok(buf)
    }

    // Open a decoder over a length-prefixed body one nesting level down.
    fn nested<'a>(&self, body: &'a [u8]) -> Result<WireDecoder<&'a [u8]>> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
        }
        Ok(WireDecoder {
            inner: body,
            depth: self.depth + 1,
        })
    }

    /// Read one typed table/array value: a type octet followed by the value itself.
    pub fn read_field_value(&mut self) -> Result<FieldValue> {
        let tag = self
            .inner
            .read_u8()
            .map_err(Error::read_fail("decode field type"))?;
        let step = "decode field value";
        Ok(match tag {
            b'V' => FieldValue::Void,
            b't' => FieldValue::Bool(self.read_octet()? != 0),
            b'b' => FieldValue::I8(self.inner.read_i8().map_err(Error::read_fail(step))?),
            b's' => FieldValue::I16(
                self.inner
                    .read_i16::<BigEndian>()
                    .map_err(Error::read_fail(step))?,
            ),
            b'I' => FieldValue::I32(
                self.inner
                    .read_i32::<BigEndian>()
                    .map_err(Error::read_fail(step))?,
            ),
            b'l' => FieldValue::I64(
                self.inner
                    .read_i64::<BigEndian>()
                    .map_err(Error::read_fail(step))?,
            ),
            b'f' => FieldValue::F32(
                self.inner
                    .read_f32::<BigEndian>()
                    .map_err(Error::read_fail(step))?,
            ),
            b'd' => FieldValue::F64(
                self.inner
                    .read_f64::<BigEndian>()
                    .map_err(Error::read_fail(step))?,
            ),
            b'D' => {
                let scale = self.read_octet()?;
                let value = self
                    .inner
                    .read_i32::<BigEndian>()
                    .map_err(Error::read_fail("decode decimal"))?;
                FieldValue::Decimal(Decimal { scale, value })
            }
            b'S' => FieldValue::LongString(self.read_longstr()?),
            b'x' => {
                let len = self.read_long()? as usize;
                FieldValue::Bytes(self.read_bytes(len, "decode byte array")?)
            }
            b'T' => FieldValue::Timestamp(self.read_timestamp()?),
            b'A' => FieldValue::Array(self.read_array()?),
            b'F' => FieldValue::Table(self.read_table()?),
            _ => {
                return Err(Error::BadEncode(format!(
                    "Unrecognised type in table: 0x{:02x}",
                    tag
                )))
            }
        })
    }

    /// Read a field array: a 32-bit byte length followed by typed values filling it exactly.
    pub fn read_array(&mut self) -> Result<Vec<FieldValue>> {
        let len = self.read_long()? as usize;
        let body = self.read_bytes(len, "decode array")?;
        let mut dec = self.nested(&body)?;
        let mut array = Vec::new();
        while !dec.inner.is_empty() {
            array.push(dec.read_field_value().map_err(overrun("field array"))?);
        }
        Ok(array)
    }
}

impl<R: Read> FieldDecoder for WireDecoder<R> {
    fn read_short(&mut self) -> Result<u16> {
        self.inner
            .read_u16::<BigEndian>()
            .map_err(Error::read_fail("decode short"))
    }

    fn read_long(&mut self) -> Result<u32> {
        self.inner
            .read_u32::<BigEndian>()
            .map_err(Error::read_fail("decode long"))
    }

    fn read_longlong(&mut self) -> Result<u64> {
        self.inner
            .read_u64::<BigEndian>()
            .map_err(Error::read_fail("decode longlong"))
    }

    fn read_octet(&mut self) -> Result<u8> {
        self.inner
            .read_u8()
            .map_err(Error::read_fail("decode octet"))
    }

    fn read_shortstr(&mut self) -> Result<String> {
        let len = self
            .inner
            .read_u8()
            .map_err(Error::read_fail("decode short string length"))?;
        let bytes = self.read_bytes(len as usize, "decode short string")?;
        String::from_utf8(bytes)
            .map_err(|e| Error::BadEncode(format!("Short string is not valid UTF-8: {}", e)))
    }

    fn read_longstr(&mut self) -> Result<LongString> {
        let len = self.read_long()? as usize;
        Ok(LongString::from(self.read_bytes(len, "decode long string")?))
    }

    fn read_timestamp(&mut self) -> Result<Timestamp> {
        self.inner
            .read_u64::<BigEndian>()
            .map(Timestamp::from_sec)
            .map_err(Error::read_fail("decode timestamp"))
    }

    fn read_table(&mut self) -> Result<FieldTable> {
        let len = self.read_long()? as usize;
        let body = self.read_bytes(len, "decode table")?;
        let mut dec = self.nested(&body)?;
        let mut table = FieldTable::new();
        while !dec.inner.is_empty() {
            let key = dec.read_shortstr().map_err(overrun("field table"))?;
            let value = dec.read_field_value().map_err(overrun("field table"))?;
            table.insert(key, value);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table_bytes(entries: &[u8]) -> Vec<u8> {
        let mut v = (entries.len() as u32).to_be_bytes().to_vec();
        v.extend_from_slice(entries);
        v
    }

    mod integers {
        use super::*;

        #[test]
        fn big_endian() {
            let data = [
                0x01, 0x02, // short
                0x01, 0x02, 0x03, 0x04, // long
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, // longlong
                0xff, // octet
            ];
            let mut dec = WireDecoder::new(&data[..]);
            assert_eq!(dec.read_short().unwrap(), 0x0102);
            assert_eq!(dec.read_long().unwrap(), 0x01020304);
            assert_eq!(dec.read_longlong().unwrap(), 256);
            assert_eq!(dec.read_octet().unwrap(), 255);
            assert!(dec.into_inner().is_empty());
        }

        #[test]
        fn truncated() {
            let data = [0x01, 0x02, 0x03];
            let mut dec = WireDecoder::new(&data[..]);
            match dec.read_long() {
                Err(Error::Truncated { step }) => assert_eq!(step, "decode long"),
                other => panic!("Expected truncation, got {:?}", other),
            }
        }

        #[test]
        fn timestamp() {
            let data = 1_234_567_890u64.to_be_bytes();
            let mut dec = WireDecoder::new(&data[..]);
            assert_eq!(
                dec.read_timestamp().unwrap(),
                Timestamp::from_sec(1_234_567_890)
            );
        }
    }

    mod strings {
        use super::*;

        #[test]
        fn shortstr() {
            let data = [5, b'h', b'e', b'l', b'l', b'o', 0];
            let mut dec = WireDecoder::new(&data[..]);
            assert_eq!(dec.read_shortstr().unwrap(), "hello");
            assert_eq!(dec.read_shortstr().unwrap(), "");
        }

        #[test]
        fn shortstr_bad_utf8() {
            let data = [2, 0xc3, 0x28];
            let mut dec = WireDecoder::new(&data[..]);
            assert!(matches!(dec.read_shortstr(), Err(Error::BadEncode(_))));
        }

        #[test]
        fn shortstr_truncated() {
            let data = [4, b'a', b'b'];
            let mut dec = WireDecoder::new(&data[..]);
            assert!(matches!(
                dec.read_shortstr(),
                Err(Error::Truncated {
                    step: "decode short string"
                })
            ));
        }

        #[test]
        fn longstr_is_opaque() {
            let data = [0, 0, 0, 3, 0xff, 0x00, 0x7f];
            let mut dec = WireDecoder::new(&data[..]);
            let s = dec.read_longstr().unwrap();
            assert_eq!(s.as_bytes(), &[0xff, 0x00, 0x7f]);
            assert_eq!(s.as_str(), None);
        }

        #[test]
        fn longstr_huge_length() {
            // Length claims 4 GiB, stream has 2 bytes
            let data = [0xff, 0xff, 0xff, 0xff, 1, 2];
            let mut dec = WireDecoder::new(&data[..]);
            assert!(matches!(
                dec.read_longstr(),
                Err(Error::Truncated { .. })
            ));
        }
    }

    mod tables {
        use super::*;

        #[test]
        fn empty() {
            let data = table_bytes(&[]);
            let mut dec = WireDecoder::new(&data[..]);
            assert!(dec.read_table().unwrap().is_empty());
        }

        #[test]
        fn every_field_type() {
            let mut e = Vec::new();
            let key = |e: &mut Vec<u8>, k: &str, tag: u8| {
                e.push(k.len() as u8);
                e.extend_from_slice(k.as_bytes());
                e.push(tag);
            };
            key(&mut e, "void", b'V');
            key(&mut e, "bool", b't');
            e.push(1);
            key(&mut e, "i8", b'b');
            e.push(0xfe);
            key(&mut e, "i16", b's');
            e.extend_from_slice(&(-300i16).to_be_bytes());
            key(&mut e, "i32", b'I');
            e.extend_from_slice(&(-70000i32).to_be_bytes());
            key(&mut e, "i64", b'l');
            e.extend_from_slice(&(1i64 << 40).to_be_bytes());
            key(&mut e, "f32", b'f');
            e.extend_from_slice(&1.5f32.to_be_bytes());
            key(&mut e, "f64", b'd');
            e.extend_from_slice(&(-2.25f64).to_be_bytes());
            key(&mut e, "dec", b'D');
            e.push(2);
            e.extend_from_slice(&12345i32.to_be_bytes());
            key(&mut e, "str", b'S');
            e.extend_from_slice(&[0, 0, 0, 2, b'h', b'i']);
            key(&mut e, "bin", b'x');
            e.extend_from_slice(&[0, 0, 0, 1, 0xaa]);
            key(&mut e, "time", b'T');
            e.extend_from_slice(&42u64.to_be_bytes());
            key(&mut e, "arr", b'A');
            e.extend_from_slice(&[0, 0, 0, 4, b'b', 1, b'b', 2]);
            key(&mut e, "tbl", b'F');
            e.extend_from_slice(&table_bytes(&[1, b'k', b't', 0]));

            let data = table_bytes(&e);
            let mut dec = WireDecoder::new(&data[..]);
            let t = FieldValue::Table(dec.read_table().unwrap());
            assert!(dec.into_inner().is_empty());

            assert!(t["void"].is_void());
            assert_eq!(t["bool"], FieldValue::Bool(true));
            assert_eq!(t["i8"], FieldValue::I8(-2));
            assert_eq!(t["i16"], FieldValue::I16(-300));
            assert_eq!(t["i32"], FieldValue::I32(-70000));
            assert_eq!(t["i64"], FieldValue::I64(1 << 40));
            assert_eq!(t["f32"], FieldValue::F32(1.5));
            assert_eq!(t["f64"], FieldValue::F64(-2.25));
            assert_eq!(
                t["dec"],
                FieldValue::Decimal(Decimal {
                    scale: 2,
                    value: 12345
                })
            );
            assert_eq!(t["str"].as_str(), Some("hi"));
            assert_eq!(t["bin"], FieldValue::Bytes(vec![0xaa]));
            assert_eq!(t["time"].as_timestamp(), Some(Timestamp::from_sec(42)));
            assert_eq!(
                t["arr"],
                FieldValue::Array(vec![FieldValue::I8(1), FieldValue::I8(2)])
            );
            assert_eq!(t["tbl"]["k"], FieldValue::Bool(false));
        }

        #[test]
        fn duplicate_key_keeps_last() {
            let data = table_bytes(&[1, b'a', b'b', 1, 1, b'a', b'b', 2]);
            let mut dec = WireDecoder::new(&data[..]);
            let t = dec.read_table().unwrap();
            assert_eq!(t.len(), 1);
            assert_eq!(t["a"], FieldValue::I8(2));
        }

        #[test]
        fn unknown_type() {
            let data = table_bytes(&[1, b'a', b'Z', 0]);
            let mut dec = WireDecoder::new(&data[..]);
            match dec.read_table() {
                Err(Error::BadEncode(msg)) => assert!(msg.contains("0x5a"), "{}", msg),
                other => panic!("Expected BadEncode, got {:?}", other),
            }
        }

        #[test]
        fn entry_overruns_length() {
            // Declared length stops in the middle of an i32 value; the stream itself has more.
            let mut data = table_bytes(&[1, b'a', b'I', 0, 0]);
            data.extend_from_slice(&[0, 1]);
            let mut dec = WireDecoder::new(&data[..]);
            assert!(matches!(dec.read_table(), Err(Error::BadEncode(_))));
        }

        #[test]
        fn stream_ends_inside_table() {
            let mut data = 10u32.to_be_bytes().to_vec();
            data.extend_from_slice(&[1, b'a']);
            let mut dec = WireDecoder::new(&data[..]);
            assert!(matches!(
                dec.read_table(),
                Err(Error::Truncated {
                    step: "decode table"
                })
            ));
        }

        #[test]
        fn depth_limit() {
            // Build MAX_DEPTH + 1 levels of {"a": {"a": ... {}}}
            let mut inner = table_bytes(&[]);
            for _ in 0..MAX_DEPTH {
                let mut entry = vec![1, b'a', b'F'];
                entry.extend_from_slice(&inner);
                inner = table_bytes(&entry);
            }
            let mut dec = WireDecoder::new(&inner[..]);
            assert!(matches!(dec.read_table(), Err(Error::ParseLimit(_))));

            // One level fewer is fine
            let mut inner = table_bytes(&[]);
            for _ in 0..MAX_DEPTH - 1 {
                let mut entry = vec![1, b'a', b'F'];
                entry.extend_from_slice(&inner);
                inner = table_bytes(&entry);
            }
            let mut dec = WireDecoder::new(&inner[..]);
            assert!(dec.read_table().is_ok());
        }
    }

    mod arrays {
        use super::*;

        #[test]
        fn values_in_order() {
            let data = [0, 0, 0, 6, b'b', 1, b'V', b's', 0xff, 0xfe];
            let mut dec = WireDecoder::new(&data[..]);
            assert_eq!(
                dec.read_array().unwrap(),
                vec![FieldValue::I8(1), FieldValue::Void, FieldValue::I16(-2)]
            );
        }

        #[test]
        fn entry_overruns_length() {
            // Declared length of 2 cuts the i32 off after its first byte
            let data = [0, 0, 0, 2, b'I', 0, 9];
            let mut dec = WireDecoder::new(&data[..]);
            match dec.read_array() {
                Err(Error::BadEncode(msg)) => assert!(msg.contains("field array"), "{}", msg),
                other => panic!("Expected BadEncode, got {:?}", other),
            }
        }

        #[test]
        fn depth_limit() {
            // MAX_DEPTH + 1 levels of [[...[]]]
            let mut inner = table_bytes(&[]);
            for _ in 0..MAX_DEPTH {
                let mut entry = vec![b'A'];
                entry.extend_from_slice(&inner);
                inner = table_bytes(&entry);
            }
            let mut dec = WireDecoder::new(&inner[..]);
            assert!(matches!(dec.read_array(), Err(Error::ParseLimit(_))));

            let mut inner = table_bytes(&[]);
            for _ in 0..MAX_DEPTH - 1 {
                let mut entry = vec![b'A'];
                entry.extend_from_slice(&inner);
                inner = table_bytes(&entry);
            }
            let mut dec = WireDecoder::new(&inner[..]);
            assert!(dec.read_array().is_ok());
        }
    }
}
