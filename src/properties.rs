use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    decode::{FieldDecoder, WireDecoder},
    error::{Error, Result},
    reader::PropertyReader,
    value::FieldTable,
    Timestamp, BASIC_CLASS_ID,
};

/// Properties of the `basic` content class, in wire declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicProperties {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub headers: Option<FieldTable>,
    pub delivery_mode: Option<u8>,
    pub priority: Option<u8>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub expiration: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub kind: Option<String>,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub cluster_id: Option<String>,
}

impl BasicProperties {
    /// Read the full property list: flag words, then every present value, then the end-of-flags
    /// check.
    pub fn read<D: FieldDecoder>(reader: &mut PropertyReader<D>) -> Result<BasicProperties> {
        let props = BasicProperties {
            content_type: reader.read_optional(|r| r.read_shortstr())?,
            content_encoding: reader.read_optional(|r| r.read_shortstr())?,
            headers: reader.read_optional(|r| r.read_table())?,
            delivery_mode: reader.read_optional(|r| r.read_octet())?,
            priority: reader.read_optional(|r| r.read_octet())?,
            correlation_id: reader.read_optional(|r| r.read_shortstr())?,
            reply_to: reader.read_optional(|r| r.read_shortstr())?,
            expiration: reader.read_optional(|r| r.read_shortstr())?,
            message_id: reader.read_optional(|r| r.read_shortstr())?,
            timestamp: reader.read_optional(|r| r.read_timestamp())?,
            kind: reader.read_optional(|r| r.read_shortstr())?,
            user_id: reader.read_optional(|r| r.read_shortstr())?,
            app_id: reader.read_optional(|r| r.read_shortstr())?,
            cluster_id: reader.read_optional(|r| r.read_shortstr())?,
        };
        reader.finish_presence()?;
        Ok(props)
    }

    /// True if the message was flagged as persistent (delivery mode 2).
    pub fn is_persistent(&self) -> bool {
        self.delivery_mode == Some(2)
    }
}

/// The payload of a content header frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentHeader {
    pub class_id: u16,
    pub weight: u16,
    pub body_size: u64,
    pub properties: BasicProperties,
}

impl ContentHeader {
    /// Read a content header payload from a stream. Stops right after the last property value.
    pub fn read<R: Read>(src: R) -> Result<ContentHeader> {
        let mut dec = WireDecoder::new(src);
        let class_id = dec.read_short()?;
        if class_id != BASIC_CLASS_ID {
            return Err(Error::BadEncode(format!(
                "Content header for unsupported class {}",
                class_id
            )));
        }
        let weight = dec.read_short()?;
        let body_size = dec.read_longlong()?;
        trace!(class_id, weight, body_size, "decoding content header");
        let properties = BasicProperties::read(&mut PropertyReader::new(&mut dec))?;
        Ok(ContentHeader {
            class_id,
            weight,
            body_size,
            properties,
        })
    }

    /// Decode a complete content header payload. Fails if any bytes are left over.
    pub fn decode(mut buf: &[u8]) -> Result<ContentHeader> {
        let header = Self::read(&mut buf)?;
        if !buf.is_empty() {
            return Err(Error::BadEncode(format!(
                "{} trailing bytes after content header properties",
                buf.len()
            )));
        }
        Ok(header)
    }
}
