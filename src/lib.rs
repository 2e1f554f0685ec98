//! amqp-props decodes the property list of an AMQP 0-9-1 content header.
//!
//! A content header announces its optional properties with a chain of 16-bit flag words. Each
//! word carries up to 15 presence bits, most significant first, and uses its lowest bit to say
//! whether another flag word follows. The values of the present properties come after, in
//! declaration order, using AMQP's primitive encodings.
//!
//! - [`PropertyReader`] walks the flag words and dispatches value decodes. It works with any
//!   [`FieldDecoder`], so a schema driver can be tested without a real byte stream.
//! - [`WireDecoder`] is the big-endian [`FieldDecoder`] over any [`std::io::Read`] source,
//!   including nested field tables and arrays.
//! - [`BasicProperties`] and [`ContentHeader`] drive the reader for the `basic` class, the only
//!   content class in AMQP 0-9-1.
//!
//! ```
//! use amqp_props::ContentHeader;
//!
//! let payload = [
//!     0x00, 0x3c, // class id 60
//!     0x00, 0x00, // weight
//!     0, 0, 0, 0, 0, 0, 0, 5, // body size
//!     0x10, 0x00, // flags: delivery-mode only
//!     0x02, // delivery-mode = persistent
//! ];
//! let header = ContentHeader::decode(&payload).unwrap();
//! assert_eq!(header.body_size, 5);
//! assert!(header.properties.is_persistent());
//! ```

mod decode;
mod error;
mod flags;
mod properties;
mod reader;
mod timestamp;
mod value;

pub use decode::{FieldDecoder, WireDecoder};
pub use error::{Error, Result};
pub use flags::{FlagWord, PRESENCE_BITS};
pub use properties::{BasicProperties, ContentHeader};
pub use reader::PropertyReader;
pub use timestamp::Timestamp;
pub use value::{Decimal, FieldTable, FieldValue, LongString};

/// Class id of `basic`, the content class whose headers this crate decodes.
pub const BASIC_CLASS_ID: u16 = 60;
/// The maximum allowed depth of nested field tables and arrays.
pub const MAX_DEPTH: usize = 100;
