use tracing::trace;

use crate::{
    decode::FieldDecoder,
    error::{Error, Result},
    flags::{FlagWord, PRESENCE_BITS},
    value::{FieldTable, LongString},
    Timestamp,
};

/// Reads a content header property list: the chain of flag words announcing which properties are
/// present, and the values of those properties.
///
/// A schema-aware driver calls [`read_presence`](Self::read_presence) exactly once per property,
/// in declaration order. When it returns true, the driver decodes that property's value with the
/// matching `read_*` method before moving on. Once every property has been checked, the driver
/// calls [`finish_presence`](Self::finish_presence).
///
/// Flag words are fetched lazily, so the underlying stream is never read past what the driver has
/// asked for. Any error leaves the reader desynchronized from the stream; the whole header must be
/// abandoned.
#[derive(Debug)]
pub struct PropertyReader<D> {
    decoder: D,
    flag_word: FlagWord,
    bit_count: u8,
}

impl<D: FieldDecoder> PropertyReader<D> {
    pub fn new(decoder: D) -> PropertyReader<D> {
        Self {
            decoder,
            flag_word: FlagWord::PRIMED,
            bit_count: PRESENCE_BITS,
        }
    }

    /// The most recently loaded flag word.
    pub fn flag_word(&self) -> FlagWord {
        self.flag_word
    }

    /// How many presence bits of the current flag word have been consumed.
    pub fn bits_consumed(&self) -> u8 {
        self.bit_count
    }

    pub fn get_ref(&self) -> &D {
        &self.decoder
    }

    pub fn into_inner(self) -> D {
        self.decoder
    }

    /// Load the next flag word from the stream. Fails if the current word doesn't advertise one.
    pub fn read_flag_word(&mut self) -> Result<()> {
        if !self.flag_word.has_continuation() {
            return Err(Error::UnadvertisedFlagWord);
        }
        self.flag_word = FlagWord::new(self.decoder.read_short()?);
        self.bit_count = 0;
        trace!(
            flag_word = self.flag_word.raw(),
            continuation = self.flag_word.has_continuation(),
            "loaded property flag word"
        );
        Ok(())
    }

    /// Check whether the next property is present, loading a new flag word first if the current
    /// one is used up.
    pub fn read_presence(&mut self) -> Result<bool> {
        if self.bit_count == PRESENCE_BITS {
            self.read_flag_word()?;
        }
        let present = self.flag_word.is_present(self.bit_count);
        self.bit_count += 1;
        Ok(present)
    }

    /// End presence checking. Fails if the wire still advertises another flag word.
    pub fn finish_presence(&self) -> Result<()> {
        if self.flag_word.has_continuation() {
            return Err(Error::UnexpectedContinuation);
        }
        Ok(())
    }

    pub fn read_shortstr(&mut self) -> Result<String> {
        self.decoder.read_shortstr()
    }

    pub fn read_longstr(&mut self) -> Result<LongString> {
        self.decoder.read_longstr()
    }

    pub fn read_short(&mut self) -> Result<u16> {
        self.decoder.read_short()
    }

    pub fn read_long(&mut self) -> Result<u32> {
        self.decoder.read_long()
    }

    pub fn read_longlong(&mut self) -> Result<u64> {
        self.decoder.read_longlong()
    }

    pub fn read_octet(&mut self) -> Result<u8> {
        self.decoder.read_octet()
    }

    pub fn read_timestamp(&mut self) -> Result<Timestamp> {
        self.decoder.read_timestamp()
    }

    pub fn read_table(&mut self) -> Result<FieldTable> {
        self.decoder.read_table()
    }

    /// Check presence of the next property and decode it with `read` if present.
    pub fn read_optional<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        if self.read_presence()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }
}
