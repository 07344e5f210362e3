//! Binary codec for [`DatumEnvelope`].
//!
//! The envelope is written as an Avro binary record. Fields in order:
//!
//! | field                  | Avro type             |
//! |------------------------|-----------------------|
//! | `datum_type_id`        | string                |
//! | `datum_schema_version` | int                   |
//! | `datum_key`            | union [null, string]  |
//! | `datum_unique_id`      | union [null, string]  |
//! | `incarnation`          | int                   |
//! | `logical_timestamp`    | long                  |
//! | `creation_time`        | long                  |
//! | `source_host`          | string                |
//! | `datum_bytes`          | bytes                 |
//!
//! Ints and longs are zigzag varints; strings and bytes are a long length
//! followed by the raw bytes. A union is a long branch index followed by the
//! branch value.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::envelope::DatumEnvelope;
use crate::error::EnvelopeError;

/// Longest zigzag varint for a 64-bit value.
const MAX_VARINT_LEN: usize = 10;

/// Encode an envelope into its wire form.
pub fn encode(envelope: &DatumEnvelope) -> Bytes {
    let mut out = BytesMut::with_capacity(encoded_len_hint(envelope));

    put_string(&mut out, &envelope.datum_type_id);
    put_long(&mut out, envelope.datum_schema_version as i64);
    put_optional_string(&mut out, envelope.datum_key.as_deref());
    let unique_id = envelope.datum_unique_id.map(|id| id.to_string());
    put_optional_string(&mut out, unique_id.as_deref());
    put_long(&mut out, envelope.incarnation as i64);
    put_long(&mut out, envelope.logical_timestamp);
    put_long(&mut out, envelope.creation_time);
    put_string(&mut out, &envelope.source_host);
    put_bytes(&mut out, &envelope.datum_bytes);

    out.freeze()
}

/// Decode an envelope from its wire form.
///
/// The whole buffer must be consumed; trailing bytes are rejected.
pub fn decode(buf: &[u8]) -> Result<DatumEnvelope, EnvelopeError> {
    let mut reader = Reader { buf };

    let datum_type_id = reader.read_string("datum_type_id")?;
    let datum_schema_version = reader.read_int("datum_schema_version")?;
    let datum_key = reader.read_optional_string("datum_key")?;
    let datum_unique_id = reader
        .read_optional_string("datum_unique_id")?
        .map(|s| Uuid::parse_str(&s).map_err(|_| EnvelopeError::InvalidUniqueId(s)))
        .transpose()?;
    let incarnation = reader.read_int("incarnation")?;
    let logical_timestamp = reader.read_long("logical_timestamp")?;
    let creation_time = reader.read_long("creation_time")?;
    let source_host = reader.read_string("source_host")?;
    let datum_bytes = Bytes::copy_from_slice(reader.read_raw("datum_bytes")?);

    if !reader.buf.is_empty() {
        return Err(EnvelopeError::TrailingBytes(reader.buf.len()));
    }

    Ok(DatumEnvelope {
        datum_type_id,
        datum_schema_version,
        datum_key,
        datum_unique_id,
        incarnation,
        logical_timestamp,
        creation_time,
        source_host,
        datum_bytes,
    })
}

fn encoded_len_hint(envelope: &DatumEnvelope) -> usize {
    // Seven varints at worst, two union tags, a 36-char UUID.
    7 * MAX_VARINT_LEN
        + 2
        + 36
        + envelope.datum_type_id.len()
        + envelope.datum_key.as_ref().map_or(0, String::len)
        + envelope.source_host.len()
        + envelope.datum_bytes.len()
}

fn put_long(out: &mut BytesMut, value: i64) {
    let mut n = ((value << 1) ^ (value >> 63)) as u64;
    while n >= 0x80 {
        out.put_u8((n as u8) | 0x80);
        n >>= 7;
    }
    out.put_u8(n as u8);
}

fn put_bytes(out: &mut BytesMut, value: &[u8]) {
    put_long(out, value.len() as i64);
    out.put_slice(value);
}

fn put_string(out: &mut BytesMut, value: &str) {
    put_bytes(out, value.as_bytes());
}

fn put_optional_string(out: &mut BytesMut, value: Option<&str>) {
    match value {
        None => put_long(out, 0),
        Some(s) => {
            put_long(out, 1);
            put_string(out, s);
        }
    }
}

/// Forward-only cursor over the input.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn read_long(&mut self, field: &'static str) -> Result<i64, EnvelopeError> {
        let mut n: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let (&b, rest) = self
                .buf
                .split_first()
                .ok_or(EnvelopeError::Truncated(field))?;
            self.buf = rest;

            // The tenth byte may only contribute the top bit.
            if i == MAX_VARINT_LEN - 1 && b > 1 {
                return Err(EnvelopeError::InvalidVarint(field));
            }
            n |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(((n >> 1) as i64) ^ -((n & 1) as i64));
            }
        }
        Err(EnvelopeError::InvalidVarint(field))
    }

    fn read_int(&mut self, field: &'static str) -> Result<i32, EnvelopeError> {
        let value = self.read_long(field)?;
        i32::try_from(value).map_err(|_| EnvelopeError::IntOverflow { field, value })
    }

    fn read_raw(&mut self, field: &'static str) -> Result<&'a [u8], EnvelopeError> {
        let length = self.read_long(field)?;
        if length < 0 {
            return Err(EnvelopeError::NegativeLength { field, length });
        }
        let length = length as u64;
        if length > self.buf.len() as u64 {
            return Err(EnvelopeError::Truncated(field));
        }
        let (value, rest) = self.buf.split_at(length as usize);
        self.buf = rest;
        Ok(value)
    }

    fn read_string(&mut self, field: &'static str) -> Result<String, EnvelopeError> {
        let raw = self.read_raw(field)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| EnvelopeError::InvalidUtf8(field))
    }

    fn read_optional_string(
        &mut self,
        field: &'static str,
    ) -> Result<Option<String>, EnvelopeError> {
        match self.read_long(field)? {
            0 => Ok(None),
            1 => self.read_string(field).map(Some),
            index => Err(EnvelopeError::InvalidUnionBranch { field, index }),
        }
    }
}
