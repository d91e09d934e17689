//! # fxpack
//!
//! A small, bounded, schema-agnostic TLV codec used for content-addressed records.
//!
//! ## Philosophy
//!
//! - **Canonical**: One logical value has exactly one encoding. There is no padding,
//!   no varint choice, and no optional whitespace, so encoded bytes can be hashed.
//! - **TLV Architecture**: `[Tag][Length?][Value]` lets readers skip unknown fields.
//! - **Bounded**: The encoder tracks open scopes explicitly and back-patches lengths.
//!   Decoders are zero-copy, bounds-checked views.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Containers**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers are Little-Endian.


/// Encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte does not correspond to a valid `Tag`, or a different tag was expected.
    InvalidTag(u8),
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// Closing a scope that does not match the active scope.
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Attempted to close a scope when only the root remains.
    ScopeUnderflow,
    /// Attempted to finalize the buffer with open scopes.
    ScopeStillOpen,
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// Bytes left over after the last expected item.
    TrailingBytes(usize),
    /// Blob or container length exceeds `u32::MAX`.
    BlobTooLarge(usize),
    /// Attempted to write more than one item into an Option or Variant.
    TooManyItems(Scope),
    /// Attempted to close an Option or Variant without a payload.
    EmptyAdt(Scope),
    /// Attempted to write a non-Variant directly into a Map.
    InvalidMapEntry,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTag(b) => write!(f, "invalid tag byte: {:#04x}", b),
            Error::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "scope mismatch: expected {:?}, found {:?}", expected, actual)
            }
            Error::ScopeUnderflow => write!(f, "no open scope to close"),
            Error::ScopeStillOpen => write!(f, "cannot finalize with open scopes"),
            Error::UnexpectedEnd => write!(f, "unexpected end of input"),
            Error::TrailingBytes(n) => write!(f, "{} trailing bytes after value", n),
            Error::BlobTooLarge(n) => write!(f, "blob of {} bytes exceeds u32 length", n),
            Error::TooManyItems(s) => write!(f, "too many items in scope {:?}; expected exactly 1", s),
            Error::EmptyAdt(s) => write!(f, "empty scope {:?}; expected exactly 1 item", s),
            Error::InvalidMapEntry => write!(f, "map entries must be variants"),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for fxpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    U32 = 0x05,
    OptionNone = 0x0F,

    // Blobs (Tag + u32 Len + Bytes)
    String = 0x10,
    Bytes = 0x11,

    // Containers (Tag + u32 Len + Body)
    List = 0x20,
    Map = 0x21,
    OptionSome = 0x30,
    Variant = 0x33,
}

impl Tag {
    /// Returns the Tag for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x05 => Some(Tag::U32),
            0x0F => Some(Tag::OptionNone),
            0x10 => Some(Tag::String),
            0x11 => Some(Tag::Bytes),
            0x20 => Some(Tag::List),
            0x21 => Some(Tag::Map),
            0x30 => Some(Tag::OptionSome),
            0x33 => Some(Tag::Variant),
            _ => None,
        }
    }
}

/// Kind of an open container on the `Encoder` stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The virtual root; allows any item.
    Root,
    /// Ordered sequence; allows any number of items.
    List,
    /// Named fields; strictly allows only `Tag::Variant` items.
    Map,
    /// Strict container; allows exactly one item.
    Option,
    /// Strict container; allows exactly one item (the payload) after the name.
    Variant,
}

struct Frame {
    start: usize,
    scope: Scope,
    count: usize,
}

/// A bounded, state-machine driven encoder.
///
/// All write methods validate the operation against the current `Scope`:
///
/// 1.  **Map**: only `variant_begin()` may be written directly.
/// 2.  **Option, Variant**: exactly one item must be written.
/// 3.  **Root**: the encoder must be back at the root to finalize bytes.
pub struct Encoder {
    buf: Vec<u8>,
    root: Frame,
    stack: Vec<Frame>,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
            root: Frame { start: 0, scope: Scope::Root, count: 0 },
            stack: Vec::with_capacity(8),
        }
    }

    /// Consumes the encoder and returns the final bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if !self.stack.is_empty() {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    fn current_frame(&mut self) -> &mut Frame {
        match self.stack.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn check_write(&mut self, tag: Tag) -> Result<()> {
        let frame = self.current_frame();
        match frame.scope {
            Scope::Root | Scope::List => Ok(()),
            Scope::Map if tag == Tag::Variant => Ok(()),
            Scope::Map => Err(Error::InvalidMapEntry),
            Scope::Option | Scope::Variant if frame.count >= 1 => Err(Error::TooManyItems(frame.scope)),
            Scope::Option | Scope::Variant => Ok(()),
        }
    }

    fn on_item_written(&mut self) {
        self.current_frame().count += 1;
    }

    fn write_blob(&mut self, tag: Tag, v: &[u8]) -> Result<()> {
        let len = u32::try_from(v.len()).map_err(|_| Error::BlobTooLarge(v.len()))?;
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(v);
        self.on_item_written();
        Ok(())
    }

    fn begin_scope(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&[0, 0, 0, 0]); // length placeholder
        self.stack.push(Frame { start: self.buf.len(), scope, count: 0 });
        Ok(())
    }

    fn end_scope(&mut self, expected: Scope) -> Result<()> {
        let frame = self.stack.pop().ok_or(Error::ScopeUnderflow)?;
        if frame.scope != expected {
            let actual = frame.scope;
            self.stack.push(frame);
            return Err(Error::ScopeMismatch { expected, actual });
        }
        if matches!(frame.scope, Scope::Option | Scope::Variant) && frame.count == 0 {
            let scope = frame.scope;
            self.stack.push(frame);
            return Err(Error::EmptyAdt(scope));
        }

        let body_len = self.buf.len() - frame.start;
        let len = u32::try_from(body_len).map_err(|_| Error::BlobTooLarge(body_len))?;
        self.buf[frame.start - 4..frame.start].copy_from_slice(&len.to_le_bytes());

        self.on_item_written();
        Ok(())
    }

    /// Encodes an unsigned 32-bit integer (LE).
    pub fn u32(&mut self, v: u32) -> Result<()> {
        self.check_write(Tag::U32)?;
        self.buf.push(Tag::U32 as u8);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self.on_item_written();
        Ok(())
    }

    /// Encodes `Option::None`.
    pub fn option_none(&mut self) -> Result<()> {
        self.check_write(Tag::OptionNone)?;
        self.buf.push(Tag::OptionNone as u8);
        self.on_item_written();
        Ok(())
    }

    /// Encodes a UTF-8 string blob.
    pub fn str(&mut self, v: &str) -> Result<()> {
        self.write_blob(Tag::String, v.as_bytes())
    }

    /// Encodes a raw byte blob.
    pub fn bytes(&mut self, v: &[u8]) -> Result<()> {
        self.write_blob(Tag::Bytes, v)
    }

    /// Begins a List. Must be closed via `list_end()`.
    pub fn list_begin(&mut self) -> Result<()> { self.begin_scope(Tag::List, Scope::List) }
    pub fn list_end(&mut self) -> Result<()> { self.end_scope(Scope::List) }

    /// Begins a Map. Only `variant_begin()` is allowed as a direct child.
    pub fn map_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Map, Scope::Map) }
    pub fn map_end(&mut self) -> Result<()> { self.end_scope(Scope::Map) }

    /// Begins an `Option::Some`. Requires exactly one item.
    pub fn option_some_begin(&mut self) -> Result<()> { self.begin_scope(Tag::OptionSome, Scope::Option) }
    pub fn option_some_end(&mut self) -> Result<()> { self.end_scope(Scope::Option) }

    /// Begins a named Variant. The name is written immediately; exactly one
    /// payload item must follow before `variant_end()`.
    pub fn variant_begin(&mut self, name: &str) -> Result<()> {
        self.begin_scope(Tag::Variant, Scope::Variant)?;
        self.str(name)?;
        // the name is metadata, not payload
        self.current_frame().count = 0;
        Ok(())
    }
    pub fn variant_end(&mut self) -> Result<()> { self.end_scope(Scope::Variant) }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Container reads return new `Decoder`s restricted to the container's body.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Fails with `TrailingBytes` unless the view is fully consumed.
    pub fn finish(self) -> Result<()> {
        match self.buf.len() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let b = *self.buf.first().ok_or(Error::UnexpectedEnd)?;
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?) as usize)
    }

    fn check_tag(&mut self, expected: Tag) -> Result<()> {
        let tag = self.peek_tag()?;
        if tag != expected {
            return Err(Error::InvalidTag(tag as u8));
        }
        self.read_bytes(1)?;
        Ok(())
    }

    /// Skips the next item and its nested children.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.read_bytes(1)?;
        match tag {
            Tag::OptionNone => {}
            Tag::U32 => { self.read_bytes(4)?; }
            Tag::String | Tag::Bytes | Tag::List | Tag::Map | Tag::OptionSome | Tag::Variant => {
                let len = self.read_len()?;
                self.read_bytes(len)?;
            }
        }
        Ok(())
    }

    /// Decodes u32 (LE).
    pub fn u32(&mut self) -> Result<u32> {
        self.check_tag(Tag::U32)?;
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        self.check_tag(Tag::String)?;
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// Decodes a byte slice.
    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.check_tag(Tag::Bytes)?;
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    fn enter_container(&mut self, expected: Tag) -> Result<Decoder<'a>> {
        self.check_tag(expected)?;
        let len = self.read_len()?;
        Ok(Decoder::new(self.read_bytes(len)?))
    }

    /// Decodes a List into an iterator of item decoders.
    pub fn list(&mut self) -> Result<ListIter<'a>> {
        Ok(ListIter { dec: self.enter_container(Tag::List)? })
    }

    /// Decodes a Map into an iterator of `(name, value)` pairs.
    pub fn map(&mut self) -> Result<MapIter<'a>> {
        Ok(MapIter { dec: self.enter_container(Tag::Map)? })
    }

    /// Decodes an Option. Returns a decoder over the payload if present.
    pub fn option(&mut self) -> Result<Option<Decoder<'a>>> {
        match self.peek_tag()? {
            Tag::OptionNone => {
                self.read_bytes(1)?;
                Ok(None)
            }
            Tag::OptionSome => Ok(Some(self.enter_container(Tag::OptionSome)?)),
            tag => Err(Error::InvalidTag(tag as u8)),
        }
    }

    /// Decodes a Variant. Returns `(name, payload)`.
    pub fn variant(&mut self) -> Result<(&'a str, Decoder<'a>)> {
        let mut inner = self.enter_container(Tag::Variant)?;
        let name = inner.str()?;
        Ok((name, inner))
    }
}

/// Iterator over the items of a List.
///
/// Each item is yielded as a `Decoder` restricted to exactly that item.
#[derive(Debug)]
pub struct ListIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = Result<Decoder<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dec.remaining() == 0 {
            return None;
        }
        let mut lookahead = self.dec.clone();
        if let Err(e) = lookahead.skip() {
            // poison the iterator so a malformed tail is reported once
            self.dec = Decoder::new(&[]);
            return Some(Err(e));
        }
        let len = self.dec.remaining() - lookahead.remaining();
        Some(self.dec.read_bytes(len).map(Decoder::new))
    }
}

/// Iterator over the `(name, value)` entries of a Map.
#[derive(Debug)]
pub struct MapIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> Iterator for MapIter<'a> {
    type Item = Result<(&'a str, Decoder<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dec.remaining() == 0 {
            return None;
        }
        let entry = self.dec.variant();
        if entry.is_err() {
            self.dec = Decoder::new(&[]);
        }
        Some(entry)
    }
}
