//! # Function manifests
//!
//! A manifest names a deployed function: which exports may be invoked, where
//! its bytecode lives, and the logical types of its arguments. The encoded
//! manifest is itself a blob, so its id is the function's durable address.
//!
//! ## Wire format
//!
//! An fxpack `Map` with fields written in this fixed order:
//!
//! ```text
//! { entrypoints: List<String>,
//!   bytecode:    Bytes[32],
//!   args:        List<Map { name: String, codec: Option<Bytes[32]> }> }
//! ```
//!
//! Because the field order and every length prefix are fixed, equal manifests
//! always encode to equal bytes. Decoding is lenient about field order and
//! skips unknown fields, but never about missing or duplicated ones.

use fxpack::Decoder;
use fxpack::Encoder;
use fxstore::ContentId;

const ENTRYPOINTS: &str = "entrypoints";
const LEGACY_ENTRYPOINT: &str = "entrypoint";
const BYTECODE: &str = "bytecode";
const ARGS: &str = "args";
const NAME: &str = "name";
const CODEC: &str = "codec";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A manifest must name at least one entrypoint.
    EmptyEntrypoints,
    /// The bytes are truncated, malformed, or lack a required field.
    Corrupt(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEntrypoints => write!(f, "manifest has no entrypoints"),
            Self::Corrupt(msg) => write!(f, "manifest corrupt: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<fxpack::Error> for Error {
    fn from(e: fxpack::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Logical type of one argument, optionally pointing at a codec blob.
///
/// Purely descriptive: the call engine never checks argument bytes against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: String,
    pub codec: Option<ContentId>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), codec: None }
    }

    pub fn with_codec(name: impl Into<String>, codec: ContentId) -> Self {
        Self { name: name.into(), codec: Some(codec) }
    }
}

/// Immutable description of a deployed function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionManifest {
    entrypoints: Vec<String>,
    bytecode: ContentId,
    args: Vec<TypeDescriptor>,
}

impl FunctionManifest {
    /// Builds a manifest, rejecting an empty entrypoint list.
    ///
    /// Entrypoint names are not checked against the module's exports here;
    /// that happens when a call resolves them.
    pub fn new(entrypoints: Vec<String>, bytecode: ContentId, args: Vec<TypeDescriptor>) -> Result<Self> {
        if entrypoints.is_empty() {
            return Err(Error::EmptyEntrypoints);
        }
        Ok(Self { entrypoints, bytecode, args })
    }

    pub fn entrypoints(&self) -> &[String] {
        &self.entrypoints
    }

    pub fn bytecode(&self) -> ContentId {
        self.bytecode
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        &self.args
    }

    pub fn has_entrypoint(&self, name: &str) -> bool {
        self.entrypoints.iter().any(|e| e == name)
    }

    /// Canonical encoding. Equal manifests always produce equal bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.map_begin()?;

        enc.variant_begin(ENTRYPOINTS)?;
        enc.list_begin()?;
        for name in &self.entrypoints {
            enc.str(name)?;
        }
        enc.list_end()?;
        enc.variant_end()?;

        enc.variant_begin(BYTECODE)?;
        enc.bytes(self.bytecode.as_bytes())?;
        enc.variant_end()?;

        enc.variant_begin(ARGS)?;
        enc.list_begin()?;
        for arg in &self.args {
            encode_type(&mut enc, arg)?;
        }
        enc.list_end()?;
        enc.variant_end()?;

        enc.map_end()?;
        Ok(enc.into_bytes()?)
    }

    /// Decodes a manifest, accepting the legacy single `entrypoint` field.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);

        let mut entrypoints: Option<Vec<String>> = None;
        let mut legacy: Option<String> = None;
        let mut bytecode: Option<ContentId> = None;
        let mut args: Option<Vec<TypeDescriptor>> = None;

        for entry in dec.map()? {
            let (key, mut val) = entry?;
            match key {
                ENTRYPOINTS => {
                    let names = val
                        .list()?
                        .map(|item| item.and_then(|mut d| d.str().map(str::to_owned)))
                        .collect::<fxpack::Result<Vec<_>>>()?;
                    set_once(&mut entrypoints, key, names)?;
                }
                LEGACY_ENTRYPOINT => set_once(&mut legacy, key, val.str()?.to_owned())?,
                BYTECODE => set_once(&mut bytecode, key, decode_id(&mut val)?)?,
                ARGS => {
                    let mut types = Vec::new();
                    for item in val.list()? {
                        types.push(decode_type(&mut item?)?);
                    }
                    set_once(&mut args, key, types)?;
                }
                _ => continue,
            }
            val.finish()?;
        }
        dec.finish()?;

        let entrypoints = match (entrypoints, legacy) {
            (Some(list), None) => list,
            (None, Some(name)) => vec![name],
            (Some(_), Some(_)) => {
                return Err(Error::Corrupt("both entrypoints and legacy entrypoint present".into()));
            }
            (None, None) => return Err(missing(ENTRYPOINTS)),
        };
        let bytecode = bytecode.ok_or_else(|| missing(BYTECODE))?;
        let args = args.ok_or_else(|| missing(ARGS))?;

        Self::new(entrypoints, bytecode, args)
    }
}

fn encode_type(enc: &mut Encoder, ty: &TypeDescriptor) -> fxpack::Result<()> {
    enc.map_begin()?;
    enc.variant_begin(NAME)?;
    enc.str(&ty.name)?;
    enc.variant_end()?;
    enc.variant_begin(CODEC)?;
    match &ty.codec {
        Some(id) => {
            enc.option_some_begin()?;
            enc.bytes(id.as_bytes())?;
            enc.option_some_end()?;
        }
        None => enc.option_none()?,
    }
    enc.variant_end()?;
    enc.map_end()
}

fn decode_type(dec: &mut Decoder) -> Result<TypeDescriptor> {
    let mut name: Option<String> = None;
    let mut codec: Option<Option<ContentId>> = None;

    for entry in dec.map()? {
        let (key, mut val) = entry?;
        match key {
            NAME => set_once(&mut name, key, val.str()?.to_owned())?,
            CODEC => {
                let id = match val.option()? {
                    Some(mut inner) => {
                        let id = decode_id(&mut inner)?;
                        inner.finish()?;
                        Some(id)
                    }
                    None => None,
                };
                set_once(&mut codec, key, id)?;
            }
            _ => continue,
        }
        val.finish()?;
    }

    Ok(TypeDescriptor {
        name: name.ok_or_else(|| missing(NAME))?,
        codec: codec.unwrap_or(None),
    })
}

fn decode_id(dec: &mut Decoder) -> Result<ContentId> {
    let raw = dec.bytes()?;
    ContentId::from_slice(raw)
        .ok_or_else(|| Error::Corrupt(format!("content id must be {} bytes, found {}", ContentId::LEN, raw.len())))
}

fn set_once<T>(slot: &mut Option<T>, key: &str, value: T) -> Result<()> {
    if slot.is_some() {
        return Err(Error::Corrupt(format!("duplicate field '{}'", key)));
    }
    *slot = Some(value);
    Ok(())
}

fn missing(field: &str) -> Error {
    Error::Corrupt(format!("missing field '{}'", field))
}
