//! Compiled module format
//!
//! The structural contract the identity patcher depends on: a small tagged
//! header (name fields, version, dependency list) followed by an opaque body
//! blob. The body carries the executable payload and is never interpreted
//! here; the execution runtime owns the full format.
//!
//! All multi-byte fields are little-endian. Strings are u16 length-prefixed
//! UTF-8.

/// Magic bytes at the start of every compiled module image.
pub const MODULE_MAGIC: [u8; 4] = *b"RMOD";

/// Format version this loader understands.
pub const FORMAT_VERSION: u16 = 1;

/// Errors produced while parsing a module image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("bad magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u16),

    #[error("unexpected end of image at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("invalid UTF-8 in {field} field")]
    InvalidString { field: &'static str },

    #[error("{0} trailing bytes after module body")]
    TrailingBytes(usize),
}

/// Errors produced while re-encoding a module image.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{field} is {len} bytes, exceeding the u16 length field")]
    StringTooLong { field: &'static str, len: usize },

    #[error("{0} dependencies exceed the u16 count field")]
    TooManyDependencies(usize),

    #[error("body is {0} bytes, exceeding the u32 length field")]
    BodyTooLarge(usize),
}

/// Module header metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// Module name. Identity field, rewritten on patch.
    pub name: String,
    /// Primary executable unit name. Identity field, rewritten on patch.
    pub primary_unit: String,
    /// Module version string, never touched by patching.
    pub version: String,
    /// Declared dependencies, never touched by patching.
    pub dependencies: Vec<String>,
}

/// A parsed compiled module: header metadata plus opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    pub metadata: ModuleMetadata,
    pub body: Vec<u8>,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.buf.len() - self.pos;
        if remaining < n {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: n - remaining,
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.u16()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidString { field })
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

fn put_string(out: &mut Vec<u8>, field: &'static str, value: &str) -> Result<(), EncodeError> {
    let len = u16::try_from(value.len()).map_err(|_| EncodeError::StringTooLong {
        field,
        len: value.len(),
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

impl CompiledModule {
    /// Parse a raw module image.
    ///
    /// Strict: any structural defect fails the whole parse, a partially
    /// decoded module is never returned.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(raw);

        let magic_bytes = r.take(4)?;
        let magic = [magic_bytes[0], magic_bytes[1], magic_bytes[2], magic_bytes[3]];
        if magic != MODULE_MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }

        let format_version = r.u16()?;
        if format_version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(format_version));
        }

        let name = r.string("module name")?;
        let primary_unit = r.string("primary unit")?;
        let version = r.string("module version")?;

        let dependency_count = r.u16()? as usize;
        let mut dependencies = Vec::with_capacity(dependency_count);
        for _ in 0..dependency_count {
            dependencies.push(r.string("dependency")?);
        }

        let body_len = r.u32()? as usize;
        let body = r.take(body_len)?.to_vec();

        if r.remaining() != 0 {
            return Err(DecodeError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            metadata: ModuleMetadata {
                name,
                primary_unit,
                version,
                dependencies,
            },
            body,
        })
    }

    /// Re-serialize the module into a fresh byte buffer.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let meta = &self.metadata;
        let mut out = Vec::with_capacity(self.body.len() + 64);

        out.extend_from_slice(&MODULE_MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

        put_string(&mut out, "module name", &meta.name)?;
        put_string(&mut out, "primary unit", &meta.primary_unit)?;
        put_string(&mut out, "module version", &meta.version)?;

        let dependency_count = u16::try_from(meta.dependencies.len())
            .map_err(|_| EncodeError::TooManyDependencies(meta.dependencies.len()))?;
        out.extend_from_slice(&dependency_count.to_le_bytes());
        for dependency in &meta.dependencies {
            put_string(&mut out, "dependency", dependency)?;
        }

        let body_len =
            u32::try_from(self.body.len()).map_err(|_| EncodeError::BodyTooLarge(self.body.len()))?;
        out.extend_from_slice(&body_len.to_le_bytes());
        out.extend_from_slice(&self.body);

        Ok(out)
    }
}
