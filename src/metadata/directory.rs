//! The CLI metadata directory: COR20 header, metadata root, and all streams.

use std::sync::OnceLock;

use crate::{
    metadata::{
        cor20::Cor20Header,
        resolver::TokenResolver,
        root::Root,
        streams::{Blob, Guid, Strings, TablesHeader, UserStrings},
        token::Token,
        typesystem::TypeSystem,
    },
    pe::{DataDirectoryType, PeImage},
    Result,
};

/// The managed payload of a PE image: CLI header, metadata root, and streams.
///
/// A `NetDirectory` owns its streams, and each stream owns its heap buffer.
/// The element-type system is built lazily on first access through a one-shot
/// initializer; heap and table lookups go through the respective accessors.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{MappingMode, PeImage};
/// use pescope::metadata::NetDirectory;
///
/// let data = std::fs::read("app.exe")?;
/// let image = PeImage::parse(&data, MappingMode::Unmapped)?;
///
/// if let Some(directory) = NetDirectory::from_image(&image)? {
///     println!("Runtime {}.{}", directory.header.major_runtime_version,
///              directory.header.minor_runtime_version);
///     if let Some(tables) = directory.tables() {
///         println!("{} tables present", tables.table_count());
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct NetDirectory {
    /// The COR20 header
    pub header: Cor20Header,
    /// The metadata root and stream directory
    pub root: Root,
    strings: Option<Strings>,
    user_strings: Option<UserStrings>,
    blob: Option<Blob>,
    guid: Option<Guid>,
    tables: Option<TablesHeader>,
    type_system: OnceLock<TypeSystem>,
}

impl NetDirectory {
    /// Locate and parse the CLI metadata of a PE image.
    ///
    /// Returns `Ok(None)` if the image carries no CLR runtime header directory.
    ///
    /// ## Arguments
    /// * 'image' - The image to read from
    ///
    /// # Errors
    /// Returns an error if the CLI header or any stream is malformed
    pub fn from_image(image: &PeImage) -> Result<Option<NetDirectory>> {
        let Some(clr) = image.optional.directory(DataDirectoryType::ClrRuntimeHeader) else {
            return Ok(None);
        };
        if clr.is_empty() {
            return Ok(None);
        }

        let header_bytes = image.read_rva(clr.rva, crate::metadata::cor20::COR20_HEADER_SIZE)?;
        let header = Cor20Header::read(&header_bytes)?;

        let meta = image.read_rva(header.meta_data_rva, header.meta_data_size)?;
        Self::read(header, &meta).map(Some)
    }

    /// Parse a metadata directory from the CLI header and the metadata region's
    /// bytes.
    ///
    /// ## Arguments
    /// * 'header' - The parsed COR20 header
    /// * 'meta' - The metadata region, starting at the metadata root
    ///
    /// # Errors
    /// Returns an error if the root or any stream is malformed
    pub fn read(header: Cor20Header, meta: &[u8]) -> Result<NetDirectory> {
        let root = Root::read(meta)?;
        root.validate_stream_layout(meta.len() as u32)?;

        let mut strings = None;
        let mut user_strings = None;
        let mut blob = None;
        let mut guid = None;
        let mut tables = None;

        for stream in &root.stream_headers {
            let start = stream.offset as usize;
            let end = start + stream.size as usize;
            let bytes = meta[start..end].to_vec();

            match stream.name.as_str() {
                "#Strings" => strings = Some(Strings::from(bytes)?),
                "#US" => user_strings = Some(UserStrings::from(bytes)?),
                "#Blob" => blob = Some(Blob::from(bytes)?),
                "#GUID" => guid = Some(Guid::from(bytes)?),
                "#~" | "#-" => tables = Some(TablesHeader::from(bytes)?),
                _ => unreachable!("Root::read() only admits defined stream names"),
            }
        }

        Ok(NetDirectory {
            header,
            root,
            strings,
            user_strings,
            blob,
            guid,
            tables,
            type_system: OnceLock::new(),
        })
    }

    /// The `#Strings` heap, if present
    #[must_use]
    pub fn strings(&self) -> Option<&Strings> {
        self.strings.as_ref()
    }

    /// The `#US` heap, if present
    #[must_use]
    pub fn user_strings(&self) -> Option<&UserStrings> {
        self.user_strings.as_ref()
    }

    /// The `#Blob` heap, if present
    #[must_use]
    pub fn blob(&self) -> Option<&Blob> {
        self.blob.as_ref()
    }

    /// The `#GUID` heap, if present
    #[must_use]
    pub fn guid(&self) -> Option<&Guid> {
        self.guid.as_ref()
    }

    /// The tables heap, if present
    #[must_use]
    pub fn tables(&self) -> Option<&TablesHeader> {
        self.tables.as_ref()
    }

    /// The entry point token from the CLI header
    #[must_use]
    pub fn entry_point(&self) -> Token {
        Token::new(self.header.entry_point_token)
    }

    /// A token resolver over this directory's tables heap
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the directory has no tables heap
    pub fn resolver(&self) -> Result<TokenResolver<'_>> {
        match &self.tables {
            Some(tables) => Ok(TokenResolver::new(tables)),
            None => Err(malformed_error!("Metadata has no tables stream")),
        }
    }

    /// The interned element-type primitives, built on first access.
    ///
    /// Initialization is idempotent: racing callers observe equivalent content,
    /// never a partially built set.
    pub fn type_system(&self) -> &TypeSystem {
        self.type_system.get_or_init(TypeSystem::new)
    }
}
