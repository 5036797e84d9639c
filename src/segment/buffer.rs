use crate::{
    segment::{OffsetParams, Segment},
    Result, Writer,
};

/// A segment owning raw bytes, optionally with a larger virtual size.
///
/// This is the leaf of every segment tree: section payloads, metadata streams,
/// and header blobs all end up as `BufferSegment`s. Only the physical bytes are
/// written; the gap up to the virtual size exists in the address space only.
///
/// # Examples
///
/// ```rust
/// use pescope::segment::{BufferSegment, Segment};
///
/// let segment = BufferSegment::with_virtual_size(vec![0x90; 0x200], 0x1000);
/// assert_eq!(segment.physical_size(), 0x200);
/// assert_eq!(segment.virtual_size(), 0x1000);
/// ```
pub struct BufferSegment {
    data: Vec<u8>,
    virtual_size: u32,
    file_offset: u64,
    rva: u32,
    pinned: bool,
}

impl BufferSegment {
    /// Create a segment whose virtual size equals its physical size
    ///
    /// ## Arguments
    /// * 'data' - The bytes this segment owns
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let virtual_size = data.len() as u32;
        BufferSegment {
            data,
            virtual_size,
            file_offset: 0,
            rva: 0,
            pinned: false,
        }
    }

    /// Create a segment with a virtual size that may exceed its physical size.
    ///
    /// The virtual size is clamped up to the physical size if a smaller value
    /// is supplied, preserving the `virtual >= physical` invariant.
    ///
    /// ## Arguments
    /// * 'data' - The bytes this segment owns
    /// * '`virtual_size`' - The mapped size of the segment
    #[must_use]
    pub fn with_virtual_size(data: Vec<u8>, virtual_size: u32) -> Self {
        let virtual_size = virtual_size.max(data.len() as u32);
        BufferSegment {
            data,
            virtual_size,
            file_offset: 0,
            rva: 0,
            pinned: false,
        }
    }

    /// Create a segment fixed at a location the assign pass must not move
    ///
    /// ## Arguments
    /// * 'data' - The bytes this segment owns
    /// * '`file_offset`' - The fixed file offset
    /// * 'rva' - The fixed RVA
    #[must_use]
    pub fn pinned(data: Vec<u8>, file_offset: u64, rva: u32) -> Self {
        let virtual_size = data.len() as u32;
        BufferSegment {
            data,
            virtual_size,
            file_offset,
            rva,
            pinned: true,
        }
    }

    /// The bytes this segment owns
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the owned bytes. The virtual size grows with the
    /// buffer if an edit extends past it.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Re-establish `virtual_size >= physical_size` after a buffer edit
    pub fn sync_virtual_size(&mut self) {
        self.virtual_size = self.virtual_size.max(self.data.len() as u32);
    }
}

impl Segment for BufferSegment {
    fn file_offset(&self) -> u64 {
        self.file_offset
    }

    fn rva(&self) -> u32 {
        self.rva
    }

    fn physical_size(&self) -> u32 {
        self.data.len() as u32
    }

    fn virtual_size(&self) -> u32 {
        self.virtual_size.max(self.data.len() as u32)
    }

    fn can_update_offsets(&self) -> bool {
        !self.pinned
    }

    fn update_offsets(&mut self, params: &OffsetParams) -> Result<()> {
        if self.pinned {
            return Err(crate::Error::InvariantViolation {
                message: format!(
                    "Segment pinned at offset {:#x} cannot be relocated",
                    self.file_offset
                ),
            });
        }

        self.file_offset = params.file_offset;
        self.rva = params.rva;
        Ok(())
    }

    fn write(&self, writer: &mut Writer) -> Result<()> {
        writer.write_bytes(&self.data);
        Ok(())
    }
}
