use crate::{
    file::writer::BufferPool,
    segment::{OffsetParams, Segment},
    Result, Writer,
};

/// A single edit applied to a base segment after it serialized itself.
pub enum Patch {
    /// Overwrite with raw bytes
    Bytes(Vec<u8>),
    /// Overwrite with a little-endian u32
    U32(u32),
}

impl Patch {
    fn len(&self) -> usize {
        match self {
            Patch::Bytes(bytes) => bytes.len(),
            Patch::U32(_) => 4,
        }
    }

    fn apply(&self, target: &mut [u8]) {
        match self {
            Patch::Bytes(bytes) => target.copy_from_slice(bytes),
            Patch::U32(value) => target.copy_from_slice(&value.to_le_bytes()),
        }
    }
}

/// A segment wrapping a base segment with a list of post-serialization edits.
///
/// The base writes itself into a pooled scratch buffer, the patches overwrite
/// their target ranges, and only then does the combined result reach the caller's
/// writer. This is how values that are only known after the assign pass (directory
/// RVAs, entry point tokens) land inside already-serialized structures without
/// re-encoding them.
///
/// # Examples
///
/// ```rust
/// use pescope::segment::{BufferSegment, Patch, PatchedSegment, Segment};
/// use pescope::Writer;
///
/// let base = BufferSegment::new(vec![0u8; 8]);
/// let mut patched = PatchedSegment::new(Box::new(base));
/// patched.patch(4, Patch::U32(0xDEADBEEF));
///
/// let mut writer = Writer::new();
/// patched.write(&mut writer)?;
/// assert_eq!(&writer.into_bytes()[4..], &[0xEF, 0xBE, 0xAD, 0xDE]);
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct PatchedSegment {
    base: Box<dyn Segment>,
    patches: Vec<(u32, Patch)>,
    pool: BufferPool,
}

impl PatchedSegment {
    /// Wrap a base segment with an initially empty patch list
    #[must_use]
    pub fn new(base: Box<dyn Segment>) -> Self {
        PatchedSegment {
            base,
            patches: Vec::new(),
            pool: BufferPool::new(),
        }
    }

    /// Record an edit at `offset` relative to the base segment's start
    ///
    /// ## Arguments
    /// * 'offset' - Offset within the base segment's physical bytes
    /// * 'patch' - The replacement value
    pub fn patch(&mut self, offset: u32, patch: Patch) {
        self.patches.push((offset, patch));
    }

    /// The wrapped base segment
    #[must_use]
    pub fn base(&self) -> &dyn Segment {
        self.base.as_ref()
    }
}

impl Segment for PatchedSegment {
    fn file_offset(&self) -> u64 {
        self.base.file_offset()
    }

    fn rva(&self) -> u32 {
        self.base.rva()
    }

    fn physical_size(&self) -> u32 {
        self.base.physical_size()
    }

    fn virtual_size(&self) -> u32 {
        self.base.virtual_size()
    }

    fn can_update_offsets(&self) -> bool {
        self.base.can_update_offsets()
    }

    fn update_offsets(&mut self, params: &OffsetParams) -> Result<()> {
        self.base.update_offsets(params)
    }

    fn write(&self, writer: &mut Writer) -> Result<()> {
        let mut scratch = self.pool.rent();
        self.base.write(&mut scratch)?;
        let mut bytes = scratch.finish();

        for (offset, patch) in &self.patches {
            let start = *offset as usize;
            let Some(end) = start.checked_add(patch.len()) else {
                return Err(crate::Error::OutOfBounds);
            };

            if end > bytes.len() {
                return Err(crate::Error::InvariantViolation {
                    message: format!(
                        "Patch at offset {:#x} (+{}) exceeds base segment size {}",
                        offset,
                        patch.len(),
                        bytes.len()
                    ),
                });
            }

            patch.apply(&mut bytes[start..end]);
        }

        writer.write_bytes(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::BufferSegment;

    #[test]
    fn patches_apply_after_base() {
        let base = BufferSegment::new(vec![0xFF; 12]);
        let mut patched = PatchedSegment::new(Box::new(base));
        patched.patch(0, Patch::Bytes(vec![0x4D, 0x5A]));
        patched.patch(8, Patch::U32(0x1337));

        let mut writer = Writer::new();
        patched.write(&mut writer).unwrap();

        let bytes = writer.into_bytes();
        assert_eq!(&bytes[0..2], b"MZ");
        assert_eq!(&bytes[2..8], &[0xFF; 6]);
        assert_eq!(&bytes[8..12], &[0x37, 0x13, 0x00, 0x00]);
    }

    #[test]
    fn out_of_range_patch_is_rejected() {
        let base = BufferSegment::new(vec![0; 4]);
        let mut patched = PatchedSegment::new(Box::new(base));
        patched.patch(2, Patch::U32(1));

        let mut writer = Writer::new();
        assert!(patched.write(&mut writer).is_err());
    }

    #[test]
    fn sizes_and_offsets_delegate_to_base() {
        let base = BufferSegment::with_virtual_size(vec![0; 8], 0x20);
        let mut patched = PatchedSegment::new(Box::new(base));
        patched
            .update_offsets(&OffsetParams::new(0x600, 0x4000))
            .unwrap();

        assert_eq!(patched.file_offset(), 0x600);
        assert_eq!(patched.rva(), 0x4000);
        assert_eq!(patched.physical_size(), 8);
        assert_eq!(patched.virtual_size(), 0x20);
    }
}
