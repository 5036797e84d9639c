use crate::{
    segment::{align_up, OffsetParams, Segment},
    Result, Writer,
};

/// A segment composed of an ordered sequence of sub-segments.
///
/// Children are laid out back to back, each starting on the composite's child
/// alignment. The assign pass advances a file cursor by the aligned physical
/// size of each child and an RVA cursor by the aligned virtual size; the emit
/// pass concatenates the children with zero padding in between.
///
/// # Examples
///
/// ```rust
/// use pescope::segment::{BufferSegment, CompositeSegment, OffsetParams, Segment};
///
/// let mut composite = CompositeSegment::new(16);
/// composite.push(Box::new(BufferSegment::new(vec![0; 100])));
/// composite.push(Box::new(BufferSegment::new(vec![0; 200])));
///
/// composite.update_offsets(&OffsetParams::new(0x400, 0x2000))?;
///
/// // 100 bytes round up to 112 on a 16-byte alignment
/// assert_eq!(composite.children()[1].file_offset(), 0x470);
/// assert_eq!(composite.children()[1].rva(), 0x2070);
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct CompositeSegment {
    children: Vec<Box<dyn Segment>>,
    alignment: u32,
    file_offset: u64,
    rva: u32,
}

impl CompositeSegment {
    /// Create an empty composite whose children start on the given alignment
    ///
    /// ## Arguments
    /// * 'alignment' - Boundary each child is placed on, zero for byte-packing
    #[must_use]
    pub fn new(alignment: u32) -> Self {
        CompositeSegment {
            children: Vec::new(),
            alignment,
            file_offset: 0,
            rva: 0,
        }
    }

    /// Append a child segment
    pub fn push(&mut self, child: Box<dyn Segment>) {
        self.children.push(child);
    }

    /// The ordered child segments
    #[must_use]
    pub fn children(&self) -> &[Box<dyn Segment>] {
        &self.children
    }

    /// Mutable access to the ordered child segments
    pub fn children_mut(&mut self) -> &mut Vec<Box<dyn Segment>> {
        &mut self.children
    }

    /// Amount of child segments
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True if the composite has no children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn accumulated_size(&self, virtual_sizes: bool) -> u32 {
        let mut total: u64 = 0;
        for (index, child) in self.children.iter().enumerate() {
            let size = u64::from(if virtual_sizes {
                child.virtual_size()
            } else {
                child.physical_size()
            });

            if index + 1 == self.children.len() {
                total += size;
            } else {
                total += align_up(size, u64::from(self.alignment));
            }
        }

        total as u32
    }
}

impl Segment for CompositeSegment {
    fn file_offset(&self) -> u64 {
        self.file_offset
    }

    fn rva(&self) -> u32 {
        self.rva
    }

    fn physical_size(&self) -> u32 {
        self.accumulated_size(false)
    }

    fn virtual_size(&self) -> u32 {
        self.accumulated_size(true)
    }

    fn can_update_offsets(&self) -> bool {
        self.children.iter().all(|child| child.can_update_offsets())
    }

    fn update_offsets(&mut self, params: &OffsetParams) -> Result<()> {
        if !self.can_update_offsets() {
            return Err(crate::Error::InvariantViolation {
                message: "Composite contains a pinned child and cannot be relocated".to_string(),
            });
        }

        self.file_offset = params.file_offset;
        self.rva = params.rva;

        let mut file_cursor = params.file_offset;
        let mut rva_cursor = u64::from(params.rva);

        for child in &mut self.children {
            child.update_offsets(&OffsetParams::new(file_cursor, rva_cursor as u32))?;

            file_cursor += align_up(
                u64::from(child.physical_size()),
                u64::from(self.alignment),
            );
            rva_cursor += align_up(u64::from(child.virtual_size()), u64::from(self.alignment));
        }

        Ok(())
    }

    fn write(&self, writer: &mut Writer) -> Result<()> {
        let start = writer.pos();

        for (index, child) in self.children.iter().enumerate() {
            child.write(writer)?;

            if index + 1 != self.children.len() {
                let written = writer.pos() - start;
                let padded = align_up(written as u64, u64::from(self.alignment)) as usize;
                writer.write_zeros(padded - written);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::BufferSegment;

    #[test]
    fn rebuild_assigns_aligned_offsets() {
        let mut composite = CompositeSegment::new(16);
        composite.push(Box::new(BufferSegment::new(vec![0xAA; 100])));
        composite.push(Box::new(BufferSegment::new(vec![0xBB; 200])));

        composite
            .update_offsets(&OffsetParams::new(0x400, 0x2000))
            .unwrap();

        assert_eq!(composite.children()[0].file_offset(), 0x400);
        assert_eq!(composite.children()[0].rva(), 0x2000);
        assert_eq!(composite.children()[1].file_offset(), 0x470);
        assert_eq!(composite.children()[1].rva(), 0x2070);
    }

    #[test]
    fn write_pads_between_children() {
        let mut composite = CompositeSegment::new(16);
        composite.push(Box::new(BufferSegment::new(vec![0xAA; 10])));
        composite.push(Box::new(BufferSegment::new(vec![0xBB; 4])));

        let mut writer = Writer::new();
        composite.write(&mut writer).unwrap();

        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[0..10], &[0xAA; 10]);
        assert_eq!(&bytes[10..16], &[0x00; 6]);
        assert_eq!(&bytes[16..20], &[0xBB; 4]);

        assert_eq!(composite.physical_size(), 20);
    }

    #[test]
    fn virtual_size_accumulates_child_virtual_sizes() {
        let mut composite = CompositeSegment::new(0x10);
        composite.push(Box::new(BufferSegment::with_virtual_size(
            vec![0; 0x20],
            0x40,
        )));
        composite.push(Box::new(BufferSegment::new(vec![0; 0x10])));

        assert_eq!(composite.physical_size(), 0x30);
        assert_eq!(composite.virtual_size(), 0x50);
        assert!(composite.virtual_size() >= composite.physical_size());
    }

    #[test]
    fn pinned_child_blocks_relocation() {
        let mut composite = CompositeSegment::new(4);
        composite.push(Box::new(BufferSegment::pinned(vec![0; 4], 0x100, 0x100)));

        assert!(!composite.can_update_offsets());
        assert!(composite
            .update_offsets(&OffsetParams::new(0x400, 0x2000))
            .is_err());
    }
}
