//! Metadata root header and stream directory.
//!
//! This module defines the [`Root`] struct, which represents the root metadata header and
//! stream directory as specified by ECMA-335. It provides access to all metadata streams,
//! version info, and structural metadata required for parsing managed images.
//!
//! # Example
//!
//! ```rust,no_run
//! use pescope::metadata::root::Root;
//! let root = Root::read(&[
//!            0x42, 0x53, 0x4A, 0x42,
//!            0x01, 0x00,
//!            0x01, 0x00,
//!            0x00, 0x00, 0x00, 0x00,
//!            0x06, 0x00, 0x00, 0x00,
//!            b'v', b'4', b'.', b'0', b'.', b'0',
//!            0x00, 0x00,
//!            0x01, 0x00,
//!            0x1, 0x00, 0x00, 0x00, // StreamHeader
//!            0x5, 0x00, 0x00, 0x00,
//!            0x23, 0x7E, 0x00,
//!        ])?;
//! println!("Metadata version: {}", root.version);
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{
    file::io::{read_le, read_le_at},
    Error::OutOfBounds,
    Result, Writer,
};

/// The MAGIC value indicating the metadata root
pub const METADATA_MAGIC: u32 = 0x424A_5342;

/// A stream header provides the name, and the position and length of a particular table or
/// heap. Note that the length of a stream header structure is not fixed, but depends on the
/// length of its name field (a variable length null-terminated string, padded to 4 bytes).
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.2
pub struct StreamHeader {
    /// Offset of the stream, relative to the start of the metadata root
    pub offset: u32,
    /// Size of this stream in bytes, shall be a multiple of 4
    pub size: u32,
    /// Name of the stream, at most 32 characters
    pub name: String,
}

impl StreamHeader {
    /// Create a `StreamHeader` object from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data' - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the data is too short or the stream name is not one
    /// of the defined stream names
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let mut name = String::with_capacity(32);
        for counter in 0..std::cmp::min(32, data.len() - 8) {
            let name_char = read_le::<u8>(&data[8 + counter..])?;
            if name_char == 0 {
                break;
            }

            name.push(char::from(name_char));
        }

        if !["#Strings", "#US", "#Blob", "#GUID", "#~", "#-"]
            .iter()
            .any(|valid_name| name == *valid_name)
        {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
        })
    }

    /// Size of the serialized header: 8 fixed bytes plus the name padded to 4
    #[must_use]
    pub fn byte_size(&self) -> usize {
        8 + ((self.name.len() + 1) + 3) / 4 * 4
    }

    /// Serialize the header
    pub fn write(&self, writer: &mut Writer) {
        writer.write_le::<u32>(self.offset);
        writer.write_le::<u32>(self.size);
        writer.write_bytes(self.name.as_bytes());
        writer.write_le::<u8>(0);
        writer.align_to(4);
    }
}

/// The header of the present metadata, providing the information necessary for locating
/// all streams. The implemented structure is an approximation and not a 1:1 representation,
/// to allow better use within the framework.
///
/// # Example
///
/// ```rust,no_run
/// use pescope::metadata::root::Root;
/// # let data: &[u8] = &[];
/// let root = Root::read(data)?;
/// for stream in &root.stream_headers {
///     println!("Stream: {} (offset: {}, size: {})", stream.name, stream.offset, stream.size);
/// }
/// # Ok::<(), pescope::Error>(())
/// ```
///
/// ## Reference
/// - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
pub struct Root {
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Always 0
    pub reserved: u32,
    /// Number of bytes allocated to hold the version string
    pub length: u32,
    /// 'VersionString\0'
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// Number of streams
    pub stream_number: u16,
    /// Stream directory
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Reads a [`Root`] metadata header from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice from which this object shall be read
    ///
    /// # Errors
    /// Returns an error if the data is too short, the signature is invalid, or the
    /// stream directory is malformed.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != METADATA_MAGIC {
            return Err(malformed_error!(
                "METADATA_MAGIC does not match - {:#x}",
                signature
            ));
        }

        let version_string_length = read_le_at::<u32>(data, &mut (12))?;
        match u32::checked_add(version_string_length, 16_u32) {
            Some(str_end) => {
                let data_len = u32::try_from(data.len())
                    .map_err(|_| malformed_error!("Data length too large"))?;
                if str_end > data_len {
                    return Err(OutOfBounds);
                }
            }
            None => {
                return Err(malformed_error!(
                    "Version string length causing integer overflow - {} + {}",
                    version_string_length,
                    16
                ))
            }
        }

        // The declared length includes the terminator and padding; the version is
        // the part up to the first NUL
        let version_bytes = &data[16..16 + version_string_length as usize];
        let version_end = version_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8(version_bytes[..version_end].to_vec())
            .map_err(|_| malformed_error!("Version string is not valid UTF-8"))?;

        if version.is_empty() {
            return Err(malformed_error!("Version string cannot be empty"));
        }
        if version.len() > 255 {
            return Err(malformed_error!(
                "Version string length {} exceeds reasonable limit (255)",
                version.len()
            ));
        }

        let mut stream_offset = 16 + version_string_length as usize;
        let flags = read_le_at::<u16>(data, &mut stream_offset)?;
        let stream_count = read_le_at::<u16>(data, &mut stream_offset)?;
        if stream_count == 0 || stream_count > 6 || (stream_count * 9) as usize > data.len() {
            // 9 - min size that a valid StreamHeader can be; must have streams, no more than 6 possible
            return Err(malformed_error!("Invalid stream count"));
        }

        let mut streams = Vec::with_capacity(stream_count as usize);
        let mut streams_seen = [false; 6];

        for _ in 0..stream_count {
            if stream_offset > data.len() {
                return Err(OutOfBounds);
            }

            let new_stream = StreamHeader::from(&data[stream_offset..])?;
            if new_stream.offset as usize > data.len()
                || new_stream.size as usize > data.len()
                || new_stream.name.len() > 32
            {
                return Err(OutOfBounds);
            }

            match u32::checked_add(new_stream.offset, new_stream.size) {
                Some(range) => {
                    if range as usize > data.len() {
                        return Err(OutOfBounds);
                    }
                }
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        new_stream.offset,
                        new_stream.size
                    ))
                }
            }

            let stream_index = match new_stream.name.as_str() {
                "#Strings" => 0,
                "#US" => 1,
                "#Blob" => 2,
                "#GUID" => 3,
                "#~" => 4,
                "#-" => 5,
                _ => unreachable!("StreamHeader::from() should have validated the name"),
            };

            if streams_seen[stream_index] {
                return Err(malformed_error!(
                    "Duplicate stream name found: '{}'",
                    new_stream.name
                ));
            }
            streams_seen[stream_index] = true;

            stream_offset += new_stream.byte_size();

            streams.push(new_stream);
        }

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            reserved: read_le::<u32>(&data[8..])?,
            length: version_string_length,
            flags,
            stream_number: u16::try_from(streams.len())
                .map_err(|_| malformed_error!("Too many streams"))?,
            stream_headers: streams,
            version,
        })
    }

    /// Serialize the root header and stream directory.
    ///
    /// The version string is written NUL-terminated and padded to 4 bytes, with
    /// `length` refreshed to the padded size.
    pub fn write(&self, writer: &mut Writer) {
        let padded_version = (self.version.len() + 1 + 3) / 4 * 4;

        writer.write_le::<u32>(self.signature);
        writer.write_le::<u16>(self.major_version);
        writer.write_le::<u16>(self.minor_version);
        writer.write_le::<u32>(self.reserved);
        writer.write_le::<u32>(padded_version as u32);
        writer.write_bytes(self.version.as_bytes());
        writer.write_zeros(padded_version - self.version.len());
        writer.write_le::<u16>(self.flags);
        writer.write_le::<u16>(self.stream_headers.len() as u16);

        for stream in &self.stream_headers {
            stream.write(writer);
        }
    }

    /// Validates that loaded streams do not overlap in memory
    ///
    /// # Arguments
    /// * `total_metadata_size` - The total size of the metadata region
    ///
    /// # Errors
    /// Returns an error if any streams overlap or extend beyond the metadata bounds
    pub fn validate_stream_layout(&self, total_metadata_size: u32) -> Result<()> {
        let mut stream_ranges: Vec<(u32, u32, &str)> = Vec::new();

        for stream in &self.stream_headers {
            let end = stream.offset.checked_add(stream.size).ok_or_else(|| {
                malformed_error!(
                    "Stream '{}' size causes overflow: {} + {}",
                    stream.name,
                    stream.offset,
                    stream.size
                )
            })?;

            if end > total_metadata_size {
                return Err(malformed_error!(
                    "Stream '{}' extends beyond metadata bounds (end {} > metadata size {})",
                    stream.name,
                    end,
                    total_metadata_size
                ));
            }

            stream_ranges.push((stream.offset, end, &stream.name));
        }

        for (i, &(start1, end1, name1)) in stream_ranges.iter().enumerate() {
            for &(start2, end2, name2) in stream_ranges.iter().skip(i + 1) {
                if start1 < end2 && start2 < end1 {
                    return Err(malformed_error!(
                        "Stream '{}' ({}..{}) overlaps with stream '{}' ({}..{})",
                        name1,
                        start1,
                        end1,
                        name2,
                        start2,
                        end2
                    ));
                }
            }
        }

        Ok(())
    }
}
