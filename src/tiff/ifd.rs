use super::{Endian, Tag, TagId, TagType, TiffError, Variant};
use std::io::{Read, Seek, SeekFrom};

#[derive(Clone, Debug)]
pub struct Ifd(pub Vec<Tag>);

impl Ifd {
    pub fn parse<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        endian: Endian,
        variant: Variant,
    ) -> Result<(Ifd, u64), TiffError> {
        // IFD starts at offset
        stream.seek(SeekFrom::Start(offset))?;

        // IFD header is just the number of tags
        let tag_count = match variant {
            Variant::Normal => endian.read::<2, u16>(stream)? as u64,
            Variant::Big => endian.read(stream)?,
        };

        // Parse each tag in the IFD
        let mut tags = Vec::with_capacity(tag_count.min(u16::MAX as u64) as usize);
        for _ in 0..tag_count {
            let code: u16 = endian.read(stream)?;
            let datatype: TagType = endian.read::<2, u16>(stream)?.into();
            let count = variant.read_offset(endian, stream)? as usize;

            // Out-of-line payloads (tile offset tables and the like) are left
            // where they are; only their location is recorded.
            let data_size = count.saturating_mul(datatype.size_in_bytes());
            let offset_size = variant.offset_bytesize();
            let mut inline = vec![0u8; offset_size];
            stream.read_exact(&mut inline)?;

            let (data, offset) = if data_size > offset_size {
                let data_offset = variant.read_offset(endian, &mut inline.as_slice())?;
                (vec![], Some(data_offset))
            } else {
                inline.truncate(data_size);
                (inline, None)
            };

            tags.push(Tag {
                code,
                datatype,
                endian,
                count,
                data,
                offset,
            });
        }

        let ifd = Ifd(tags);
        let next_ifd_offset = variant.read_offset(endian, stream)?;

        Ok((ifd, next_ifd_offset))
    }

    pub fn get_tag(&self, id: TagId) -> Result<&Tag, TiffError> {
        let code: u16 = id.into();
        let Self(tags) = &self;
        tags.iter()
            .find(|tag| tag.code == code)
            .ok_or(TiffError::MissingTag(id))
    }

    pub fn has_tag(&self, id: TagId) -> bool {
        self.get_tag(id).is_ok()
    }

    pub fn get_unsigned(&self, id: TagId) -> Result<u64, TiffError> {
        self.get_tag(id)?
            .first_unsigned()
            .ok_or(TiffError::BadTag(id))
    }

    pub fn dimensions(&self) -> Result<(u64, u64), TiffError> {
        Ok((
            self.get_unsigned(TagId::ImageWidth)?,
            self.get_unsigned(TagId::ImageLength)?,
        ))
    }

    pub fn is_tiled(&self) -> bool {
        self.has_tag(TagId::TileWidth) && self.has_tag(TagId::TileOffsets)
    }

    pub fn is_georeferenced(&self) -> bool {
        self.has_tag(TagId::ModelTransformation)
            || (self.has_tag(TagId::ModelTiepoint) && self.has_tag(TagId::ModelPixelScale))
    }
}
