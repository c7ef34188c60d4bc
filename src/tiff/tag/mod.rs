use super::Endian;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt::Display;

mod id;

pub use id::TagId;

#[derive(Clone, Debug)]
pub struct Tag {
    pub code: u16,
    pub datatype: TagType,
    pub count: usize,
    pub data: Vec<u8>,
    pub endian: Endian,
    /// Where an out-of-line payload lives; `data` is empty when set.
    pub offset: Option<u64>,
}

impl Tag {
    pub fn id(&self) -> Option<TagId> {
        TagId::try_from(self.code).ok()
    }

    /// Unsigned integer values, widened to u64.
    ///
    /// None if the tag is not an unsigned integer type or its payload was
    /// not read.
    pub fn unsigned_values(&self) -> Option<Vec<u64>> {
        if self.offset.is_some() {
            return None;
        }
        let e = self.endian;
        match self.datatype {
            TagType::Byte => Some(self.data.iter().map(|v| *v as u64).collect()),
            TagType::Short => e
                .decode_all::<2, u16>(&self.data)
                .map(|v| v.into_iter().map(u64::from).collect()),
            TagType::Long | TagType::Ifd => e
                .decode_all::<4, u32>(&self.data)
                .map(|v| v.into_iter().map(u64::from).collect()),
            TagType::Long8 | TagType::Ifd8 => e.decode_all::<8, u64>(&self.data),
            _ => None,
        }
    }

    pub fn first_unsigned(&self) -> Option<u64> {
        self.unsigned_values()?.first().copied()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("Unknown({})", self.code),
        };
        write!(f, "{} {:?}[{}]", id_string, self.datatype, self.count)?;
        if let Some(offset) = self.offset {
            write!(f, " @{offset}")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum TagType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
    Ifd = 13,
    Long8 = 16,
    SLong8 = 17,
    Ifd8 = 18,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

impl TagType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            TagType::Byte => 1,
            TagType::Ascii => 1,
            TagType::Short => 2,
            TagType::Long => 4,
            TagType::Rational => 8,
            TagType::SByte => 1,
            TagType::Undefined => 1,
            TagType::SShort => 2,
            TagType::SLong => 4,
            TagType::SRational => 8,
            TagType::Float => 4,
            TagType::Double => 8,
            TagType::Ifd => 4,
            TagType::Long8 => 8,
            TagType::SLong8 => 8,
            TagType::Ifd8 => 8,

            TagType::Unknown => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_shorts_and_longs() {
        let short = Tag {
            code: TagId::ImageWidth.into(),
            datatype: TagType::Short,
            count: 1,
            data: vec![0x00, 0x02],
            endian: Endian::Little,
            offset: None,
        };
        assert_eq!(short.first_unsigned(), Some(512));

        let long = Tag {
            code: TagId::ImageLength.into(),
            datatype: TagType::Long,
            count: 1,
            data: vec![0x00, 0x01, 0x00, 0x00],
            endian: Endian::Big,
            offset: None,
        };
        assert_eq!(long.first_unsigned(), Some(65536));
    }

    #[test]
    fn floats_are_not_unsigned() {
        let tag = Tag {
            code: 0x830E,
            datatype: TagType::Double,
            count: 1,
            data: vec![0; 8],
            endian: Endian::Little,
            offset: None,
        };
        assert_eq!(tag.id(), Some(TagId::ModelPixelScale));
        assert_eq!(tag.unsigned_values(), None);
    }

    #[test]
    fn deferred_payloads_have_no_values() {
        let tag = Tag {
            code: TagId::TileOffsets.into(),
            datatype: TagType::Long,
            count: 70_000,
            data: vec![],
            endian: Endian::Little,
            offset: Some(4096),
        };
        assert_eq!(tag.unsigned_values(), None);
        assert_eq!(tag.to_string(), "TileOffsets Long[70000] @4096");
    }
}
