use eio::{FromBytes, ReadExt};
use std::io::{Read, Result};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn read<const N: usize, T: FromBytes<N>>(&self, stream: &mut impl Read) -> Result<T> {
        let mut buf = [0u8; N];
        stream.read_exact(&mut buf)?;
        self.decode(buf)
    }

    pub fn decode<const N: usize, T: FromBytes<N>>(&self, bytes: [u8; N]) -> Result<T> {
        match self {
            Endian::Big => bytes.as_slice().read_be(),
            Endian::Little => bytes.as_slice().read_le(),
        }
    }

    pub fn decode_all<const N: usize, T: FromBytes<N>>(&self, bytes: &[u8]) -> Option<Vec<T>> {
        bytes
            .chunks_exact(N)
            .map(|chunk| {
                chunk
                    .try_into()
                    .ok()
                    .and_then(|arr| self.decode::<N, T>(arr).ok())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_byte_orders() {
        let bytes = [0x01, 0x02];
        assert_eq!(Endian::Little.decode::<2, u16>(bytes).unwrap(), 0x0201);
        assert_eq!(Endian::Big.decode::<2, u16>(bytes).unwrap(), 0x0102);
    }

    #[test]
    fn decode_all_rejects_ragged_input() {
        let values: Option<Vec<u16>> = Endian::Little.decode_all::<2, u16>(&[1, 0, 2, 0]);
        assert_eq!(values, Some(vec![1, 2]));
    }
}
