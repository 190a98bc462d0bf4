//! Specialized binary input and output.
//! Uses the error handling for this crate.

pub use ::std::io::{Read, Write};
use half::slice::{HalfFloatSliceExt};
use lebe::prelude::*;
use ::half::f16;
use crate::error::{Error, Result, UnitResult};
use std::convert::TryFrom;


/// Generic trait that defines common binary operations such as reading and writing for this type.
/// All values are stored in little-endian byte order.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this would consume in a byte stream.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Read as many values of type `Self` as fit into the specified slice.
    /// If the slice cannot be filled completely, returns `Error::Invalid`.
    fn read_slice(read: &mut impl Read, slice: &mut[Self]) -> UnitResult;

    /// Write this value to the writer.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the writer.
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult;

    /// Read as many values of type `Self` as specified with `count`.
    /// Does not allocate before the reader proved to contain enough bytes,
    /// so a corrupt count cannot trigger a huge allocation.
    fn read_vec(read: &mut &[u8], count: usize) -> Result<Vec<Self>> {
        let byte_size = count.checked_mul(Self::BYTE_SIZE)
            .ok_or_else(|| Error::invalid("value count"))?;

        if byte_size > read.len() {
            return Err(Error::invalid("reference to missing bytes"));
        }

        let mut values = vec![Self::default(); count];
        Self::read_slice(read, &mut values)?;
        Ok(values)
    }

    /// Write the length of the slice as an `i32` and then its contents.
    #[inline]
    fn write_i32_sized_slice<W: Write>(write: &mut W, slice: &[Self]) -> UnitResult {
        let size = i32::try_from(slice.len()).map_err(|_| Error::encode("slice too large for an i32 size prefix"))?;
        size.write(write)?;
        Self::write_slice(write, slice)
    }
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            #[inline]
            fn write(self, write: &mut impl Write) -> Result<()> {
                write.write_as_little_endian(&self)?;
                Ok(())
            }

            #[inline]
            fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> Result<()> {
                read.read_from_little_endian_into(slice)?;
                Ok(())
            }

            #[inline]
            fn write_slice(write: &mut impl Write, slice: &[Self]) -> Result<()> {
                write.write_as_little_endian(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
implement_data_for_primitive!(u32);
implement_data_for_primitive!(i32);
implement_data_for_primitive!(u64);
implement_data_for_primitive!(f32);


impl Data for f16 {
    #[inline]
    fn read(read: &mut impl Read) -> Result<Self> {
        u16::read(read).map(f16::from_bits)
    }

    #[inline]
    fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> Result<()> {
        let bits = slice.reinterpret_cast_mut();
        u16::read_slice(read, bits)
    }

    #[inline]
    fn write(self, write: &mut impl Write) -> Result<()> {
        self.to_bits().write(write)
    }

    #[inline]
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> Result<()> {
        let bits = slice.reinterpret_cast();
        u16::write_slice(write, bits)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn i32_sized_slice_layout(){
        let mut bytes = Vec::new();
        u8::write_i32_sized_slice(&mut bytes, &[7, 8, 9]).unwrap();
        assert_eq!(bytes, vec![ 3, 0, 0, 0, 7, 8, 9 ]);

        let mut read = bytes.as_slice();
        assert_eq!(i32::read(&mut read).unwrap(), 3);
        assert_eq!(u8::read_vec(&mut read, 3).unwrap(), vec![ 7, 8, 9 ]);
        assert!(read.is_empty());
    }

    #[test]
    fn read_vec_rejects_missing_bytes_before_allocating(){
        let bytes = [ 1_u8, 0, 0, 0 ];
        let result = u32::read_vec(&mut &bytes[..], usize::MAX / 2);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn half_floats_are_little_endian(){
        let values = [ f16::from_f32(1.0), f16::from_f32(-2.5) ];
        let mut bytes = Vec::new();
        f16::write_slice(&mut bytes, &values).unwrap();
        assert_eq!(&bytes[..2], &f16::from_f32(1.0).to_bits().to_le_bytes());

        let mut decoded = [ f16::ZERO; 2 ];
        f16::read_slice(&mut bytes.as_slice(), &mut decoded).unwrap();
        assert_eq!(decoded, values);
    }
}
