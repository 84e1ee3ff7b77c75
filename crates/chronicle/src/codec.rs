//! Little-endian, no padding. Strings carry a `u32` byte length,
//! sequences a `u16` element count.

use std::io::{self, Read, Write};

use glam::{DVec3, Quat, Vec2, Vec3};

/// Largest element count a sequence prefix can describe.
pub const MAX_SEQ_LEN: usize = u16::MAX as usize;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("invalid {type_name} discriminant {value}")]
    InvalidDiscriminant { type_name: &'static str, value: u32 },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("sequence of {count} elements does not fit a u16 count")]
    CountOverflow { count: usize },
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(e)
        }
    }
}

pub trait Encode {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError>;
}

pub trait Decode: Sized {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError>;
}

pub fn write<T: Encode + ?Sized>(w: &mut dyn Write, value: &T) -> Result<(), CodecError> {
    value.encode(w)
}

pub fn read<T: Decode>(r: &mut dyn Read) -> Result<T, CodecError> {
    T::decode(r)
}

macro_rules! le_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
                    w.write_all(&self.to_le_bytes())?;
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    r.read_exact(&mut buf)?;
                    Ok(<$ty>::from_le_bytes(buf))
                }
            }
        )*
    };
}

le_scalar!(u8, u16, u32, u64, i32, i64, f32, f64);

impl Encode for bool {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        u8::from(*self).encode(w)
    }
}

impl Decode for bool {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        match u8::decode(r)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidDiscriminant {
                type_name: "bool",
                value: value as u32,
            }),
        }
    }
}

impl Encode for Vec2 {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.x.encode(w)?;
        self.y.encode(w)
    }
}

impl Decode for Vec2 {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Vec2::new(f32::decode(r)?, f32::decode(r)?))
    }
}

impl Encode for Vec3 {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.x.encode(w)?;
        self.y.encode(w)?;
        self.z.encode(w)
    }
}

impl Decode for Vec3 {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(Vec3::new(f32::decode(r)?, f32::decode(r)?, f32::decode(r)?))
    }
}

impl Encode for DVec3 {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.x.encode(w)?;
        self.y.encode(w)?;
        self.z.encode(w)
    }
}

impl Decode for DVec3 {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        Ok(DVec3::new(f64::decode(r)?, f64::decode(r)?, f64::decode(r)?))
    }
}

// x, y, z, w order; no renormalisation on either side.
impl Encode for Quat {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.x.encode(w)?;
        self.y.encode(w)?;
        self.z.encode(w)?;
        self.w.encode(w)
    }
}

impl Decode for Quat {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        let x = f32::decode(r)?;
        let y = f32::decode(r)?;
        let z = f32::decode(r)?;
        let w = f32::decode(r)?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }
}

impl Encode for str {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        let len = u32::try_from(self.len()).map_err(|_| CodecError::CountOverflow {
            count: self.len(),
        })?;
        len.encode(w)?;
        w.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        self.as_str().encode(w)
    }
}

impl Decode for String {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        let len = u32::decode(r)? as u64;
        // Read through `take` so a corrupt length cannot force a huge allocation.
        let mut bytes = Vec::new();
        r.take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(CodecError::UnexpectedEof);
        }
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        match self {
            Some(value) => {
                true.encode(w)?;
                value.encode(w)
            }
            None => false.encode(w),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        if bool::decode(r)? {
            Ok(Some(T::decode(r)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        write_seq(w, self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        write_seq(w, self)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(r: &mut dyn Read) -> Result<Self, CodecError> {
        read_seq(r)
    }
}

/// Write a `u16` count followed by every element.
pub fn write_seq<T: Encode>(w: &mut dyn Write, items: &[T]) -> Result<(), CodecError> {
    let count = u16::try_from(items.len()).map_err(|_| CodecError::CountOverflow {
        count: items.len(),
    })?;
    count.encode(w)?;
    for item in items {
        item.encode(w)?;
    }
    Ok(())
}

pub fn read_seq<T: Decode>(r: &mut dyn Read) -> Result<Vec<T>, CodecError> {
    let count = u16::decode(r)? as usize;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(T::decode(r)?);
    }
    Ok(items)
}

/// Implements [`Encode`] and [`Decode`] for a fieldless `Copy` enum by
/// its underlying integer width. Unknown discriminants decode to
/// [`CodecError::InvalidDiscriminant`].
macro_rules! wire_enum {
    ($ty:ident as $repr:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::codec::Encode for $ty {
            fn encode(
                &self,
                w: &mut dyn ::std::io::Write,
            ) -> Result<(), $crate::codec::CodecError> {
                <$repr as $crate::codec::Encode>::encode(&(*self as $repr), w)
            }
        }

        impl $crate::codec::Decode for $ty {
            fn decode(
                r: &mut dyn ::std::io::Read,
            ) -> Result<Self, $crate::codec::CodecError> {
                let value = <$repr as $crate::codec::Decode>::decode(r)?;
                $(
                    if value == $ty::$variant as $repr {
                        return Ok($ty::$variant);
                    }
                )+
                Err($crate::codec::CodecError::InvalidDiscriminant {
                    type_name: stringify!($ty),
                    value: value as u32,
                })
            }
        }
    };
}

pub(crate) use wire_enum;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u32)]
    enum Probe {
        A = 0,
        B = 7,
    }

    wire_enum!(Probe as u32 { A, B });

    #[test]
    fn scalars_are_little_endian() {
        let mut buf = Vec::new();
        write(&mut buf, &0x0102_0304u32).unwrap();
        write(&mut buf, &0x0506u16).unwrap();
        write(&mut buf, &1.0f32).unwrap();
        assert_eq!(&buf[..6], &[0x04, 0x03, 0x02, 0x01, 0x06, 0x05]);
        assert_eq!(&buf[6..], &1.0f32.to_le_bytes());
    }

    #[test]
    fn glam_types_roundtrip() {
        let mut buf = Vec::new();
        let position = DVec3::new(1.0e9 + 0.25, -3.5, 7.125);
        let rotation = Quat::from_rotation_z(0.75);
        let scale = Vec3::new(1.0, 2.0, 0.5);
        write(&mut buf, &position).unwrap();
        write(&mut buf, &rotation).unwrap();
        write(&mut buf, &scale).unwrap();
        assert_eq!(buf.len(), 24 + 16 + 12);

        let mut cursor = buf.as_slice();
        assert_eq!(read::<DVec3>(&mut cursor).unwrap(), position);
        assert_eq!(read::<Quat>(&mut cursor).unwrap(), rotation);
        assert_eq!(read::<Vec3>(&mut cursor).unwrap(), scale);
        assert!(cursor.is_empty());
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut buf = Vec::new();
        write(&mut buf, "stop").unwrap();
        assert_eq!(buf, [4, 0, 0, 0, b's', b't', b'o', b'p']);
        assert_eq!(read::<String>(&mut buf.as_slice()).unwrap(), "stop");
    }

    #[test]
    fn truncated_string_is_eof() {
        let buf = [9u8, 0, 0, 0, b'a', b'b'];
        assert!(matches!(
            read::<String>(&mut buf.as_slice()),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn short_scalar_is_eof() {
        let buf = [1u8, 2];
        assert!(matches!(
            read::<u32>(&mut buf.as_slice()),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let buf = [2u8];
        assert!(matches!(
            read::<bool>(&mut buf.as_slice()),
            Err(CodecError::InvalidDiscriminant { type_name: "bool", value: 2 })
        ));
    }

    #[test]
    fn enum_uses_repr_width() {
        let mut buf = Vec::new();
        write(&mut buf, &Probe::B).unwrap();
        assert_eq!(buf, [7, 0, 0, 0]);
        assert_eq!(read::<Probe>(&mut buf.as_slice()).unwrap(), Probe::B);
        assert_eq!(read::<Probe>(&mut [0u8, 0, 0, 0].as_slice()).unwrap(), Probe::A);

        let bad = [3u8, 0, 0, 0];
        assert!(matches!(
            read::<Probe>(&mut bad.as_slice()),
            Err(CodecError::InvalidDiscriminant { type_name: "Probe", value: 3 })
        ));
    }

    #[test]
    fn sequences_carry_u16_count() {
        let mut buf = Vec::new();
        write(&mut buf, &vec![1u32, 2, 3]).unwrap();
        assert_eq!(&buf[..2], &[3, 0]);
        assert_eq!(read::<Vec<u32>>(&mut buf.as_slice()).unwrap(), vec![1, 2, 3]);

        let mut empty = Vec::new();
        write(&mut empty, &Vec::<u32>::new()).unwrap();
        assert_eq!(empty, [0, 0]);
    }

    #[test]
    fn oversized_sequence_is_rejected_before_writing() {
        let items = vec![0u8; MAX_SEQ_LEN + 1];
        let mut buf = Vec::new();
        assert!(matches!(
            write_seq(&mut buf, &items),
            Err(CodecError::CountOverflow { count }) if count == MAX_SEQ_LEN + 1
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn option_uses_presence_flag() {
        let mut buf = Vec::new();
        write(&mut buf, &Some(5u8)).unwrap();
        write(&mut buf, &None::<u8>).unwrap();
        assert_eq!(buf, [1, 5, 0]);
        let mut cursor = buf.as_slice();
        assert_eq!(read::<Option<u8>>(&mut cursor).unwrap(), Some(5));
        assert_eq!(read::<Option<u8>>(&mut cursor).unwrap(), None);
    }
}
