use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Number of bytes a type occupies once marshaled.
pub trait MarshalSize {
    fn marshal_size(&self) -> usize;
}

/// Binary encoding into a caller-provided buffer.
pub trait Marshal: MarshalSize {
    /// Writes the binary form into `buf` and returns the number of bytes
    /// written. `buf` must be at least `marshal_size()` long.
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize>;

    fn marshal(&self) -> Result<Bytes> {
        let l = self.marshal_size();
        let mut buf = BytesMut::with_capacity(l);
        buf.resize(l, 0);
        let n = self.marshal_to(&mut buf)?;
        if n != l {
            return Err(Error::WrongMarshalSize);
        }
        Ok(buf.freeze())
    }
}

/// Binary decoding from a [`Buf`].
pub trait Unmarshal: MarshalSize {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf;
}
