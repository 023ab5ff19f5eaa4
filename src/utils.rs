use crate::Scalar;

/// append the little endian bytes of `value`
#[inline]
pub(crate) fn extend_le_bytes<T: Scalar>(value: T, out: &mut Vec<u8>) {
    let start = out.len();
    out.extend_from_slice(bytemuck::bytes_of(&value));
    if cfg!(target_endian = "big") {
        out[start..].reverse();
    }
}

/// read a value from exactly `T::SIZE` little endian bytes
#[inline]
pub(crate) fn from_le_bytes<T: Scalar>(bytes: &[u8]) -> T {
    let mut value: T = bytemuck::pod_read_unaligned(bytes);
    if cfg!(target_endian = "big") {
        bytemuck::bytes_of_mut(&mut value).reverse();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_round_trip() {
        let mut bytes = Vec::new();
        extend_le_bytes(0x0102_0304_u32, &mut bytes);
        extend_le_bytes(-1.5_f64, &mut bytes);
        assert_eq!(&bytes[..4], &[4, 3, 2, 1]);

        assert_eq!(from_le_bytes::<u32>(&bytes[..4]), 0x0102_0304);
        assert_eq!(from_le_bytes::<f64>(&bytes[4..]), -1.5);
    }
}
