//! Numeric casts between column element types.
//!
//! Casts follow `as` semantics: float to int truncates toward zero and
//! saturates, narrowing integer casts wrap.

pub trait CastInto<T>: Copy {
    fn cast(self) -> T;
}

macro_rules! impl_cast {
    (@to $from:ty: $($to:ty),*) => {
        $(impl CastInto<$to> for $from {
            #[inline]
            fn cast(self) -> $to {
                self as $to
            }
        })*
    };
    ($($from:ty),*) => {
        $(impl_cast!(@to $from: i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);)*
    };
}

impl_cast!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Element-wise cast of a slice.
pub fn cast_slice<F: CastInto<T>, T>(from: &[F]) -> Vec<T> {
    from.iter().map(|v| v.cast()).collect()
}
