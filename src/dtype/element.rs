//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::Pod;
use std::fmt::Debug;

/// Trait for types that can be stored in a tensor buffer
///
/// `Pod` lets host views reinterpret raw buffer bytes as `[Self]` without
/// copying.
pub trait Element: Copy + Send + Sync + Pod + Debug + PartialEq + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;
            }
        )*
    };
}

impl_element! {
    f64 => F64,
    f32 => F32,
    i64 => I64,
    i32 => I32,
    i16 => I16,
    i8 => I8,
    u64 => U64,
    u32 => U32,
    u16 => U16,
    u8 => U8,
}

#[cfg(feature = "f16")]
impl_element! {
    half::f16 => F16,
    half::bf16 => BF16,
}

// Note: bool doesn't implement Pod. Boolean values use u8 storage with DType::Bool.
