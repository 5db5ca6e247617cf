//! Grid element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a grid cell.
///
/// Bounds the types usable as cell values: images and response planes are
/// `f32`/`f64`, label maps are unsigned integers.
pub trait GridElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert an f64 into this type, if representable
    fn from_f64(value: f64) -> Option<Self> {
        NumCast::from(value)
    }
}

macro_rules! impl_grid_element {
    ($($t:ty),*) => {
        $(impl GridElement for $t {})*
    };
}

impl_grid_element!(u8, u16, u32, i32, f32, f64);
