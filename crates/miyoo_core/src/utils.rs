pub trait BitOps {
    type Output;
    /// Return the bits in the specified range.
    /// Will be optimised by the compiler to a simple `shift` and `and`.
    ///
    /// ```ignore
    ///
    /// // Get the green channel of a BGR15 colour, bits 5..=9
    /// let value = 0x7FFFu16.get_bits(5, 9);
    ///
    /// assert_eq!(value, 0x1F);
    /// ```
    fn get_bits(self, begin: u8, end_inclusive: u8) -> Self::Output;
}

macro_rules! impl_bitops {
    ($($t:ty),*) => {
        $(
            impl BitOps for $t {
                type Output = $t;

                #[inline(always)]
                fn get_bits(self, begin: u8, end_inclusive: u8) -> $t {
                    (self >> begin) & ((1 << (end_inclusive - begin + 1)) - 1)
                }
            }
        )*
    };
}

impl_bitops!(u16);
