//! Parallel iteration that degrades to sequential iteration.
//!
//! With the `parallel` feature this is rayon's prelude. Without it,
//! `into_par_iter()` is a plain `into_iter()`, so per-row pipelines such as
//! `(0..rows).into_par_iter().flat_map(..).collect()` compile unchanged and
//! produce the same output in the same order.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::iter::IntoParallelIterator`
    pub trait IntoParallelIterator {
        type Iter: Iterator<Item = Self::Item>;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
