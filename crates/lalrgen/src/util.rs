use std::fmt;

pub fn display_fn<F>(f: F) -> impl fmt::Display
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    struct DisplayFn<F> {
        f: F,
    }
    impl<F> fmt::Display for DisplayFn<F>
    where
        F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
    {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            (self.f)(formatter)
        }
    }
    DisplayFn { f }
}

/// Borrow two distinct elements of a slice mutably at once.
pub fn get_two_mut<T>(slice: &mut [T], x: usize, y: usize) -> (&mut T, &mut T) {
    assert!(
        x != y && x.max(y) < slice.len(),
        "index condition not satisfied"
    );
    if x < y {
        let (a, b) = slice.split_at_mut(y);
        (&mut a[x], &mut b[0])
    } else {
        let (a, b) = slice.split_at_mut(x);
        (&mut b[0], &mut a[y])
    }
}
