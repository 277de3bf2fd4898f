/// Objects addressed by a display name (materials, constructions, surfaces).
pub trait HasName {
    fn name(&self) -> &str;

    /// Name-prefix match used to address layers inside a construction stack.
    fn name_starts_with(&self, prefix: &str) -> bool {
        self.name().starts_with(prefix)
    }
}

impl<T: HasName + ?Sized> HasName for &T {
    fn name(&self) -> &str {
        (*self).name()
    }
}

impl<T: HasName + ?Sized> HasName for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Sorting helpers for slices of `T: HasName`.
pub trait SortByName {
    /// Stable, ascending sort by `name()`.
    fn sort_by_name(&mut self);
}

impl<T: HasName> SortByName for [T] {
    fn sort_by_name(&mut self) {
        self.sort_by(|a, b| a.name().cmp(b.name()));
    }
}
