//! Allocation helpers used by the parser and interpreter.
//!
//! Every helper takes an [`Allocator`] capability: either a borrowed arena
//! from a checked-out pool slot, or the ordinary heap. Results borrow the
//! arena, so nothing allocated through a guard can outlive its release.
//! The helpers never free memory themselves; arenas are freed in bulk by
//! the pool.

use std::ops::{Deref, DerefMut};

use bumpalo::Bump;

type BumpVec<'a, T> = bumpalo::collections::Vec<'a, T>;
type BumpBox<'a, T> = bumpalo::boxed::Box<'a, T>;

/// Where an allocation helper takes its memory from.
#[derive(Debug, Clone, Copy)]
pub enum Allocator<'a> {
    /// Allocate from a bump arena that is freed as a whole.
    Arena(&'a Bump),
    /// Allocate from the global heap.
    Heap,
}

impl<'a> Allocator<'a> {
    /// Whether this allocator hands out arena memory.
    #[must_use]
    pub fn is_arena(self) -> bool {
        matches!(self, Self::Arena(_))
    }

    /// Make a sequence of `len` default values with room for `cap` elements.
    ///
    /// `cap` must be at least `len`.
    #[must_use]
    pub fn make_slice<T: Default>(self, len: usize, cap: usize) -> Seq<'a, T> {
        debug_assert!(cap >= len, "capacity {cap} is smaller than length {len}");
        let mut seq = Seq::with_capacity_in(self, cap.max(len));
        seq.extend(std::iter::repeat_with(T::default).take(len));
        seq
    }

    /// Append `values` to `seq`.
    ///
    /// Extends in place when the existing capacity suffices. Otherwise moves
    /// everything into a new store of twice the combined length, taken from
    /// this allocator.
    #[must_use]
    pub fn append<T, I>(self, mut seq: Seq<'a, T>, values: I) -> Seq<'a, T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        let target = seq.len() + values.len();
        if target <= seq.capacity() {
            seq.extend(values);
            return seq;
        }
        let mut grown = Seq::with_capacity_in(self, target * 2);
        grown.extend_from(seq);
        grown.extend(values);
        grown
    }

    /// Allocate a single default-valued object.
    #[must_use]
    pub fn new_object<T: Default>(self) -> Obj<'a, T> {
        match self {
            Self::Arena(bump) => Obj::Arena(BumpBox::new_in(T::default(), bump)),
            Self::Heap => Obj::Heap(Box::default()),
        }
    }
}

/// Make a sequence through `alloc`. See [`Allocator::make_slice`].
#[must_use]
pub fn make_slice<T: Default>(alloc: Allocator<'_>, len: usize, cap: usize) -> Seq<'_, T> {
    alloc.make_slice(len, cap)
}

/// Append to a sequence through `alloc`. See [`Allocator::append`].
#[must_use]
pub fn append<'a, T, I>(alloc: Allocator<'a>, seq: Seq<'a, T>, values: I) -> Seq<'a, T>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator,
{
    alloc.append(seq, values)
}

/// Allocate one object through `alloc`. See [`Allocator::new_object`].
#[must_use]
pub fn new_object<T: Default>(alloc: Allocator<'_>) -> Obj<'_, T> {
    alloc.new_object()
}

/// Growable sequence backed by either the heap or an arena.
#[derive(Debug)]
pub enum Seq<'a, T> {
    /// Heap-backed storage.
    Heap(Vec<T>),
    /// Arena-backed storage.
    Arena(BumpVec<'a, T>),
}

impl<'a, T> Seq<'a, T> {
    fn with_capacity_in(alloc: Allocator<'a>, cap: usize) -> Self {
        match alloc {
            Allocator::Arena(bump) => Self::Arena(BumpVec::with_capacity_in(cap, bump)),
            Allocator::Heap => Self::Heap(Vec::with_capacity(cap)),
        }
    }

    /// Number of elements the current storage holds without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match self {
            Self::Heap(v) => v.capacity(),
            Self::Arena(v) => v.capacity(),
        }
    }

    /// Whether the storage lives in an arena.
    #[must_use]
    pub fn is_arena_backed(&self) -> bool {
        matches!(self, Self::Arena(_))
    }

    /// Copy the elements into a plain `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.as_slice().to_vec()
    }

    /// View the elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Heap(v) => &v[..],
            Self::Arena(v) => &v[..],
        }
    }

    fn extend(&mut self, values: impl IntoIterator<Item = T>) {
        match self {
            Self::Heap(v) => v.extend(values),
            Self::Arena(v) => v.extend(values),
        }
    }

    fn extend_from(&mut self, other: Seq<'_, T>) {
        match other {
            Seq::Heap(v) => self.extend(v),
            Seq::Arena(v) => self.extend(v),
        }
    }
}

impl<T> Deref for Seq<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Seq<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self {
            Self::Heap(v) => &mut v[..],
            Self::Arena(v) => &mut v[..],
        }
    }
}

impl<T> Default for Seq<'_, T> {
    /// An empty heap sequence, which does not allocate.
    fn default() -> Self {
        Self::Heap(Vec::new())
    }
}

impl<T> From<Vec<T>> for Seq<'_, T> {
    fn from(v: Vec<T>) -> Self {
        Self::Heap(v)
    }
}

/// Single object backed by either the heap or an arena.
#[derive(Debug)]
pub enum Obj<'a, T> {
    /// Heap-backed object.
    Heap(Box<T>),
    /// Arena-backed object.
    Arena(BumpBox<'a, T>),
}

impl<T> Obj<'_, T> {
    /// Whether the object lives in an arena.
    #[must_use]
    pub fn is_arena_backed(&self) -> bool {
        matches!(self, Self::Arena(_))
    }
}

impl<T> Deref for Obj<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Self::Heap(b) => &**b,
            Self::Arena(b) => &**b,
        }
    }
}

impl<T> DerefMut for Obj<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            Self::Heap(b) => &mut **b,
            Self::Arena(b) => &mut **b,
        }
    }
}
