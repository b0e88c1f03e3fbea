//! Intrusive reference-counted handle.
//!
//! The count lives inside the referent, which also decides whether reaching
//! zero destroys it. That lets one handle type share values (always
//! self-destroying) and object elements (either owned by the host, with no-op
//! counting, or owned by the runtime).
//!
//! Counting is non-atomic; handles are neither `Send` nor `Sync`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// Reference-count hooks implemented by every handle referent.
pub trait RefCounted {
    fn add_ref(&self);

    /// Drops one reference. Returns `true` when the referent should now be destroyed.
    fn release(&self) -> bool;

    fn ref_count(&self) -> u32;
}

/// Shared ownership of a [`RefCounted`] referent.
///
/// Cloning increments the count, dropping decrements it. Moving a handle
/// leaves the count alone. A null handle is `Option<Handle<T>>`.
pub struct Handle<T: ?Sized + RefCounted> {
    ptr: NonNull<T>,
    // Whether the allocation came from a Box we may free
    owned: bool,
    _marker: PhantomData<T>,
}

impl<T: RefCounted> Handle<T> {
    pub fn new(referent: T) -> Self {
        Self::from_box(Box::new(referent))
    }
}

impl<T: ?Sized + RefCounted> Handle<T> {
    /// Takes a heap referent; it is freed when its `release` says so.
    pub fn from_box(referent: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(referent));
        // SAFETY: ptr was just produced from a live Box.
        unsafe { ptr.as_ref() }.add_ref();
        Self {
            ptr,
            owned: true,
            _marker: PhantomData,
        }
    }

    /// Wraps a referent that outlives every handle; it is never freed through a handle.
    pub fn from_static(referent: &'static T) -> Self {
        referent.add_ref();
        Self {
            ptr: NonNull::from(referent),
            owned: false,
            _marker: PhantomData,
        }
    }

    /// Whether both handles point at the same referent.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.ptr.as_ptr() as *const () == other.ptr.as_ptr() as *const ()
    }

    pub fn use_count(this: &Self) -> u32 {
        this.ref_count()
    }

    /// Mutable access when this is the only handle to an owned referent.
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        if this.owned && this.ref_count() == 1 {
            // SAFETY: the referent is heap-owned and this handle holds the only
            // reference; the `&mut self` borrow excludes any other access.
            Some(unsafe { this.ptr.as_mut() })
        } else {
            None
        }
    }

    pub fn as_ptr(this: &Self) -> *const T {
        this.ptr.as_ptr()
    }
}

impl<T: ?Sized + RefCounted> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the referent stays alive while this handle holds a reference.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized + RefCounted> Clone for Handle<T> {
    fn clone(&self) -> Self {
        self.add_ref();
        Self {
            ptr: self.ptr,
            owned: self.owned,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized + RefCounted> Drop for Handle<T> {
    fn drop(&mut self) {
        // SAFETY: this handle still holds its reference, so the referent is alive.
        let destroy = unsafe { self.ptr.as_ref() }.release();
        if destroy && self.owned {
            // SAFETY: owned pointers come from Box::leak in from_box, and the
            // referent reported that no other reference remains.
            drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
        }
    }
}

impl<T: ?Sized + RefCounted> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T: ?Sized + RefCounted> Eq for Handle<T> {}

impl<T: ?Sized + RefCounted> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.ptr.as_ptr() as *const ()).hash(state);
    }
}

impl<T: ?Sized + RefCounted + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized + RefCounted + fmt::Display> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
