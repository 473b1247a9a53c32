use std::{
    collections::VecDeque,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    num::Wrapping,
};

use bitvec::prelude::*;

/// Stable identity of an object in a [`HandlePool`].
///
/// The serial changes every time a slot is reused, so a handle to a removed object never
/// resolves to whatever took its place.
pub struct Handle<T> {
    index: u32,
    serial: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn index_usize(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn serial(&self) -> u32 {
        self.serial
    }
}

// Manual impls so handles stay Copy and hashable whatever T is
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.serial == other.serial
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.serial.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("serial", &self.serial)
            .finish()
    }
}

/// Slot storage handing out generational [`Handle`]s
#[derive(Debug, Clone)]
pub struct HandlePool<T>
where
    T: Default,
{
    data: Vec<T>,
    serials: Vec<Wrapping<u32>>,
    free_list: VecDeque<u32>,
    is_active: BitVec,
}

impl<T> Default for HandlePool<T>
where
    T: Default,
{
    fn default() -> Self {
        Self {
            data: Vec::new(),
            serials: Vec::new(),
            free_list: VecDeque::new(),
            is_active: BitVec::new(),
        }
    }
}

impl<T> HandlePool<T>
where
    T: Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every object. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        for i in 0..self.data.len() {
            if self.is_active[i] {
                self.data[i] = T::default();
                self.serials[i] += Wrapping(1);
                self.is_active.set(i, false);
                self.free_list.push_back(i as u32);
            }
        }
    }

    /// Number of live objects
    #[inline]
    pub fn len(&self) -> usize {
        self.is_active.count_ones()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
        self.serials.reserve(additional);
    }

    #[inline]
    pub fn is_handle_valid(&self, handle: &Handle<T>) -> bool {
        let index_usize = handle.index_usize();
        if index_usize >= self.data.len() {
            return false;
        }
        self.is_active[index_usize] && self.serials[index_usize].0 == handle.serial()
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        let free_pos = match self.free_list.pop_front() {
            Some(free_pos) => free_pos,
            None => {
                assert!(
                    self.data.len() < u32::MAX as usize,
                    "Max Possible Capacity Reached"
                );
                let free_pos = self.data.len() as u32;
                self.data.push(Default::default());
                self.serials.push(Default::default());
                self.is_active.push(false);
                free_pos
            }
        };
        let free_pos_usize = free_pos as usize;

        self.data[free_pos_usize] = value;
        self.is_active.set(free_pos_usize, true);

        Handle {
            index: free_pos,
            serial: self.serials[free_pos_usize].0,
            marker: PhantomData,
        }
    }

    /// Take an object out of the pool. `None` if the handle is stale.
    pub fn remove(&mut self, handle: &Handle<T>) -> Option<T> {
        if !self.is_handle_valid(handle) {
            return None;
        }

        let index_usize = handle.index_usize();
        let value = std::mem::take(&mut self.data[index_usize]);

        self.serials[index_usize] += Wrapping(1);
        self.is_active.set(index_usize, false);
        self.free_list.push_back(handle.index());

        Some(value)
    }

    pub fn get(&self, handle: &Handle<T>) -> Option<&T> {
        if !self.is_handle_valid(handle) {
            return None;
        }
        Some(&self.data[handle.index_usize()])
    }

    pub fn get_mut(&mut self, handle: &Handle<T>) -> Option<&mut T> {
        if !self.is_handle_valid(handle) {
            return None;
        }
        Some(&mut self.data[handle.index_usize()])
    }

    /// Live objects with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.is_active.iter_ones().map(move |i| {
            (
                Handle {
                    index: i as u32,
                    serial: self.serials[i].0,
                    marker: PhantomData,
                },
                &self.data[i],
            )
        })
    }
}
