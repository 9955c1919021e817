
use std::sync::Arc;

/// A persistent, prepend-only singly-linked list.
/// Cloning is O(1) and clones share every existing node, so branches of a search can each extend their own history without copying.
#[derive(Debug)]
pub struct LinkedHistory<T> {
    /// Most recently added node
    head: Option<Arc<Node<T>>>,
    /// Number of values reachable from `head`
    len: usize
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    next: Option<Arc<Node<T>>>
}

impl<T> LinkedHistory<T> {
    /// Creates an empty history
    pub fn new() -> Self {
        Self {
            head: None,
            len: 0
        }
    }

    /// Returns a new list with `value` in front of everything in this one; `self` is unchanged
    pub fn prepend(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Node {
                value,
                next: self.head.clone()
            })),
            len: self.len + 1
        }
    }

    /// The most recently added value
    pub fn front(&self) -> Option<&T> {
        self.head.as_deref().map(|n| &n.value)
    }

    /// Iterates from the most recently added value to the oldest
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            current: self.head.as_deref()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: Clone> LinkedHistory<T> {
    /// Copies the values out in the order they were added
    pub fn to_vec_oldest_first(&self) -> Vec<T> {
        let mut values: Vec<T> = self.iter().cloned().collect();
        values.reverse();
        values
    }
}

impl<T> Default for LinkedHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for LinkedHistory<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len
        }
    }
}

impl<T> Drop for LinkedHistory<T> {
    // unlinks iteratively, a long uniquely-owned chain would otherwise recurse once per node
    fn drop(&mut self) {
        let mut current = self.head.take();
        while let Some(node) = current {
            match Arc::try_unwrap(node) {
                Ok(mut n) => current = n.next.take(),
                Err(_) => break
            }
        }
    }
}

pub struct Iter<'a, T> {
    current: Option<&'a Node<T>>
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.map(|node| {
            self.current = node.next.as_deref();
            &node.value
        })
    }
}
