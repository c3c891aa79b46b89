//! Exchange-id → order directory
//!
//! Bucketed hash table sized far above the expected order count.
//! Insertion prepends to the bucket's singly linked list with a
//! CAS loop on the head; lookup and enumeration traverse after an
//! acquire load. Removal is not supported — orders are retained for
//! audit — which is what makes plain pointer traversal sound: a
//! node published to a bucket is never freed until the directory
//! itself is dropped.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;
use types::ids::ExchangeId;
use types::order::Order;

/// Number of buckets. Power of two.
const BUCKETS: usize = 1 << 20;

struct Node {
    order: Arc<Order>,
    next: *mut Node,
}

/// Lock-free map of [`ExchangeId`] → [`Order`].
pub struct OrderDirectory {
    buckets: Box<[AtomicPtr<Node>]>,
}

// Nodes are reachable from multiple threads but only ever read after
// publication; the raw pointers are owned by the directory.
unsafe impl Send for OrderDirectory {}
unsafe impl Sync for OrderDirectory {}

impl OrderDirectory {
    pub fn new() -> Self {
        Self {
            buckets: (0..BUCKETS).map(|_| AtomicPtr::new(ptr::null_mut())).collect(),
        }
    }

    fn bucket_of(exchange_id: ExchangeId) -> usize {
        exchange_id.raw() as usize & (BUCKETS - 1)
    }

    /// Publish an order. Ids are unique, so at most one entry per id
    /// ever exists.
    pub fn insert(&self, order: Arc<Order>) {
        let bucket = &self.buckets[Self::bucket_of(order.exchange_id())];
        let node = Box::into_raw(Box::new(Node {
            order,
            next: ptr::null_mut(),
        }));
        let mut head = bucket.load(Ordering::Acquire);
        loop {
            // node is unpublished until the CAS succeeds
            unsafe { (*node).next = head };
            match bucket.compare_exchange_weak(head, node, Ordering::Release, Ordering::Acquire) {
                Ok(_) => return,
                Err(current) => head = current,
            }
        }
    }

    /// Look up the identity object for an exchange id.
    pub fn get(&self, exchange_id: ExchangeId) -> Option<Arc<Order>> {
        let mut cursor = self.buckets[Self::bucket_of(exchange_id)].load(Ordering::Acquire);
        while !cursor.is_null() {
            // published nodes are immutable and never freed while
            // the directory is alive
            let node = unsafe { &*cursor };
            if node.order.exchange_id() == exchange_id {
                return Some(node.order.clone());
            }
            cursor = node.next;
        }
        None
    }

    /// Enumerate every retained order, unordered. The snapshot is
    /// consistent per bucket: entries inserted after the head load
    /// are not seen.
    pub fn all(&self) -> Vec<Arc<Order>> {
        let mut orders = Vec::new();
        for bucket in self.buckets.iter() {
            let mut cursor = bucket.load(Ordering::Acquire);
            while !cursor.is_null() {
                let node = unsafe { &*cursor };
                orders.push(node.order.clone());
                cursor = node.next;
            }
        }
        orders
    }
}

impl Default for OrderDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OrderDirectory {
    fn drop(&mut self) {
        for bucket in self.buckets.iter() {
            let mut cursor = bucket.swap(ptr::null_mut(), Ordering::Acquire);
            while !cursor.is_null() {
                // exclusive access: &mut self guarantees no reader
                let node = unsafe { Box::from_raw(cursor) };
                cursor = node.next;
            }
        }
    }
}
