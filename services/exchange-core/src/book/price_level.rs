//! Price level with FIFO queue
//!
//! One price's queue of resting orders, kept in submission order to
//! enforce time priority. The queue is a doubly linked list whose
//! nodes live in a slab arena owned by the level; an order carries
//! its slot index as an opaque handle, which makes both push-back
//! and removal O(1). Freed slots are reused.

use std::sync::Arc;
use types::order::Order;
use types::price::Price;

const NIL: u32 = u32::MAX;

#[derive(Debug)]
struct Node {
    order: Option<Arc<Order>>,
    prev: u32,
    next: u32,
}

/// FIFO queue of the orders resting at one price.
#[derive(Debug)]
pub struct PriceLevel {
    price: Price,
    nodes: Vec<Node>,
    free: Vec<u32>,
    head: u32,
    tail: u32,
    len: usize,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of orders queued at this level.
    pub fn order_count(&self) -> usize {
        self.len
    }

    /// Append an order at the back of the queue (time priority) and
    /// attach its slot handle.
    pub fn push_back(&mut self, order: Arc<Order>) {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.nodes.push(Node {
                    order: None,
                    prev: NIL,
                    next: NIL,
                });
                (self.nodes.len() - 1) as u32
            }
        };
        order.attach(slot as u64);

        let node = &mut self.nodes[slot as usize];
        node.order = Some(order);
        node.prev = self.tail;
        node.next = NIL;

        if self.tail == NIL {
            self.head = slot;
        } else {
            self.nodes[self.tail as usize].next = slot;
        }
        self.tail = slot;
        self.len += 1;
    }

    /// Detach an order in O(1) via its slot handle.
    ///
    /// # Panics
    /// Panics if the order is not queued at this level; the book is
    /// unrecoverable at that point.
    pub fn remove(&mut self, order: &Order) {
        let slot = match order.list_slot() {
            Some(slot) => slot as u32,
            None => panic!(
                "order {} is not attached to any price level",
                order.exchange_id()
            ),
        };
        let node = &mut self.nodes[slot as usize];
        let queued = node.order.take();
        match queued {
            Some(queued) if queued.exchange_id() == order.exchange_id() => {}
            _ => panic!(
                "order {} slot handle does not match level {}",
                order.exchange_id(),
                self.price
            ),
        }
        let (prev, next) = (node.prev, node.next);
        node.prev = NIL;
        node.next = NIL;

        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }

        order.detach();
        self.free.push(slot);
        self.len -= 1;
    }

    /// Earliest-submitted order still resting, or `None`.
    pub fn front(&self) -> Option<&Arc<Order>> {
        if self.head == NIL {
            None
        } else {
            self.nodes[self.head as usize].order.as_ref()
        }
    }

    /// Iterate the queue in FIFO order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            level: self,
            cursor: self.head,
        }
    }
}

/// FIFO iterator over a level's queued orders.
pub struct Iter<'a> {
    level: &'a PriceLevel,
    cursor: u32,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Arc<Order>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.level.nodes[self.cursor as usize];
        self.cursor = node.next;
        node.order.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::ExchangeId;
    use types::order::Side;
    use types::price::FixedPrice;

    fn order(id: i64, qty: u64) -> Arc<Order> {
        Arc::new(Order::new(
            ExchangeId::new(id),
            "s1",
            "",
            "ACME",
            Side::Buy,
            Price::Limit("1.00".parse::<FixedPrice>().unwrap()),
            qty,
            false,
            0,
        ))
    }

    #[test]
    fn test_push_back_fifo_order() {
        let mut level = PriceLevel::new(Price::Limit("1.00".parse().unwrap()));
        let (o1, o2, o3) = (order(1, 10), order(2, 20), order(3, 30));
        level.push_back(o1.clone());
        level.push_back(o2.clone());
        level.push_back(o3.clone());

        assert_eq!(level.order_count(), 3);
        assert_eq!(level.front().unwrap().exchange_id(), o1.exchange_id());
        let ids: Vec<i64> = level.iter().map(|o| o.exchange_id().raw()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut level = PriceLevel::new(Price::Limit("1.00".parse().unwrap()));
        let (o1, o2, o3) = (order(1, 10), order(2, 20), order(3, 30));
        level.push_back(o1.clone());
        level.push_back(o2.clone());
        level.push_back(o3.clone());

        level.remove(&o2);
        assert!(!o2.is_listed());
        let ids: Vec<i64> = level.iter().map(|o| o.exchange_id().raw()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut level = PriceLevel::new(Price::Limit("1.00".parse().unwrap()));
        let (o1, o2, o3) = (order(1, 10), order(2, 20), order(3, 30));
        level.push_back(o1.clone());
        level.push_back(o2.clone());
        level.push_back(o3.clone());

        level.remove(&o1);
        assert_eq!(level.front().unwrap().exchange_id().raw(), 2);
        level.remove(&o3);
        assert_eq!(level.order_count(), 1);
        level.remove(&o2);
        assert!(level.is_empty());
        assert!(level.front().is_none());
    }

    #[test]
    fn test_slot_reuse_after_remove() {
        let mut level = PriceLevel::new(Price::Limit("1.00".parse().unwrap()));
        let o1 = order(1, 10);
        level.push_back(o1.clone());
        level.remove(&o1);

        let o2 = order(2, 20);
        level.push_back(o2.clone());
        // freed slot reused, arena does not grow
        assert_eq!(level.nodes.len(), 1);
        assert_eq!(level.front().unwrap().exchange_id().raw(), 2);
    }

    #[test]
    #[should_panic(expected = "not attached")]
    fn test_remove_detached_panics() {
        let mut level = PriceLevel::new(Price::Limit("1.00".parse().unwrap()));
        let o1 = order(1, 10);
        level.remove(&o1);
    }
}
