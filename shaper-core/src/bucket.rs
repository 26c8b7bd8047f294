use crate::{Budget, Packet};
use std::collections::VecDeque;

/// A capacity-bounded FIFO of packets: the data bucket of the shapers.
///
/// The capacity is counted in packets for all four models. A capacity of
/// `0` is valid: every packet offered is refused.
#[derive(Debug, Clone)]
pub struct Bucket {
    queue: VecDeque<Packet>,
    capacity: u64,
}

impl Bucket {
    pub fn new(capacity: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.len() as u64 >= self.capacity
    }

    #[inline]
    pub fn front(&self) -> Option<&Packet> {
        self.queue.front()
    }

    /// append the `packet` at the end of the bucket.
    ///
    /// If the bucket is full the packet is handed back in the `Err`
    /// so the caller can account for the drop.
    pub fn offer(&mut self, packet: Packet) -> Result<(), Packet> {
        if self.is_full() {
            Err(packet)
        } else {
            self.queue.push_back(packet);
            Ok(())
        }
    }

    pub fn pop_front(&mut self) -> Option<Packet> {
        self.queue.pop_front()
    }

    /// transmit packets from the head of the bucket for as long as the
    /// `budget` covers the head packet.
    ///
    /// Each transmitted packet is consumed from the budget and passed to
    /// `transmit`. Stops at the first packet the budget does not cover,
    /// even if a later (smaller) packet would fit: the order is strictly
    /// FIFO.
    ///
    /// Returns the number of packets transmitted.
    pub fn drain<B, F>(&mut self, budget: &mut B, mut transmit: F) -> usize
    where
        B: Budget + ?Sized,
        F: FnMut(Packet),
    {
        let mut count = 0;
        while let Some(head) = self.queue.front() {
            if !budget.covers(head) {
                break;
            }
            budget.consume(head);

            if let Some(packet) = self.queue.pop_front() {
                transmit(packet);
                count += 1;
            }
        }
        count
    }
}
