// DragonSim: BGP Network Simulator with DRAGON route aggregation written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module containing the definitions for the event queue.

use crate::types::Time;

use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};
use std::{cmp::Reverse, collections::HashMap};

use super::Event;

/// Priority of a scheduled event: the earliest time first, then the lowest sequence number.
type Priority = (Reverse<Time>, Reverse<u64>);

/// Global event queue. Events are popped in the order of their time. Events scheduled for the
/// same time are popped in the order in which they were scheduled. There is no way to cancel an
/// event; handlers must check whether the event is still relevant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    q: PriorityQueue<u64, Priority>,
    events: HashMap<u64, Event>,
    next_seq: u64,
}

impl EventQueue {
    /// Create a new empty event queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a new event at the given time.
    pub fn schedule(&mut self, time: Time, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.insert(seq, event);
        self.q.push(seq, (Reverse(time), Reverse(seq)));
    }

    /// Pop the next event, together with its time.
    pub fn pop(&mut self) -> Option<(Time, Event)> {
        let (seq, (Reverse(time), _)) = self.q.pop()?;
        self.events.remove(&seq).map(|e| (time, e))
    }

    /// Peek at the time of the next event.
    pub fn peek_time(&self) -> Option<Time> {
        self.q.peek().map(|(_, (Reverse(t), _))| *t)
    }

    /// Get the number of enqueued events
    pub fn len(&self) -> usize {
        self.q.len()
    }

    /// Return `True` if no event is enqueued.
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// Remove all events from the queue.
    pub fn clear(&mut self) {
        self.q.clear();
        self.events.clear();
    }
}
