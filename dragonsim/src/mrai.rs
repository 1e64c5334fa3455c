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

//! Module containing the MRAI (Minimum Route Advertisement Interval) timers of a router.

use crate::types::{secs, Ipv4Prefix, RouterId, Time};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Granularity of the MRAI timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MraiMode {
    /// One timer per peer gates all prefixes sent to that peer.
    #[default]
    PerPeer,
    /// One timer per peer and prefix.
    PerPrefix,
}

/// Key of a single MRAI timer. The prefix is only set for [`MraiMode::PerPrefix`].
pub type MraiKey = (RouterId, Option<Ipv4Prefix>);

/// Collection of all MRAI timers of a router. A timer is running until the simulation time is
/// strictly past its expiry. A timer that expires exactly now is still running until its expiry
/// event is processed.
#[derive(Debug, Clone, Default)]
pub struct MraiTimers {
    mode: MraiMode,
    timers: HashMap<MraiKey, Time>,
}

impl MraiTimers {
    /// Create an empty set of timers.
    pub fn new(mode: MraiMode) -> Self {
        Self {
            mode,
            timers: HashMap::new(),
        }
    }

    /// Get the mode of the timers.
    pub fn mode(&self) -> MraiMode {
        self.mode
    }

    /// Get the key of the timer that gates sending `prefix` to `peer`.
    pub fn key(&self, peer: RouterId, prefix: Ipv4Prefix) -> MraiKey {
        match self.mode {
            MraiMode::PerPeer => (peer, None),
            MraiMode::PerPrefix => (peer, Some(prefix)),
        }
    }

    /// Start the timer with the given interval (in seconds), unless it is still running. Returns
    /// the new expiry if the timer was started. Intervals that are not positive never start the
    /// timer.
    pub fn arm(&mut self, key: MraiKey, interval: f64, now: Time) -> Option<Time> {
        if interval <= 0.0 || self.expiry(key, now).is_some() {
            return None;
        }
        let expiry = now + secs(interval);
        self.timers.insert(key, expiry);
        Some(expiry)
    }

    /// Return the expiry of the timer, or `None` if the timer is not running. A timer whose
    /// expiry equals `now` is still running; only [`MraiTimers::expire`] stops it at that instant.
    pub fn expiry(&self, key: MraiKey, now: Time) -> Option<Time> {
        self.timers.get(&key).copied().filter(|t| *t >= now)
    }

    /// Stop the timer.
    pub fn reset(&mut self, key: MraiKey) {
        self.timers.remove(&key);
    }

    /// Stop the timer if it expires at or before `now`. Returns `false` if the timer is still
    /// running. This is the case if the expiry event is stale, as the timer was restarted after
    /// the event was scheduled.
    pub fn expire(&mut self, key: MraiKey, now: Time) -> bool {
        match self.timers.get(&key) {
            Some(t) if *t > now => false,
            _ => {
                self.reset(key);
                true
            }
        }
    }
}

/// Compute the MRAI interval from the base value. With jitter, the interval is drawn uniformly
/// from `[0.75 * base, base)`.
pub fn mrai_interval<R: Rng>(base: f64, jitter: bool, rng: &mut R) -> f64 {
    if jitter {
        base * (3.0 + rng.gen::<f64>()) / 4.0
    } else {
        base
    }
}

/// Random initial wait before the first update is sent, drawn uniformly from `[0, base)`.
pub fn random_wait<R: Rng>(base: f64, rng: &mut R) -> f64 {
    base * rng.gen::<f64>()
}
