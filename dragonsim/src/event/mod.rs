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

//! Module for defining events

use serde::{Deserialize, Serialize};

mod delay;
mod queue;
pub use delay::{parse_bandwidth, seeded_rng, Delay};
pub use queue::EventQueue;

use crate::{
    bgp::Update,
    types::{Ipv4Prefix, RouterId},
};

/// Event to handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Stop the simulation. All remaining events are discarded.
    Terminate,
    /// The MRAI timer of `router` towards `peer` expired. In per-prefix mode, `prefix` names the
    /// timer.
    MraiExpire {
        /// Router that owns the timer
        router: RouterId,
        /// Peer towards which the timer gates sending
        peer: RouterId,
        /// Prefix of the timer, if the router uses per-prefix timers.
        prefix: Option<Ipv4Prefix>,
    },
    /// Run the decision process of `router` for `prefix`.
    DecisionProcess {
        /// The router
        router: RouterId,
        /// The prefix
        prefix: Ipv4Prefix,
    },
    /// Router `to` receives an update from `from`.
    Receive {
        /// Sender of the update
        from: RouterId,
        /// Receiver of the update
        to: RouterId,
        /// The update message
        update: Update,
    },
    /// The link between the two routers goes down.
    LinkDown(RouterId, RouterId),
    /// The link between the two routers comes back up.
    LinkUp(RouterId, RouterId),
    /// The router starts originating the prefix.
    Announce {
        /// The router
        router: RouterId,
        /// The prefix
        prefix: Ipv4Prefix,
    },
    /// The router stops originating the prefix.
    Withdraw {
        /// The router
        router: RouterId,
        /// The prefix
        prefix: Ipv4Prefix,
    },
    /// Log the RIB of every router.
    ShowAllRibs,
    /// Reset the sent-update counters of all routers.
    ResetCounters,
    /// Use the actual route class of the children when computing local announcements.
    ActivateDeaggregates,
    /// Store a snapshot of the sent-update counters.
    SnapshotUpdates,
    /// Enable all debug output.
    ActivateDebug,
    /// Start measuring the convergence time.
    StartTrackTime,
    /// Stop measuring the convergence time, and record the measurement under the label.
    StopTrackTime(String),
}

impl Event {
    /// Returns the prefix for which this event talks about.
    pub fn prefix(&self) -> Option<Ipv4Prefix> {
        match self {
            Event::MraiExpire { prefix, .. } => *prefix,
            Event::DecisionProcess { prefix, .. }
            | Event::Announce { prefix, .. }
            | Event::Withdraw { prefix, .. } => Some(*prefix),
            Event::Receive { update, .. } => Some(update.prefix),
            _ => None,
        }
    }

    /// Return the router where the event is processed, if the event concerns a single router.
    pub fn router(&self) -> Option<RouterId> {
        match self {
            Event::MraiExpire { router, .. }
            | Event::DecisionProcess { router, .. }
            | Event::Announce { router, .. }
            | Event::Withdraw { router, .. } => Some(*router),
            Event::Receive { to, .. } => Some(*to),
            _ => None,
        }
    }

    /// Returns `true` if the event is part of the convergence process of the routing protocol,
    /// as opposed to a control event for the simulation itself.
    pub fn is_protocol_event(&self) -> bool {
        matches!(
            self,
            Event::MraiExpire { .. }
                | Event::DecisionProcess { .. }
                | Event::Receive { .. }
                | Event::LinkDown(..)
                | Event::LinkUp(..)
                | Event::Announce { .. }
                | Event::Withdraw { .. }
        )
    }
}
