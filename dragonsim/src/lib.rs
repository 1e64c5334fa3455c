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

#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # DragonSim
//!
//! This is a library for simulating BGP on AS-level topologies, extended with DRAGON, a
//! distributed route aggregation algorithm. DRAGON lets routers stop propagating a more-specific
//! prefix whenever doing so does not change the route (or forwarding) decisions of the routers
//! further away, which reduces both the routing table size and the number of updates.
//!
//! ## Main Concepts
//!
//! The [`network::Network`] is the main datastructure to operate on. It is built from a
//! [`config::SimConfig`], which can be loaded from the router-config text language, from JSON,
//! or generated with the [`builder`] from an AS-level topology with business relationships.
//! The network owns all [`router::Router`]s and a [`network::World`] that stores everything
//! routers share: the clock, the event queue, the links (on a
//! [Petgraph](https://docs.rs/petgraph/latest/petgraph/index.html) graph), the parameters, and
//! the registry of allocated prefixes.
//!
//! BGP is simulated as a discrete-event system. Every message, decision process and timer is an
//! [`event::Event`] in a single queue ordered by time. Link and processing delays are sampled
//! from seeded distributions (see [`event::Delay`]), such that every run is reproducible for a
//! given randomization key.
//!
//! ## DRAGON
//!
//! Each router tracks the route class (customer, peer or provider) of every prefix in its
//! [`aggregate::AggregateTree`]. A prefix is filtered when its nearest covering prefix in the
//! Loc-RIB is at least as good, following either route consistency or forwarding consistency
//! (see [`dragon::ConsistencyMode`]). Routers that own an allocated parent prefix de-aggregate it
//! when some children become unreachable, and routers may originate synthetic aggregates for
//! blocks that are entirely reachable through customers.
//!
//! ## Example usage
//!
//! ```
//! use dragonsim::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: SimConfig = "
//!         router bgp 1
//!          bgp router-id 1.1
//!          neighbor 2.1 remote-as 2 peer
//!          neighbor 3.1 remote-as 3 cust
//!         router bgp 2
//!          bgp router-id 2.1
//!          neighbor 1.1 remote-as 1 peer
//!          neighbor 3.1 remote-as 3 cust
//!         router bgp 3
//!          bgp router-id 3.1
//!          neighbor 1.1 remote-as 1 prov
//!          neighbor 2.1 remote-as 2 prov
//!         event announce-prefix 2.1 1.0.0.0/22 1
//!         event announce-prefix 3.1 1.0.0.0/24 2
//!     "
//!     .parse()?;
//!
//!     let mut net = Network::from_config(&config)?;
//!     net.run();
//!
//!     let child: Ipv4Prefix = "1.0.0.0/24".parse()?;
//!     for router in net.routers() {
//!         assert!(router.rib(&child).is_some());
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod bgp;
pub mod builder;
pub mod config;
pub mod dragon;
pub mod event;
pub mod formatter;
pub mod mrai;
pub mod network;
pub mod policies;
pub mod prelude;
pub mod route_map;
pub mod router;
pub mod types;

#[cfg(test)]
#[cfg(not(tarpaulin_include))]
mod test;
