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

//! This module contains all types and traits needed to build and run a simulation.

pub use crate::bgp::{Path, Relationship, SessionType, Update};
pub use crate::config::{EventKind, SimConfig, SimParams};
pub use crate::dragon::ConsistencyMode;
pub use crate::event::{Delay, Event};
pub use crate::formatter::NetworkFormatter;
pub use crate::mrai::MraiMode;
pub use crate::network::Network;
pub use crate::route_map::{RouteMap, RouteMapBuilder};
pub use crate::types::{
    AsId, ConfigError, Ipv4Prefix, NetworkError, RouteClass, RouterId, Time,
};
