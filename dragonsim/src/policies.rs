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

//! # Import and Export Policies
//!
//! This module contains the policy pipeline of a BGP session. Every path received from a peer
//! first passes the import filter, and is then transformed by the import action. Before a selected
//! path is advertised to a peer, it must pass the export filter, and is then transformed by the
//! export action.
//!
//! Route maps without set actions act as filters: a `deny` map rejects all paths it matches, and
//! an `allow` map rejects all paths it does not match. Route maps with set actions never reject a
//! path. They only transform the paths they match.

use crate::{
    bgp::Path,
    network::World,
    route_map::RouteMapList,
    router::Router,
    types::{Ipv4Prefix, RouterId},
};

use log::*;

impl Router {
    /// Returns `true` if the path received from `pid` may be imported.
    pub(crate) fn import_filter(&self, pid: RouterId, prefix: &Ipv4Prefix, path: &Path) -> bool {
        let Some(peer) = self.peers.get(&pid) else {
            return false;
        };
        if peer.session.is_ebgp() && path.as_path.contains(&self.as_id) {
            trace!(
                "{} rejects {} from {}: AS path loop",
                self.name,
                prefix,
                peer.name
            );
            return false;
        }
        if peer.maps_in.iter().rejects(prefix, path) {
            trace!(
                "{} rejects {} from {}: route map",
                self.name,
                prefix,
                peer.name
            );
            return false;
        }
        true
    }

    /// Build the path that is stored in the adjacency-in table of `pid`.
    pub(crate) fn import_action(
        &self,
        pid: RouterId,
        prefix: &Ipv4Prefix,
        mut path: Path,
        w: &World,
    ) -> Path {
        let Some(peer) = self.peers.get(&pid) else {
            return path;
        };
        if peer.session.is_ebgp() {
            path.weight = w.params.default_weight;
            path.next_hop = pid;
            path.local_pref = Some(w.params.default_local_pref);
            path.igp_cost = Some(0);
            if path.as_path.first() != Some(&peer.remote_as) {
                path.as_path.insert(0, peer.remote_as);
            }
        } else {
            path.igp_cost = Some(w.link_cost(self.router_id, pid) + path.igp_cost.unwrap_or(0));
            path.weight = w.params.default_weight;
        }
        path.source = Some(pid);
        peer.maps_in.iter().transform(prefix, path)
    }

    /// Returns `true` if the path may be advertised to `pid`.
    pub(crate) fn export_filter(
        &self,
        pid: RouterId,
        prefix: &Ipv4Prefix,
        path: &Path,
        w: &World,
    ) -> bool {
        let Some(peer) = self.peers.get(&pid) else {
            return false;
        };
        if path.source == Some(pid) {
            trace!("{} does not send {} back to {}", self.name, prefix, peer.name);
            return false;
        }
        if peer.session.is_ebgp() {
            if path.as_path.first() == Some(&peer.remote_as) {
                trace!(
                    "{} does not send {} to {}: first hop is the peer AS",
                    self.name,
                    prefix,
                    peer.name
                );
                return false;
            }
            if w.params.sender_side_loop_detection && path.as_path.contains(&peer.remote_as) {
                trace!(
                    "{} does not send {} to {}: sender-side loop detection",
                    self.name,
                    prefix,
                    peer.name
                );
                return false;
            }
        } else if let Some(src) = path.source.and_then(|s| self.peers.get(&s)) {
            if src.session.is_ibgp() && !(self.route_reflector && (src.rr_client || peer.rr_client))
            {
                trace!(
                    "{} does not reflect {} from {} to {}",
                    self.name,
                    prefix,
                    src.name,
                    peer.name
                );
                return false;
            }
        }
        if peer.maps_out.iter().rejects(prefix, path) {
            trace!(
                "{} does not send {} to {}: route map",
                self.name,
                prefix,
                peer.name
            );
            return false;
        }
        true
    }

    /// Build the path that is advertised to `pid`.
    pub(crate) fn export_action(&self, pid: RouterId, prefix: &Ipv4Prefix, mut path: Path) -> Path {
        let Some(peer) = self.peers.get(&pid) else {
            return path;
        };
        if peer.session.is_ebgp() {
            path.local_pref = None;
            path.igp_cost = None;
            path.as_path.insert(0, self.as_id);
        }
        peer.maps_out.iter().transform(prefix, path)
    }
}
