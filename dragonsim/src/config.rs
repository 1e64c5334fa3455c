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

//! # Network Configuration
//!
//! This module contains the configuration of a simulation: the global parameters ([`SimParams`]),
//! the routers with their BGP sessions, the links, the route maps, and the scheduled events. A
//! [`SimConfig`] can be read from JSON, or from the router configuration language:
//!
//! ```text
//! ! comment
//! router bgp 1
//!  bgp router-id 1.1
//!  neighbor 2.1 remote-as 2 cust
//!  neighbor 2.1 advertisement-interval 30
//!  neighbor 2.1 route-map from-cust in
//!
//! route-map from-cust permit 10
//!  match community-list 2:3 any
//!  set community 1
//!  set local-preference 100
//!
//! link 1.1 2.1 delay uniform 0.01 0.1
//! config always-compare-med
//! debug show-final-ribs
//! dragon mode forwarding
//! event announce-prefix 2.1 10.0.0.0/8 1
//! event terminate 1000
//! ```
//!
//! All `event` commands take the time (in seconds) as their last argument.

use crate::{
    bgp::Relationship,
    dragon::ConsistencyMode,
    event::{parse_bandwidth, Delay},
    mrai::MraiMode,
    route_map::{
        AsPathRegex, CommunityAction, CommunityMatch, RouteMap, RouteMapMatch, RouteMapSet,
        RouteMapState, DEFAULT_PRIORITY,
    },
    types::{AsId, ConfigError, Ipv4Prefix},
};

use log::*;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};

/// Parameters of the DRAGON extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragonParams {
    /// Enable DRAGON. Without it, routers run plain BGP.
    pub enabled: bool,
    /// Which consistency property is preserved when filtering.
    pub mode: ConsistencyMode,
    /// Only originate synthetic aggregates that are allocated prefixes without an allocated
    /// parent.
    pub restrict_to_parentless: bool,
    /// When computing the announcements of an own prefix, treat all children owned by other
    /// routers as reachable customers, so the prefix is never de-aggregated.
    pub disable_deaggregates: bool,
    /// Stubs neither compute aggregates nor receive any updates.
    pub stub_optimizations: bool,
}

impl Default for DragonParams {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ConsistencyMode::Route,
            restrict_to_parentless: true,
            disable_deaggregates: true,
            stub_optimizations: false,
        }
    }
}

/// Which messages are logged at `info` level instead of `debug`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Log the RIB entry after every decision process.
    pub update_ribs: bool,
    /// Log every received update.
    pub receive_events: bool,
    /// Log every sent update.
    pub send_events: bool,
    /// Log link failures and recoveries.
    pub link_events: bool,
    /// Log prefix announcements and withdrawals.
    pub announce_events: bool,
    /// Log the RIB of every router at the end of the simulation.
    pub final_ribs: bool,
    /// Log the decisions of DRAGON.
    pub dragon: bool,
}

impl DebugOptions {
    /// Enable all event messages.
    pub fn activate(&mut self) {
        self.send_events = true;
        self.link_events = true;
        self.announce_events = true;
        self.final_ribs = true;
        self.dragon = true;
    }
}

/// Global simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// DRAGON parameters
    pub dragon: DragonParams,
    /// Compare the MED of all paths, not only of those from the same neighboring AS.
    pub always_compare_med: bool,
    /// Do not send a path to an eBGP peer whose AS is already on the AS path.
    pub sender_side_loop_detection: bool,
    /// Start the MRAI timer also after sending only withdrawals.
    pub withdrawal_rate_limiting: bool,
    /// Delay the first update after an idle period by a random fraction of the MRAI interval.
    pub always_mrai: bool,
    /// Draw the MRAI interval between 75% and 100% of the configured value.
    pub mrai_jitter: bool,
    /// Added to the seed of every random number generator.
    pub randomize_key: String,
    /// Delay of links without their own delay distribution.
    pub default_link_delay: Delay,
    /// Processing delay of every router.
    pub default_process_delay: Delay,
    /// Weight of every imported or originated path.
    pub default_weight: u32,
    /// Local preference of every imported or originated path.
    pub default_local_pref: u32,
    /// Bandwidth of links in bit per second.
    pub default_bandwidth: f64,
    /// Debug output
    pub debug: DebugOptions,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dragon: Default::default(),
            always_compare_med: false,
            sender_side_loop_detection: false,
            withdrawal_rate_limiting: false,
            always_mrai: true,
            mrai_jitter: true,
            randomize_key: String::new(),
            default_link_delay: Delay::DEFAULT_LINK,
            default_process_delay: Delay::DEFAULT_PROCESSING,
            default_weight: 1000,
            default_local_pref: 100,
            default_bandwidth: 100_000_000.0,
            debug: Default::default(),
        }
    }
}

/// Configuration of a single router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Name of the router, like `1.1`.
    pub name: String,
    /// AS number of the router
    pub asn: AsId,
    /// The router reflects routes between its iBGP peers.
    #[serde(default)]
    pub route_reflector: bool,
    /// Granularity of the MRAI timers.
    #[serde(default)]
    pub mrai_mode: MraiMode,
    /// BGP sessions
    #[serde(default)]
    pub neighbors: Vec<NeighborConfig>,
}

impl RouterConfig {
    /// Create a router without any sessions.
    pub fn new(name: impl Into<String>, asn: impl Into<AsId>) -> Self {
        Self {
            name: name.into(),
            asn: asn.into(),
            route_reflector: false,
            mrai_mode: MraiMode::PerPeer,
            neighbors: Vec::new(),
        }
    }

    /// Get the session towards the named router, creating it if necessary.
    pub fn neighbor_mut(&mut self, name: &str) -> &mut NeighborConfig {
        match self.neighbors.iter().position(|n| n.name == name) {
            Some(pos) => &mut self.neighbors[pos],
            None => {
                self.neighbors.push(NeighborConfig::new(name));
                let last = self.neighbors.len() - 1;
                &mut self.neighbors[last]
            }
        }
    }
}

/// Configuration of a BGP session, from the perspective of the local router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborConfig {
    /// Name of the remote router
    pub name: String,
    /// AS of the remote router. If missing, the AS of the remote router is used.
    #[serde(default)]
    pub remote_as: Option<AsId>,
    /// What the remote router is to the local one.
    #[serde(default)]
    pub relationship: Option<Relationship>,
    /// The remote router is a route-reflector client.
    #[serde(default)]
    pub rr_client: bool,
    /// Base value of the MRAI timer in seconds.
    #[serde(default)]
    pub mrai: f64,
    /// Names of incoming route maps
    #[serde(default)]
    pub maps_in: Vec<String>,
    /// Names of outgoing route maps
    #[serde(default)]
    pub maps_out: Vec<String>,
}

impl Eq for NeighborConfig {}

impl NeighborConfig {
    /// Create a session with default values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_as: None,
            relationship: None,
            rr_client: false,
            mrai: 0.0,
            maps_in: Vec::new(),
            maps_out: Vec::new(),
        }
    }
}

/// Configuration of a link. Unset values take the global default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// First endpoint
    pub a: String,
    /// Second endpoint
    pub b: String,
    /// IGP cost
    #[serde(default)]
    pub cost: Option<u32>,
    /// Bandwidth in bit per second
    #[serde(default)]
    pub bandwidth: Option<f64>,
    /// Delay distribution
    #[serde(default)]
    pub delay: Option<Delay>,
}

impl LinkConfig {
    /// Create a link with default values.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            cost: None,
            bandwidth: None,
            delay: None,
        }
    }

    /// Returns `true` if the link connects the two routers (in any direction).
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}

/// Event, with routers referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EventKind {
    /// The router starts originating the prefix.
    AnnouncePrefix {
        /// Name of the router
        router: String,
        /// The prefix
        prefix: Ipv4Prefix,
    },
    /// The router stops originating the prefix.
    WithdrawPrefix {
        /// Name of the router
        router: String,
        /// The prefix
        prefix: Ipv4Prefix,
    },
    /// The link fails.
    LinkDown {
        /// First endpoint
        a: String,
        /// Second endpoint
        b: String,
    },
    /// The link recovers.
    LinkUp {
        /// First endpoint
        a: String,
        /// Second endpoint
        b: String,
    },
    /// End of the simulation
    Terminate,
    /// Log the RIB of all routers.
    ShowAllRibs,
    /// Reset the update counters.
    ResetCounters,
    /// De-aggregate own prefixes based on the actual reachability of their children.
    ActivateDeaggregates,
    /// Store a snapshot of the update counters.
    OutputUpdates,
    /// Enable all debug output.
    ActivateDebug,
    /// Start measuring the convergence time.
    StartTrackTime,
    /// Record the convergence time since the last `start-track-time`.
    StopTrackTime {
        /// Label of the measurement
        label: String,
    },
}

/// An event scheduled at a specific time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    /// Time in seconds
    pub at: f64,
    /// The event
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Eq for EventConfig {}

/// Complete configuration of a simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Global parameters
    pub params: SimParams,
    /// All routers
    pub routers: Vec<RouterConfig>,
    /// Links with non-default attributes. Every BGP session implies a link.
    pub links: Vec<LinkConfig>,
    /// All route maps, by name
    pub route_maps: BTreeMap<String, RouteMap>,
    /// Scheduled events
    pub events: Vec<EventConfig>,
}

impl SimConfig {
    /// Parse the JSON representation.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Generate the JSON representation.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Get the router with the given name.
    pub fn router(&self, name: &str) -> Option<&RouterConfig> {
        self.routers.iter().find(|r| r.name == name)
    }

    /// Get the link between the two routers, creating it if necessary.
    pub fn link_mut(&mut self, a: &str, b: &str) -> &mut LinkConfig {
        match self.links.iter().position(|l| l.connects(a, b)) {
            Some(pos) => &mut self.links[pos],
            None => {
                self.links.push(LinkConfig::new(a, b));
                let last = self.links.len() - 1;
                &mut self.links[last]
            }
        }
    }

    /// Schedule an event.
    pub fn add_event(&mut self, at: f64, kind: EventKind) {
        self.events.push(EventConfig { at, kind });
    }
}

impl FromStr for SimConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::default();
        for (i, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('!') {
                continue;
            }
            let cmd: Vec<&str> = line.split_whitespace().collect();
            parser.command(&cmd).map_err(|e| e.at_line(i + 1))?;
        }
        Ok(parser.config)
    }
}

/// State of the text parser.
#[derive(Debug, Default)]
struct Parser {
    config: SimConfig,
    current_as: Option<AsId>,
    current_router: Option<usize>,
    current_map: Option<String>,
}

impl Parser {
    fn command(&mut self, cmd: &[&str]) -> Result<(), ConfigError> {
        match cmd {
            ["router", "bgp", asn, ..] => {
                self.current_as = Some(AsId(number(asn)?));
                Ok(())
            }
            ["bgp", "router-id", name, ..] => {
                let asn = self.current_as.ok_or(ConfigError::NoRouterContext)?;
                self.config.routers.push(RouterConfig::new(*name, asn));
                self.current_router = Some(self.config.routers.len() - 1);
                Ok(())
            }
            ["bgp", "cluster-id", ..] => {
                self.router()?.route_reflector = true;
                Ok(())
            }
            ["bgp", "prefix-based-timer", ..] => {
                self.router()?.mrai_mode = MraiMode::PerPrefix;
                Ok(())
            }
            ["bgp", x, ..] => Err(ConfigError::UnknownOption(x.to_string())),
            ["neighbor", name, args @ ..] => self.neighbor(name, args),
            ["route-map", name, state, args @ ..] => {
                let state = match *state {
                    "permit" => RouteMapState::Allow,
                    "deny" => RouteMapState::Deny,
                    x => return Err(ConfigError::MalformedRouteMap(x.to_string())),
                };
                let order = match args.first() {
                    Some(x) => x
                        .parse()
                        .map_err(|_| ConfigError::InvalidNumber(x.to_string()))?,
                    None => DEFAULT_PRIORITY,
                };
                self.config.route_maps.insert(
                    name.to_string(),
                    RouteMap::new(*name, order, state, Vec::new(), Vec::new()),
                );
                self.current_map = Some(name.to_string());
                Ok(())
            }
            ["match", args @ ..] => {
                let cond = parse_match(args)?;
                self.route_map()?.conds.push(cond);
                Ok(())
            }
            ["set", args @ ..] => {
                let set = parse_set(args)?;
                self.route_map()?.set.push(set);
                Ok(())
            }
            ["link", a, b, args @ ..] => self.link(a, b, args),
            ["event", args @ ..] => {
                let (at, args) = args
                    .split_last()
                    .ok_or(ConfigError::MissingArgument("event"))?;
                let at = float(at)?;
                let kind = parse_event(args)?;
                self.config.add_event(at, kind);
                Ok(())
            }
            ["debug", opt, ..] => {
                let debug = &mut self.config.params.debug;
                match *opt {
                    "show-update-ribs" => debug.update_ribs = true,
                    "show-receive-events" => debug.receive_events = true,
                    "show-send-events" => debug.send_events = true,
                    "show-link-events" => debug.link_events = true,
                    "show-announce-events" => debug.announce_events = true,
                    "show-final-ribs" => debug.final_ribs = true,
                    "show-debug" | "show-dragon" => debug.dragon = true,
                    "check-loop" => warn!("Forwarding loop checks are not supported"),
                    x => return Err(ConfigError::UnknownOption(x.to_string())),
                }
                Ok(())
            }
            ["config", opt, args @ ..] => self.option(opt, args),
            ["dragon", opt, args @ ..] => self.dragon(opt, args),
            [x, ..] => Err(ConfigError::UnknownCommand(x.to_string())),
            [] => Ok(()),
        }
    }

    fn router(&mut self) -> Result<&mut RouterConfig, ConfigError> {
        self.current_router
            .and_then(|i| self.config.routers.get_mut(i))
            .ok_or(ConfigError::NoRouterContext)
    }

    fn route_map(&mut self) -> Result<&mut RouteMap, ConfigError> {
        self.current_map
            .as_ref()
            .and_then(|name| self.config.route_maps.get_mut(name))
            .ok_or(ConfigError::NoRouteMapContext)
    }

    fn neighbor(&mut self, name: &str, args: &[&str]) -> Result<(), ConfigError> {
        let neighbor = self.router()?.neighbor_mut(name);
        match args {
            ["remote-as", asn, rest @ ..] => {
                neighbor.remote_as = Some(AsId(number(asn)?));
                if let Some(rel) = rest.first() {
                    neighbor.relationship = Some(
                        rel.parse::<Relationship>()
                            .map_err(ConfigError::UnknownOption)?,
                    );
                }
            }
            ["route-reflector-client", ..] => neighbor.rr_client = true,
            ["route-map", map, "in", ..] => neighbor.maps_in.push(map.to_string()),
            ["route-map", map, "out", ..] => neighbor.maps_out.push(map.to_string()),
            ["route-map", _, x, ..] => return Err(ConfigError::UnknownOption(x.to_string())),
            ["route-map", ..] => return Err(ConfigError::MissingArgument("route-map direction")),
            ["advertisement-interval", sec, ..] => neighbor.mrai = float(sec)?,
            [x, ..] => return Err(ConfigError::UnknownOption(x.to_string())),
            [] => return Err(ConfigError::MissingArgument("neighbor option")),
        }
        Ok(())
    }

    fn link(&mut self, a: &str, b: &str, args: &[&str]) -> Result<(), ConfigError> {
        match args {
            ["cost", cost, ..] => {
                let cost = number(cost)?;
                self.config.link_mut(a, b).cost = Some(cost);
            }
            ["bandwidth", bw, ..] => {
                let bw = parse_bandwidth(bw)?;
                self.config.link_mut(a, b).bandwidth = Some(bw);
            }
            ["delay", dist @ ..] => {
                let delay = Delay::parse(dist)?;
                self.config.link_mut(a, b).delay = Some(delay);
            }
            [x, ..] => return Err(ConfigError::UnknownOption(x.to_string())),
            [] => return Err(ConfigError::MissingArgument("link option")),
        }
        Ok(())
    }

    fn option(&mut self, opt: &str, args: &[&str]) -> Result<(), ConfigError> {
        let params = &mut self.config.params;
        match opt {
            "mrai-jitter" => params.mrai_jitter = flag(args)?,
            "always-compare-med" => params.always_compare_med = flag(args)?,
            "withdraw-rate-limiting" => params.withdrawal_rate_limiting = flag(args)?,
            "sender-side-loop-detection" => params.sender_side_loop_detection = flag(args)?,
            "always-mrai" => params.always_mrai = flag(args)?,
            "randomize-key" => {
                params.randomize_key = match args.first() {
                    Some(&"random") => std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_nanos().to_string())
                        .unwrap_or_default(),
                    Some(key) => key.to_string(),
                    None => return Err(ConfigError::MissingArgument("randomization key")),
                }
            }
            "default-link-delay" => params.default_link_delay = Delay::parse(args)?,
            "default-process-delay" => params.default_process_delay = Delay::parse(args)?,
            "default-local-preference" => params.default_local_pref = number(arg(args)?)?,
            "default-weight" => params.default_weight = number(arg(args)?)?,
            "default-bandwidth" => params.default_bandwidth = parse_bandwidth(arg(args)?)?,
            x => return Err(ConfigError::UnknownOption(x.to_string())),
        }
        Ok(())
    }

    fn dragon(&mut self, opt: &str, args: &[&str]) -> Result<(), ConfigError> {
        let dragon = &mut self.config.params.dragon;
        match opt {
            "enable" => dragon.enabled = flag(args)?,
            "disable" => dragon.enabled = false,
            "mode" => {
                let mode = arg(args)?;
                dragon.mode = mode
                    .parse()
                    .map_err(|_| ConfigError::UnknownOption(mode.to_string()))?;
            }
            "restrict-to-parentless" => dragon.restrict_to_parentless = flag(args)?,
            "deaggregates" => dragon.disable_deaggregates = !flag(args)?,
            "stub-optimizations" => dragon.stub_optimizations = flag(args)?,
            x => return Err(ConfigError::UnknownOption(x.to_string())),
        }
        Ok(())
    }
}

fn arg<'a>(args: &[&'a str]) -> Result<&'a str, ConfigError> {
    args.first()
        .copied()
        .ok_or(ConfigError::MissingArgument("value"))
}

fn number<T: FromStr>(s: &str) -> Result<T, ConfigError> {
    s.parse()
        .map_err(|_| ConfigError::InvalidNumber(s.to_string()))
}

fn float(s: &str) -> Result<f64, ConfigError> {
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(ConfigError::InvalidNumber(s.to_string())),
    }
}

/// A missing value means `true`.
fn flag(args: &[&str]) -> Result<bool, ConfigError> {
    match args.first() {
        None | Some(&"true") | Some(&"on") | Some(&"yes") => Ok(true),
        Some(&"false") | Some(&"off") | Some(&"no") => Ok(false),
        Some(x) => Err(ConfigError::UnknownOption(x.to_string())),
    }
}

fn prefix(s: &str) -> Result<Ipv4Prefix, ConfigError> {
    s.parse()
        .map_err(|_| ConfigError::InvalidPrefix(s.to_string()))
}

/// Parse a list of communities, separated by `:`.
fn communities(s: &str) -> Result<Vec<u32>, ConfigError> {
    s.split(':').map(number::<u32>).collect()
}

/// Parse the arguments of a `match` command.
pub(crate) fn parse_match(args: &[&str]) -> Result<RouteMapMatch, ConfigError> {
    let malformed = || ConfigError::MalformedRouteMap(format!("match {}", args.join(" ")));
    Ok(match args {
        ["community-list", list, rest @ ..] => {
            let list = communities(list)?;
            RouteMapMatch::Community(match rest.first() {
                Some(&"exact") => CommunityMatch::Exact(list),
                Some(&"any") => CommunityMatch::Any(list),
                None if list.len() == 1 => CommunityMatch::Contains(list[0]),
                _ => return Err(malformed()),
            })
        }
        ["as-path", regex, ..] => RouteMapMatch::AsPath(AsPathRegex::new(regex)?),
        ["ip", "address", p, ..] => RouteMapMatch::Prefix(prefix(p)?),
        ["metric", med, ..] => RouteMapMatch::Metric(number(med)?),
        _ => return Err(malformed()),
    })
}

/// Parse the arguments of a `set` command.
pub(crate) fn parse_set(args: &[&str]) -> Result<RouteMapSet, ConfigError> {
    let malformed = || ConfigError::MalformedRouteMap(format!("set {}", args.join(" ")));
    Ok(match args {
        ["local-preference", lp, ..] => RouteMapSet::LocalPref(number(lp)?),
        ["community", "none", ..] => RouteMapSet::Community(CommunityAction::None),
        ["community", list, "additive", ..] => {
            RouteMapSet::Community(CommunityAction::Additive(communities(list)?))
        }
        ["community", list, ..] => {
            RouteMapSet::Community(CommunityAction::Replace(communities(list)?))
        }
        ["as-path", "prepend", ases @ ..] if !ases.is_empty() => RouteMapSet::PrependAsPath(
            ases.iter()
                .map(|x| number(x).map(AsId))
                .collect::<Result<_, _>>()?,
        ),
        ["metric", med, ..] => RouteMapSet::Med(number(med)?),
        _ => return Err(malformed()),
    })
}

/// Parse the arguments of an `event` command, without the time.
fn parse_event(args: &[&str]) -> Result<EventKind, ConfigError> {
    Ok(match args {
        ["announce-prefix", router, p] => EventKind::AnnouncePrefix {
            router: router.to_string(),
            prefix: prefix(p)?,
        },
        ["withdraw-prefix", router, p] => EventKind::WithdrawPrefix {
            router: router.to_string(),
            prefix: prefix(p)?,
        },
        ["link-down", a, b] => EventKind::LinkDown {
            a: a.to_string(),
            b: b.to_string(),
        },
        ["link-up", a, b] => EventKind::LinkUp {
            a: a.to_string(),
            b: b.to_string(),
        },
        ["terminate"] => EventKind::Terminate,
        ["show-all-ribs"] => EventKind::ShowAllRibs,
        ["reset-counters"] => EventKind::ResetCounters,
        ["activate-deaggregates"] => EventKind::ActivateDeaggregates,
        ["output-updates", ..] => EventKind::OutputUpdates,
        ["activate-debug"] => EventKind::ActivateDebug,
        ["start-track-time"] => EventKind::StartTrackTime,
        ["stop-track-time", label @ ..] => EventKind::StopTrackTime {
            label: label.join(" "),
        },
        [x, ..] => return Err(ConfigError::UnknownCommand(format!("event {x}"))),
        [] => return Err(ConfigError::MissingArgument("event kind")),
    })
}
