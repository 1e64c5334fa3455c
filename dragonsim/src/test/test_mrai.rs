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


use super::p;
use crate::event::seeded_rng;
use crate::mrai::{mrai_interval, random_wait, MraiMode, MraiTimers};
use crate::types::{secs, RouterId};
use approx::assert_abs_diff_eq;

#[test]
fn keys_depend_on_mode() {
    let peer = RouterId::new(1);
    let prefix = p("10.0.0.0/8");
    assert_eq!(MraiTimers::new(MraiMode::PerPeer).key(peer, prefix), (peer, None));
    assert_eq!(
        MraiTimers::new(MraiMode::PerPrefix).key(peer, prefix),
        (peer, Some(prefix))
    );
}

#[test]
fn arm_and_expire() {
    let mut timers = MraiTimers::new(MraiMode::PerPeer);
    let key = timers.key(RouterId::new(1), p("10.0.0.0/8"));
    assert_eq!(timers.expiry(key, secs(0.0)), None);

    assert_eq!(timers.arm(key, 30.0, secs(1.0)), Some(secs(31.0)));
    // already running
    assert_eq!(timers.arm(key, 30.0, secs(2.0)), None);
    assert_eq!(timers.expiry(key, secs(31.0)), Some(secs(31.0)));
    assert_eq!(timers.expiry(key, secs(31.5)), None);

    // early expiry event is ignored
    assert!(!timers.expire(key, secs(20.0)));
    assert!(timers.expiry(key, secs(20.0)).is_some());

    assert!(timers.expire(key, secs(31.0)));
    assert_eq!(timers.expiry(key, secs(31.0)), None);
    assert_eq!(timers.arm(key, 30.0, secs(31.0)), Some(secs(61.0)));
}

#[test]
fn stale_expiry_after_restart() {
    let mut timers = MraiTimers::new(MraiMode::PerPeer);
    let key = (RouterId::new(1), None);
    timers.arm(key, 10.0, secs(0.0));
    timers.reset(key);
    timers.arm(key, 10.0, secs(5.0));
    // the event scheduled by the first arm is stale now
    assert!(!timers.expire(key, secs(10.0)));
    assert_eq!(timers.expiry(key, secs(10.0)), Some(secs(15.0)));
}

#[test]
fn zero_interval_never_arms() {
    let mut timers = MraiTimers::new(MraiMode::PerPrefix);
    let key = (RouterId::new(1), Some(p("10.0.0.0/8")));
    assert_eq!(timers.arm(key, 0.0, secs(1.0)), None);
    assert_eq!(timers.expiry(key, secs(1.0)), None);
}

#[test]
fn timers_are_independent() {
    let mut timers = MraiTimers::new(MraiMode::PerPrefix);
    let a = timers.key(RouterId::new(1), p("10.0.0.0/8"));
    let b = timers.key(RouterId::new(1), p("11.0.0.0/8"));
    timers.arm(a, 30.0, secs(0.0));
    assert!(timers.expiry(b, secs(0.0)).is_none());
    assert!(timers.arm(b, 30.0, secs(0.0)).is_some());
}

#[test]
fn jitter_bounds() {
    let mut rng = seeded_rng("1.1", "");
    assert_abs_diff_eq!(mrai_interval(30.0, false, &mut rng), 30.0);
    for _ in 0..1000 {
        let x = mrai_interval(30.0, true, &mut rng);
        assert!((22.5..30.0).contains(&x));
        let w = random_wait(30.0, &mut rng);
        assert!((0.0..30.0).contains(&w));
    }
    assert_abs_diff_eq!(mrai_interval(0.0, true, &mut rng), 0.0);
}

#[test]
fn timer_runs_until_its_expiry_instant() {
    let mut timers = MraiTimers::new(MraiMode::PerPeer);
    let key = (RouterId::new(1), None);
    assert_eq!(timers.arm(key, 5.0, secs(0.0)), Some(secs(5.0)));
    assert_eq!(timers.expiry(key, secs(5.0)), Some(secs(5.0)));
    assert_eq!(timers.arm(key, 5.0, secs(5.0)), None);
    assert!(timers.expire(key, secs(5.0)));
    assert_eq!(timers.expiry(key, secs(5.0)), None);
}

#[test]
fn reset_at_time_zero() {
    let mut timers = MraiTimers::new(MraiMode::PerPeer);
    let key = (RouterId::new(1), None);
    timers.arm(key, 5.0, secs(0.0));
    timers.reset(key);
    assert_eq!(timers.expiry(key, secs(0.0)), None);
    assert_eq!(timers.arm(key, 5.0, secs(0.0)), Some(secs(5.0)));
}
