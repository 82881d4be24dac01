//! Address planning
//!
//! Maps a validated rack number to the four addresses of the rack's two /23
//! segments. Pure derivation; interface discovery and application live
//! elsewhere.

use std::net::Ipv4Addr;

use crate::types::{RackNumber, TopologyPlan};

/// First two octets of the shared rack address space, 172.27.0.0/16.
const RACK_NET: (u8, u8) = (172, 27);

fn rack_addr(third: u8, fourth: u8) -> Ipv4Addr {
    Ipv4Addr::new(RACK_NET.0, RACK_NET.1, third, fourth)
}

/// Derives the topology plan for a rack.
///
/// The rack number keys four consecutive /23 blocks: the rack itself at
/// `.{n}.1`, its gateway at `.{n+1}.254`, the secondary segment at
/// `.{n+2}.1` and the router at `.{n+3}.254`. Validation already
/// guarantees `n + 3` fits the third octet.
pub fn plan_topology(rack: RackNumber) -> TopologyPlan {
    let id = rack.get() as u8;
    TopologyPlan {
        internal1: rack_addr(id, 1),
        gateway1: rack_addr(id + 1, 254),
        internal2: rack_addr(id + 2, 1),
        gateway2: rack_addr(id + 3, 254),
    }
}
