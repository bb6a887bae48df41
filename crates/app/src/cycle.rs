//! Closed-circuit detection — does the room's wiring contain a loop?
//!
//! The wiring is an undirected simple graph (canonical wires, no
//! self-loops), so a loop needs at least three devices and three wires;
//! anything smaller is dismissed without traversal. Past that gate a
//! depth-first walk with parent tracking looks for a back edge in any
//! component.

use std::collections::{BTreeMap, BTreeSet};

use homecircuit_domain::id::DeviceId;
use homecircuit_domain::room::Room;

/// Whether the room's wiring contains at least one closed loop.
#[must_use]
pub fn has_closed_circuit(room: &Room) -> bool {
    if room.device_count() < 3 || room.wire_count() < 3 {
        return false;
    }

    let mut visited: BTreeSet<DeviceId> = BTreeSet::new();
    for device in room.devices() {
        if visited.contains(&device.id) {
            continue;
        }
        // parent[n] is the node n was discovered from.
        let mut parent: BTreeMap<DeviceId, Option<DeviceId>> = BTreeMap::new();
        parent.insert(device.id, None);
        let mut stack = vec![device.id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for neighbor in room.neighbors(current) {
                if !visited.contains(&neighbor) {
                    parent.insert(neighbor, Some(current));
                    stack.push(neighbor);
                } else if parent.get(&current).copied().flatten() != Some(neighbor) {
                    return true;
                }
            }
        }
    }
    false
}
