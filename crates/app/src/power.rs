//! Power propagation — who is energized, given the room's wiring.
//!
//! Power flows outward from the active voltage source along wires, but only
//! through devices that are plugged in: a disconnected device neither
//! receives power nor conducts it to its neighbors. Propagation is
//! room-local; wires never cross rooms.

use std::collections::{BTreeSet, VecDeque};

use homecircuit_domain::device::DeviceKind;
use homecircuit_domain::id::DeviceId;
use homecircuit_domain::installation::Installation;
use homecircuit_domain::room::Room;

/// Ids of every device reachable from an active source through connected
/// devices only. Includes the sources themselves.
#[must_use]
pub fn energized_ids(room: &Room) -> BTreeSet<DeviceId> {
    let mut energized = room.active_source_ids();
    let mut frontier: VecDeque<DeviceId> = energized.iter().copied().collect();

    while let Some(current) = frontier.pop_front() {
        for neighbor in room.neighbors(current) {
            if energized.contains(&neighbor) {
                continue;
            }
            let conducts = room.device(neighbor).is_some_and(|d| d.connected);
            if conducts {
                energized.insert(neighbor);
                frontier.push_back(neighbor);
            }
        }
    }
    energized
}

/// Recompute `powered_on` for every non-source device in the room.
///
/// The source's own flag is its switch position and is left alone. Returns
/// the ids whose flag flipped, in ascending order.
pub fn recompute_room(room: &mut Room) -> BTreeSet<DeviceId> {
    let energized = energized_ids(room);
    let mut changed = BTreeSet::new();
    for device in room.devices_mut() {
        if device.kind.is_source() {
            continue;
        }
        let powered = device.connected && energized.contains(&device.id);
        if device.powered_on != powered {
            device.powered_on = powered;
            changed.insert(device.id);
        }
    }
    changed
}

/// Whether the heat alarm condition holds: the installation is above
/// `threshold` °C and at least one heat sensor anywhere is plugged in
/// and energized.
#[must_use]
pub fn heat_alarm_condition(installation: &Installation, threshold: i32) -> bool {
    installation.temperature() > threshold
        && installation.rooms().any(|room| {
            room.devices()
                .any(|d| d.kind == DeviceKind::HeatSensor && d.connected && d.powered_on)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use homecircuit_domain::id::RoomId;

    fn id(raw: u64) -> DeviceId {
        DeviceId::new(raw).unwrap()
    }

    /// source(1) — lamp(2) — bulb(3), source on.
    fn powered_chain() -> Room {
        let mut room = Room::new(RoomId::new("kitchen"));
        room.add_device(id(1), DeviceKind::VoltageSource).unwrap();
        room.add_device(id(2), DeviceKind::Lamp).unwrap();
        room.add_device(id(3), DeviceKind::Bulb).unwrap();
        room.connect(id(1), id(2)).unwrap();
        room.connect(id(2), id(3)).unwrap();
        room.device_mut(id(1)).unwrap().powered_on = true;
        room
    }

    #[test]
    fn should_energize_everything_reachable_from_the_source() {
        let mut room = powered_chain();
        let changed = recompute_room(&mut room);
        assert_eq!(changed, BTreeSet::from([id(2), id(3)]));
        assert!(room.device(id(2)).unwrap().powered_on);
        assert!(room.device(id(3)).unwrap().powered_on);
    }

    #[test]
    fn should_power_nothing_when_source_is_off() {
        let mut room = powered_chain();
        recompute_room(&mut room);
        room.device_mut(id(1)).unwrap().powered_on = false;

        let changed = recompute_room(&mut room);
        assert_eq!(changed, BTreeSet::from([id(2), id(3)]));
        assert!(!room.device(id(2)).unwrap().powered_on);
    }

    #[test]
    fn should_not_conduct_through_a_disconnected_device() {
        let mut room = powered_chain();
        room.device_mut(id(2)).unwrap().connected = false;

        let changed = recompute_room(&mut room);
        // Lamp 2 was never powered, bulb 3 is cut off behind it.
        assert_eq!(changed, BTreeSet::new());
        assert!(!room.device(id(2)).unwrap().powered_on);
        assert!(!room.device(id(3)).unwrap().powered_on);
    }

    #[test]
    fn should_cut_power_behind_a_newly_unplugged_device() {
        let mut room = powered_chain();
        recompute_room(&mut room);

        room.device_mut(id(2)).unwrap().connected = false;
        let changed = recompute_room(&mut room);
        assert_eq!(changed, BTreeSet::from([id(2), id(3)]));
    }

    #[test]
    fn should_ignore_a_disconnected_source() {
        let mut room = powered_chain();
        recompute_room(&mut room);

        room.device_mut(id(1)).unwrap().connected = false;
        let changed = recompute_room(&mut room);
        assert_eq!(changed, BTreeSet::from([id(2), id(3)]));
        assert!(!room.device(id(2)).unwrap().powered_on);
    }

    #[test]
    fn should_leave_unwired_devices_dark() {
        let mut room = powered_chain();
        room.add_device(id(4), DeviceKind::Radio).unwrap();

        recompute_room(&mut room);
        assert!(!room.device(id(4)).unwrap().powered_on);
    }

    #[test]
    fn should_energize_around_a_loop() {
        let mut room = powered_chain();
        room.connect(id(1), id(3)).unwrap();
        let changed = recompute_room(&mut room);
        assert_eq!(changed, BTreeSet::from([id(2), id(3)]));
    }

    #[test]
    fn should_require_heat_and_a_live_sensor_for_the_alarm() {
        let mut installation = Installation::new();
        let kitchen = RoomId::new("kitchen");
        {
            let room = installation.ensure_room(&kitchen).unwrap();
            room.add_device(id(1), DeviceKind::VoltageSource).unwrap();
            room.add_device(id(2), DeviceKind::HeatSensor).unwrap();
            room.connect(id(1), id(2)).unwrap();
            room.device_mut(id(1)).unwrap().powered_on = true;
            recompute_room(room);
        }

        // Hot but sensor alive: alarm.
        installation.set_temperature(41);
        assert!(heat_alarm_condition(&installation, 40));

        // At the threshold: no alarm (strictly greater).
        installation.set_temperature(40);
        assert!(!heat_alarm_condition(&installation, 40));

        // Hot but sensor unplugged: no alarm.
        installation.set_temperature(50);
        {
            let room = installation.room_mut(&kitchen).unwrap();
            room.device_mut(id(2)).unwrap().connected = false;
            recompute_room(room);
        }
        assert!(!heat_alarm_condition(&installation, 40));
    }
}
