//! Wire — an undirected edge between two device ids.

use crate::error::InvalidConnectionError;
use crate::id::DeviceId;

/// An undirected wire between two distinct devices in the same room.
///
/// Endpoints are stored in canonical (ascending) order so `{a, b}` and
/// `{b, a}` compare and hash identically; at most one wire can exist
/// between any unordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wire {
    a: DeviceId,
    b: DeviceId,
}

impl Wire {
    /// Build the canonical wire between two endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConnectionError::SelfLoop`] when both endpoints
    /// name the same device.
    pub fn between(a: DeviceId, b: DeviceId) -> Result<Self, InvalidConnectionError> {
        if a == b {
            return Err(InvalidConnectionError::SelfLoop(a));
        }
        if a < b {
            Ok(Self { a, b })
        } else {
            Ok(Self { a: b, b: a })
        }
    }

    /// Both endpoints, in canonical order.
    #[must_use]
    pub fn endpoints(self) -> (DeviceId, DeviceId) {
        (self.a, self.b)
    }

    /// Whether `id` is one of the two endpoints.
    #[must_use]
    pub fn touches(self, id: DeviceId) -> bool {
        self.a == id || self.b == id
    }

    /// The opposite endpoint, if `id` is one of the two.
    #[must_use]
    pub fn other_end(self, id: DeviceId) -> Option<DeviceId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> DeviceId {
        DeviceId::new(raw).unwrap()
    }

    #[test]
    fn should_treat_both_orientations_as_the_same_edge() {
        let forward = Wire::between(id(1), id(2)).unwrap();
        let backward = Wire::between(id(2), id(1)).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.endpoints(), (id(1), id(2)));
    }

    #[test]
    fn should_reject_self_loop() {
        let result = Wire::between(id(5), id(5));
        assert!(matches!(result, Err(InvalidConnectionError::SelfLoop(d)) if d == id(5)));
    }

    #[test]
    fn should_report_touching_and_opposite_endpoints() {
        let wire = Wire::between(id(3), id(7)).unwrap();
        assert!(wire.touches(id(3)));
        assert!(wire.touches(id(7)));
        assert!(!wire.touches(id(4)));
        assert_eq!(wire.other_end(id(3)), Some(id(7)));
        assert_eq!(wire.other_end(id(7)), Some(id(3)));
        assert_eq!(wire.other_end(id(4)), None);
    }
}
