use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a part within a vessel.
    pub struct PartId;
}

/// Identifies a part template. Cheap to copy and compare. The engine treats
/// all parts uniformly; the template id is carried for the host's benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartTypeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_type_id_equality() {
        let a = PartTypeId(0);
        let b = PartTypeId(0);
        let c = PartTypeId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(PartTypeId(0), "decoupler");
        map.insert(PartTypeId(1), "fuel_tank");
        assert_eq!(map[&PartTypeId(0)], "decoupler");
    }
}
