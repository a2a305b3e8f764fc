use dispatch_shared::{Warehouse, WarehouseStatus};

/// The bootstrap fleet: five Bangkok distribution centres. Seeded once at
/// startup; capacity is only mutated through holds and releases afterwards.
pub fn default_fleet() -> Vec<Warehouse> {
    let rows = [
        ("W1", "Bangkok DC1", 13.649, 100.647, 10000.0, 2000.0, 200.0),
        ("W2", "Bangkok DC2", 13.651, 100.637, 15000.0, 2200.0, 180.0),
        ("W3", "Bangkok DC3", 13.655, 100.634, 10000.0, 1500.0, 200.0),
        ("W4", "Bangkok DC4", 13.627, 100.734, 15000.0, 2100.0, 200.0),
        ("W5", "Bangkok DC5", 13.618, 100.736, 10000.0, 1800.0, 180.0),
    ];

    rows.iter()
        .map(|(id, name, lat, lng, capacity, used, limit)| Warehouse {
            warehouse_id: id.to_string(),
            name: name.to_string(),
            lat: *lat,
            lng: *lng,
            capacity_cbm: *capacity,
            used_cbm: *used,
            service_limit: *limit,
            status: WarehouseStatus::Active,
        })
        .collect()
}
