// geometry_config_test.rs - sphinx geometry configuration tests
// Copyright (C) 2019  David Stainton.

use sphinxcrypto::error::GeometryError;
use sphinxcrypto::nike::X25519Nike;
use sphinxcrypto::{Geometry, Sphinx};

#[test]
fn geometry_json_round_trip_test() {
    let geometry = Geometry::new(32, 3000, 7).unwrap();
    let encoded = serde_json::to_string_pretty(&geometry).unwrap();
    let decoded: Geometry = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, geometry);
    assert!(decoded.validate().is_ok());

    let sphinx = Sphinx::new(X25519Nike, decoded).unwrap();
    assert_eq!(sphinx.geometry().nr_hops, 7);
}

#[test]
fn geometry_from_config_test() {
    let config = r#"{
        "nr_hops": 5,
        "public_key_size": 32,
        "per_hop_routing_info_length": 82,
        "routing_info_length": 410,
        "header_length": 460,
        "forward_payload_length": 2000,
        "payload_tag_length": 16,
        "mac_length": 16,
        "next_node_hop_length": 49,
        "surb_length": 684,
        "packet_length": 2476
    }"#;
    let geometry: Geometry = serde_json::from_str(config).unwrap();
    assert_eq!(geometry, Geometry::default());
}

#[test]
fn inconsistent_geometry_config_test() {
    let mut geometry = Geometry::default();
    geometry.packet_length = 4096;
    let encoded = serde_json::to_string(&geometry).unwrap();
    let decoded: Geometry = serde_json::from_str(&encoded).unwrap();

    match Sphinx::new(X25519Nike, decoded) {
        Err(GeometryError::Inconsistent { field, got, want }) => {
            assert_eq!(field, "packet_length");
            assert_eq!(got, 4096);
            assert_eq!(want, 2476);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}
