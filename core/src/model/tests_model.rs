use crate::model::{DocumentData, EntityId, IdGenerator, Line, LineSnapshot, Region, TextDirection};

#[test]
fn test_id_generator_is_monotonic() {
    let mut ids = IdGenerator::new();
    let a = ids.next_id();
    let b = ids.next_id();
    assert!(b > a);

    ids.observe(EntityId(40));
    assert_eq!(ids.next_id(), EntityId(41));

    // Observing an older id never rewinds
    ids.observe(EntityId(3));
    assert_eq!(ids.next_id(), EntityId(42));
}

#[test]
fn test_reverse_twice_is_identity() {
    let original = vec![[0.0, 0.0], [10.0, 2.0], [25.0, -1.0], [40.0, 0.0]];
    let mut line = Line::new(EntityId(1), Some(original.clone()), None);
    line.reverse();
    assert_eq!(line.baseline.as_deref(), Some(&[[40.0, 0.0], [25.0, -1.0], [10.0, 2.0], [0.0, 0.0]][..]));
    line.reverse();
    assert_eq!(line.baseline, Some(original));
}

#[test]
fn test_empty_geometry_is_dropped() {
    let line = Line::new(EntityId(1), Some(vec![]), None);
    assert!(line.baseline.is_none());
    assert!(!line.has_geometry());
}

#[test]
fn test_decorations_follow_text_direction() {
    let mut line = Line::new(EntityId(1), Some(vec![[0.0, 0.0], [100.0, 0.0]]), None);
    line.derive_decorations(30.0);
    let deco = line.decorations.unwrap();
    assert_eq!(deco.anchor, [0.0, 0.0]);
    assert_eq!(deco.direction, Some([1.0, 0.0]));
    assert!((deco.hint_size - 15.0).abs() < 1e-9);

    line.text_direction = TextDirection::Rtl;
    line.derive_decorations(30.0);
    let deco = line.decorations.unwrap();
    assert_eq!(deco.anchor, [100.0, 0.0]);
    assert_eq!(deco.direction, Some([-1.0, 0.0]));
}

#[test]
fn test_snapshot_serializes_host_field_names() {
    let mut region = Region::new(EntityId(1), vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
    region.region_type = Some("Margin".into());
    let mut line = Line::new(EntityId(2), Some(vec![[1.0, 1.0], [5.0, 1.0]]), None);
    line.region = Some(region.id);
    line.line_type = Some("Heading".into());

    let snap = LineSnapshot::new(&line, Some(&region));
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["id"], 2);
    assert_eq!(json["type"], "Heading");
    assert_eq!(json["region"]["type"], "Margin");
    assert_eq!(json["region"]["box"][1][0], 10.0);
    assert!(json["context"].is_null());
}

#[test]
fn test_document_data_defaults() {
    let doc: DocumentData = serde_json::from_str(r#"{"lines": [{"baseline": [[0, 0], [5, 5]]}]}"#).unwrap();
    assert_eq!(doc.lines.len(), 1);
    assert!(doc.regions.is_empty());
    assert!(doc.lines[0].mask.is_none());
    assert!(doc.lines[0].context.is_none());
}
