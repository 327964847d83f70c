use super::*;
use crate::geometry::{points_equal, Point2};
use crate::model::{LineData, PathKind, PathRef, RegionData, VertexRef};
use crate::ops::mask::synthesize_mask;
use serde_json::json;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
    vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
}

fn line_data(index: usize, baseline: Vec<Point2>) -> LineData {
    LineData { context: Some(json!(format!("line-{}", index))), baseline: Some(baseline), ..Default::default() }
}

fn editor_with(config: EditorConfig, lines: Vec<Vec<Point2>>) -> Editor {
    let mut editor = Editor::new(config).with_image_size(1000.0, 1000.0);
    let doc = DocumentData {
        lines: lines.into_iter().enumerate().map(|(i, b)| line_data(i, b)).collect(),
        regions: Vec::new(),
    };
    editor.load(doc);
    editor.flush_frame();
    editor.take_events();
    editor
}

fn editor(lines: Vec<Vec<Point2>>) -> Editor {
    editor_with(EditorConfig::default(), lines)
}

fn ids(editor: &Editor) -> Vec<EntityId> {
    editor.lines().iter().map(|l| l.id).collect()
}

fn baseline(editor: &Editor, id: EntityId) -> Vec<Point2> {
    editor.get_line(id).and_then(|l| l.baseline.clone()).unwrap()
}

fn same_points(a: &[Point2], b: &[Point2]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(p, q)| points_equal(*p, *q))
}

fn deletes(events: &[EngineEvent]) -> Vec<(Vec<LineSnapshot>, Vec<RegionSnapshot>)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Delete { lines, regions } => Some((lines.clone(), regions.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_load_synthesizes_missing_masks() {
    let mut editor = Editor::default();
    let doc = DocumentData {
        lines: vec![
            line_data(0, vec![[0.0, 0.0], [100.0, 0.0]]),
            LineData { mask: Some(rect(0.0, 50.0, 80.0, 70.0)), ..Default::default() },
            LineData::default(),
        ],
        regions: Vec::new(),
    };
    editor.load(doc);

    // The geometry-less line is skipped
    assert_eq!(editor.line_count(), 2);
    let first = editor.lines()[0].clone();
    assert_eq!(first.mask.as_ref().map(Vec::len), Some(4));
    assert!(first.mask_derived);
    assert!(first.decorations.is_some());

    // Only the line whose mask was synthesized goes back to the host
    assert!(editor.flush_frame());
    let events = editor.take_events();
    match &events[..] {
        [EngineEvent::Update { lines, regions }] => {
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0].context, Some(json!("line-0")));
            assert!(regions.is_empty());
        }
        other => panic!("unexpected events {:?}", other),
    }
}

#[test]
fn test_load_links_lines_by_region_context() {
    let mut editor = Editor::default();
    let doc = DocumentData {
        regions: vec![RegionData { context: Some(json!("r-1")), polygon: rect(0.0, 0.0, 200.0, 200.0), ..Default::default() }],
        lines: vec![
            LineData { region: Some(json!("r-1")), ..line_data(0, vec![[10.0, 50.0], [150.0, 50.0]]) },
            LineData { region: Some(json!("r-404")), ..line_data(1, vec![[10.0, 90.0], [150.0, 90.0]]) },
        ],
    };
    editor.load(doc);

    let region = editor.regions()[0].id;
    let lines = editor.lines();
    assert_eq!(lines[0].region, Some(region));
    assert_eq!(lines[1].region, None);

    let snapshot = editor.line(lines[0].id).unwrap();
    assert_eq!(snapshot.region.unwrap().context, Some(json!("r-1")));
}

#[test]
fn test_one_update_per_frame() {
    let mut editor = editor(vec![
        vec![[0.0, 0.0], [100.0, 0.0]],
        vec![[0.0, 100.0], [100.0, 100.0]],
        vec![[0.0, 200.0], [100.0, 200.0]],
    ]);
    let ids = ids(&editor);
    editor.select(ids[0], false);
    editor.select(ids[2], true);
    editor.reverse_selection();
    editor.reverse_selection();

    assert_eq!(editor.pending_updates(), 2);
    assert!(editor.flush_frame());
    assert_eq!(editor.pending_updates(), 0);
    assert!(!editor.flush_frame());

    let events = editor.take_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        EngineEvent::Update { lines, .. } => {
            let mut updated: Vec<EntityId> = lines.iter().map(|l| l.id).collect();
            updated.sort();
            assert_eq!(updated, vec![ids[0], ids[2]]);
        }
        other => panic!("expected an update, got {:?}", other),
    }
}

#[test]
fn test_deleting_a_region_unlinks_its_lines() {
    let mut editor = Editor::default();
    editor.load(DocumentData {
        regions: vec![RegionData { context: Some(json!("r")), polygon: rect(0.0, 0.0, 500.0, 500.0), ..Default::default() }],
        lines: vec![
            LineData { region: Some(json!("r")), ..line_data(0, vec![[10.0, 50.0], [150.0, 50.0]]) },
            LineData { region: Some(json!("r")), ..line_data(1, vec![[10.0, 90.0], [150.0, 90.0]]) },
        ],
    });
    editor.flush_frame();
    editor.take_events();

    editor.set_mode(Mode::Regions);
    editor.select_all();
    editor.delete_selection();

    assert_eq!(editor.region_count(), 0);
    assert!(editor.lines().iter().all(|l| l.region.is_none()));

    let events = editor.take_events();
    let deleted = deletes(&events);
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].1.len(), 1);
    assert_eq!(deleted[0].1[0].context, Some(json!("r")));

    editor.flush_frame();
    match editor.take_events().last() {
        Some(EngineEvent::Update { lines, .. }) => {
            assert_eq!(lines.len(), 2);
            assert!(lines.iter().all(|l| l.region.is_none()));
        }
        other => panic!("expected an update, got {:?}", other),
    }
}

#[test]
fn test_merge_two_lines_spans_both() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [50.0, 0.0]], vec![[60.0, 0.0], [100.0, 0.0]]]);
    editor.select_all();
    editor.merge_selection();

    assert_eq!(editor.line_count(), 1);
    let merged = editor.lines()[0].clone();
    let points = merged.baseline.unwrap();
    assert!(points_equal(points[0], [0.0, 0.0]));
    assert!(points_equal(*points.last().unwrap(), [100.0, 0.0]));
    assert!(!merged.mask_derived);
    assert_eq!(merged.order, 0);
}

#[test]
fn test_merge_notifies_each_absorbed_line() {
    let mut editor = editor(vec![
        vec![[110.0, 0.0], [150.0, 0.0]],
        vec![[0.0, 0.0], [50.0, 0.0]],
        vec![[60.0, 0.0], [100.0, 0.0]],
    ]);
    editor.select_all();
    editor.merge_selection();
    assert_eq!(editor.line_count(), 1);

    let deleted = deletes(&editor.take_events());
    assert_eq!(deleted.len(), 2);
    let absorbed: Vec<Vec<Point2>> = deleted.iter().map(|(lines, _)| lines[0].baseline.clone().unwrap()).collect();
    assert!(same_points(&absorbed[0], &[[60.0, 0.0], [100.0, 0.0]]));
    assert!(same_points(&absorbed[1], &[[110.0, 0.0], [150.0, 0.0]]));

    let merged = editor.lines()[0].baseline.clone().unwrap();
    assert!(same_points(
        &merged,
        &[[0.0, 0.0], [50.0, 0.0], [60.0, 0.0], [100.0, 0.0], [110.0, 0.0], [150.0, 0.0]]
    ));

    // One command restores all three
    assert!(editor.undo());
    assert_eq!(editor.line_count(), 3);
}

#[test]
fn test_merge_requires_baselines() {
    let mut editor = Editor::default();
    editor.load(DocumentData {
        lines: vec![
            line_data(0, vec![[0.0, 0.0], [50.0, 0.0]]),
            LineData { mask: Some(rect(60.0, -20.0, 100.0, 10.0)), ..Default::default() },
        ],
        regions: Vec::new(),
    });
    editor.select_all();
    editor.merge_selection();
    assert_eq!(editor.line_count(), 2);
    assert!(!editor.can_undo());
}

#[test]
fn test_reverse_twice_restores_line() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [30.0, 10.0], [100.0, 0.0]]]);
    let id = ids(&editor)[0];
    let original = editor.get_line(id).unwrap().clone();

    editor.select(id, false);
    editor.reverse_selection();
    assert!(points_equal(baseline(&editor, id)[0], [100.0, 0.0]));
    editor.reverse_selection();

    let restored = editor.get_line(id).unwrap();
    assert_eq!(restored.baseline, original.baseline);
    assert_eq!(restored.mask, original.mask);
}

#[test]
fn test_cut_inserts_new_line_after_source() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [100.0, 0.0]], vec![[0.0, 100.0], [100.0, 100.0]]]);
    let before = ids(&editor);
    editor.apply_cut(&rect(40.0, -50.0, 60.0, 50.0));

    let after = ids(&editor);
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[1]);
    assert!(same_points(&baseline(&editor, after[0]), &[[0.0, 0.0], [40.0, 0.0]]));
    assert!(same_points(&baseline(&editor, after[1]), &[[60.0, 0.0], [100.0, 0.0]]));

    let orders: Vec<usize> = editor.lines().iter().map(|l| l.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(editor.get_line(after[1]).unwrap().context, None);

    assert!(editor.undo());
    assert_eq!(ids(&editor), before);
    assert!(same_points(&baseline(&editor, before[0]), &[[0.0, 0.0], [100.0, 0.0]]));
    assert_eq!(editor.get_line(before[1]).unwrap().order, 1);
}

#[test]
fn test_cut_regions_keeps_type() {
    let mut editor = Editor::default();
    editor.load(DocumentData {
        regions: vec![RegionData {
            polygon: rect(0.0, 0.0, 100.0, 100.0),
            region_type: Some("Margin".into()),
            ..Default::default()
        }],
        lines: Vec::new(),
    });
    editor.set_mode(Mode::Regions);
    editor.apply_cut(&rect(30.0, -10.0, 50.0, 110.0));

    let regions = editor.regions();
    assert_eq!(regions.len(), 2);
    assert!((regions[0].area() - 5000.0).abs() < 1e-6);
    assert!((regions[1].area() - 3000.0).abs() < 1e-6);
    assert!(regions.iter().all(|r| r.region_type.as_deref() == Some("Margin")));
}

#[test]
fn test_undo_delete_recreates_without_context() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [100.0, 0.0]]]);
    let id = ids(&editor)[0];
    editor.select(id, false);
    editor.delete_selection();
    assert_eq!(editor.line_count(), 0);
    assert_eq!(deletes(&editor.take_events()).len(), 1);

    assert!(editor.undo());
    let restored = editor.get_line(id).unwrap();
    assert_eq!(restored.context, None);
    assert!(editor.flush_frame());

    assert!(editor.redo());
    assert_eq!(editor.line_count(), 0);
    let events = editor.take_events();
    assert_eq!(deletes(&events).len(), 1);
}

#[test]
fn test_modify_undo_keeps_host_context() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [100.0, 0.0]]]);
    let id = ids(&editor)[0];
    editor.select(id, false);
    editor.reverse_selection();
    editor.set_line_context(id, json!("renamed")).unwrap();

    assert!(editor.undo());
    let line = editor.get_line(id).unwrap();
    assert_eq!(line.context, Some(json!("renamed")));
    assert!(points_equal(line.baseline.as_ref().unwrap()[0], [0.0, 0.0]));
}

#[test]
fn test_history_limit() {
    let config = EditorConfig { history_limit: 2, ..Default::default() };
    let mut editor = editor_with(config, vec![vec![[0.0, 0.0], [100.0, 0.0]]]);
    editor.select_all();
    for _ in 0..3 {
        editor.reverse_selection();
    }
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
}

#[test]
fn test_set_type_validates_names() {
    let config = EditorConfig { line_types: vec!["Heading".into()], ..Default::default() };
    let mut editor = editor_with(config, vec![vec![[0.0, 0.0], [100.0, 0.0]]]);
    let id = ids(&editor)[0];
    editor.select(id, false);

    editor.open_type_prompt();
    assert!(editor.is_type_prompt_open());
    editor.set_type(Some("Heading")).unwrap();
    assert!(!editor.is_type_prompt_open());
    assert_eq!(editor.get_line(id).unwrap().line_type.as_deref(), Some("Heading"));

    let err = editor.set_type(Some("Footnote")).unwrap_err();
    assert!(matches!(err, EditorError::UnknownType(_)));
    assert_eq!(editor.get_line(id).unwrap().line_type.as_deref(), Some("Heading"));

    editor.set_type(None).unwrap();
    assert_eq!(editor.get_line(id).unwrap().line_type, None);
}

#[test]
fn test_prompt_blocks_shortcuts() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [100.0, 0.0]]]);
    editor.select_all();
    editor.run_shortcut(Shortcut::TypePrompt);
    assert!(editor.is_type_prompt_open());

    assert!(!editor.handle_key("m", KeyModifiers::default()));
    assert!(editor.settings().show_masks);
    assert!(!editor.handle_key("Delete", KeyModifiers::default()));
    assert_eq!(editor.line_count(), 1);

    assert!(editor.handle_key("Escape", KeyModifiers::default()));
    assert!(!editor.is_type_prompt_open());
    assert!(editor.handle_key("m", KeyModifiers::default()));
    assert!(!editor.settings().show_masks);
}

#[test]
fn test_move_order_keeps_permutation() {
    let mut editor = editor(vec![
        vec![[0.0, 0.0], [100.0, 0.0]],
        vec![[0.0, 100.0], [100.0, 100.0]],
        vec![[0.0, 200.0], [100.0, 200.0]],
    ]);
    let before = ids(&editor);
    editor.move_order(before[2], 0).unwrap();
    assert_eq!(ids(&editor), vec![before[2], before[0], before[1]]);
    let orders: Vec<usize> = editor.lines().iter().map(|l| l.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);

    assert!(matches!(editor.move_order(EntityId(999), 0), Err(EditorError::UnknownEntity(_))));
}

#[test]
fn test_link_follows_containing_region() {
    let mut editor = Editor::default();
    editor.load(DocumentData {
        regions: vec![
            RegionData { polygon: rect(0.0, -50.0, 200.0, 50.0), order: Some(0), ..Default::default() },
            RegionData { polygon: rect(0.0, 100.0, 200.0, 200.0), order: Some(1), ..Default::default() },
        ],
        lines: vec![line_data(0, vec![[10.0, 0.0], [100.0, 0.0]])],
    });
    let (a, b) = (editor.regions()[0].id, editor.regions()[1].id);
    let line = ids(&editor)[0];

    editor.select(line, false);
    editor.link_selection();
    assert_eq!(editor.get_line(line).unwrap().region, Some(a));

    // Still inside: the link is kept and nothing is recorded
    editor.flush_frame();
    editor.take_events();
    editor.link_selection();
    assert_eq!(editor.get_line(line).unwrap().region, Some(a));
    editor.flush_frame();
    assert!(editor.take_events().is_empty());

    // Moved into the other region
    editor.lines.get_mut(&line).unwrap().baseline = Some(vec![[10.0, 150.0], [100.0, 150.0]]);
    editor.link_selection();
    assert_eq!(editor.get_line(line).unwrap().region, Some(b));

    // Outside every region
    editor.lines.get_mut(&line).unwrap().baseline = Some(vec![[10.0, 500.0], [100.0, 500.0]]);
    editor.link_selection();
    assert_eq!(editor.get_line(line).unwrap().region, None);

    editor.undo();
    assert_eq!(editor.get_line(line).unwrap().region, Some(b));
}

#[test]
fn test_link_picks_first_of_overlapping_regions() {
    let mut editor = Editor::default();
    editor.load(DocumentData {
        regions: vec![
            RegionData { polygon: rect(0.0, -50.0, 200.0, 50.0), order: Some(0), ..Default::default() },
            RegionData { polygon: rect(0.0, -100.0, 300.0, 100.0), order: Some(1), ..Default::default() },
        ],
        lines: vec![line_data(0, vec![[10.0, 0.0], [100.0, 0.0]])],
    });
    let first = editor.regions()[0].id;
    let line = ids(&editor)[0];

    editor.select(line, false);
    editor.link_selection();
    assert_eq!(editor.get_line(line).unwrap().region, Some(first));
}

#[test]
fn test_delete_baseline_vertex_keeps_mask_paired() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [50.0, 10.0], [100.0, 0.0]]]);
    let id = ids(&editor)[0];
    editor.selection.select_vertex(VertexRef { path: PathRef::new(id, PathKind::Baseline), index: 1 });
    editor.delete_selected_vertices();

    let line = editor.get_line(id).unwrap();
    let baseline = line.baseline.clone().unwrap();
    assert!(same_points(&baseline, &[[0.0, 0.0], [100.0, 0.0]]));
    assert!(line.mask_derived);
    let expected = synthesize_mask(&baseline, 20.0, 10.0, 30.0).unwrap();
    assert!(same_points(line.mask.as_ref().unwrap(), &expected));
}

#[test]
fn test_deleting_last_vertices_removes_region() {
    let mut editor = Editor::default();
    editor.load(DocumentData {
        regions: vec![RegionData { polygon: rect(0.0, 0.0, 100.0, 100.0), ..Default::default() }],
        lines: Vec::new(),
    });
    let id = editor.regions()[0].id;
    for index in 0..2 {
        editor.selection.select_vertex(VertexRef { path: PathRef::new(id, PathKind::Polygon), index });
    }
    editor.delete_selected_vertices();
    assert_eq!(editor.region_count(), 0);
    assert_eq!(deletes(&editor.take_events()).len(), 1);
}

#[test]
fn test_unknown_entity_context() {
    let mut editor = Editor::default();
    let err = editor.set_line_context(EntityId(12), json!(1)).unwrap_err();
    assert!(matches!(err, EditorError::UnknownEntity(EntityId(12))));
}

#[test]
fn test_toggles_emit_settings() {
    let mut editor = Editor::default();
    editor.toggle_masks();
    editor.toggle_mode();
    let events = editor.take_events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        EngineEvent::Settings(Settings { show_masks: false, show_ordering: false, mode: Mode::Regions })
    );
}

#[test]
fn test_export_lists_lines_in_order() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [100.0, 0.0]], vec![[0.0, 100.0], [100.0, 100.0]]]);
    let ids = ids(&editor);
    editor.move_order(ids[1], 0).unwrap();

    let export = editor.export();
    assert_eq!(export.lines[0].id, ids[1]);
    let json: serde_json::Value = serde_json::from_str(&editor.export_json().unwrap()).unwrap();
    assert_eq!(json["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["lines"][0]["context"], "line-1");
}

#[test]
fn test_reset_clears_everything() {
    let mut editor = editor(vec![vec![[0.0, 0.0], [100.0, 0.0]]]);
    editor.select_all();
    editor.reverse_selection();
    editor.toggle_cut();
    editor.reset();

    assert_eq!(editor.line_count(), 0);
    assert!(!editor.can_undo());
    assert!(!editor.is_splitting());
    assert!(editor.selection().is_empty());
    assert_eq!(editor.pending_updates(), 0);
}
