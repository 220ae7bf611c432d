use multidetect_rs::{Detection, DetectionKind, DetectorKind, IdentityTracker, Rect, TrackerConfig};

fn face(x: f32, y: f32) -> Detection {
    Detection::new(
        Rect::new(x, y, 40.0, 40.0),
        "face",
        DetectionKind::Face,
        DetectorKind::Cascade,
    )
}

#[test]
fn test_identity_persists_across_small_moves() {
    let mut tracker = IdentityTracker::default();

    let first = tracker.update(&[face(100.0, 100.0)]);
    assert_eq!(first.len(), 1);
    assert!(first[0].is_new);
    let id = first[0].id;

    for step in 1..=3 {
        let offset = 5.0 * step as f32;
        let ids = tracker.update(&[face(100.0 + offset, 100.0)]);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].id, id);
        assert!(!ids[0].is_new);
    }

    let record = tracker.get(id).unwrap();
    assert_eq!(record.hits, 4);
    assert_eq!(record.rect.x, 115.0);
}

#[test]
fn test_large_jump_gets_new_identity() {
    let mut tracker = IdentityTracker::default();
    let first = tracker.update(&[face(0.0, 0.0)])[0].id;

    // 150px away is outside the default 100px radius.
    let ids = tracker.update(&[face(150.0, 0.0)]);
    assert_ne!(ids[0].id, first);
    assert!(ids[0].is_new);
    assert_eq!(tracker.len(), 2);
}

#[test]
fn test_exact_radius_is_not_a_match() {
    let mut tracker = IdentityTracker::default();
    let first = tracker.update(&[face(0.0, 0.0)])[0].id;
    let ids = tracker.update(&[face(100.0, 0.0)]);
    assert_ne!(ids[0].id, first);
}

#[test]
fn test_ties_go_to_lowest_identity() {
    let mut tracker = IdentityTracker::default();
    let ids = tracker.update(&[face(0.0, 0.0), face(100.0, 0.0)]);
    assert_eq!(ids.iter().map(|i| i.id).collect::<Vec<_>>(), vec![0, 1]);

    // Center equidistant (50px) from both records.
    let ids = tracker.update(&[face(50.0, 0.0)]);
    assert_eq!(ids[0].id, 0);
}

#[test]
fn test_one_identity_may_absorb_several_detections() {
    let mut tracker = IdentityTracker::default();
    tracker.update(&[face(0.0, 0.0)]);

    let ids = tracker.update(&[face(10.0, 0.0), face(20.0, 0.0)]);
    assert_eq!(ids[0].id, 0);
    assert_eq!(ids[1].id, 0);
    assert_eq!(tracker.len(), 1);

    // Same-frame matches count as one hit; the last one sets the box.
    let record = tracker.get(0).unwrap();
    assert_eq!(record.hits, 2);
    assert_eq!(record.rect.x, 20.0);
}

#[test]
fn test_idle_identities_are_evicted_and_never_reused() {
    let mut tracker = IdentityTracker::default();
    let id = tracker.update(&[face(0.0, 0.0)])[0].id;

    for _ in 0..30 {
        tracker.update(&[]);
    }
    assert!(tracker.get(id).is_some());

    tracker.update(&[]);
    assert!(tracker.is_empty());

    let ids = tracker.update(&[face(0.0, 0.0)]);
    assert!(ids[0].id > id);
}

#[test]
fn test_records_kept_without_idle_limit() {
    let mut tracker = IdentityTracker::new(TrackerConfig::default().with_max_idle_frames(None));
    let id = tracker.update(&[face(0.0, 0.0)])[0].id;
    for _ in 0..100 {
        tracker.update(&[]);
    }
    assert_eq!(tracker.update(&[face(5.0, 0.0)])[0].id, id);
}

#[test]
fn test_smoothed_box_follows_detections() {
    let mut tracker = IdentityTracker::default();
    let mut last = None;
    for step in 0..10 {
        let ids = tracker.update(&[face(10.0 * step as f32, 50.0)]);
        last = Some(ids[0]);
    }
    let identity = last.unwrap();
    assert_eq!(identity.rect.x, 90.0);
    assert!((identity.smoothed_rect.x - identity.rect.x).abs() < 10.0);
    assert!((identity.smoothed_rect.width - 40.0).abs() < 1.0);

    let (vx, _) = tracker.get(identity.id).unwrap().velocity().unwrap();
    assert!(vx > 0.0);
}

#[test]
fn test_smoothing_disabled_reports_raw_box() {
    let mut tracker = IdentityTracker::new(TrackerConfig::default().with_smoothing(false));
    tracker.update(&[face(0.0, 0.0)]);
    let ids = tracker.update(&[face(7.0, 3.0)]);
    assert_eq!(ids[0].smoothed_rect, ids[0].rect);
    assert!(tracker.get(ids[0].id).unwrap().velocity().is_none());
}
