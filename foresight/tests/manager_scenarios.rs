// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end engine scenarios driven through the public API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use foresight::{
    AbortController, Activation, CallbackHitType, CallbackStatus, Completion, ConnectionInfo,
    ConnectionType, DeviceStrategy, EventData, EventKind, Foresight, ForesightEvent, InputEvent,
    MouseHit, Platform, RegisterOptions, ScrollDirection, SettingKey, SettingsPatch,
    TabDirection, TouchDeviceStrategy, UnregisterReason, UpdatedProps,
};
use kurbo::{Point, Rect, Vec2};

// ── Fixtures ────────────────────────────────────────────────────────────

#[derive(Default)]
struct TestPlatform {
    rects: HashMap<u32, Rect>,
    order: Vec<u32>,
    connection: Option<ConnectionInfo>,
}

impl Platform<u32> for TestPlatform {
    fn element_rect(&self, handle: u32) -> Option<Rect> {
        self.rects.get(&handle).copied()
    }

    fn focus_order(&self) -> Vec<u32> {
        self.order.clone()
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        self.connection
    }
}

type Engine = Foresight<u32, TestPlatform>;
type Log = Rc<RefCell<Vec<ForesightEvent<u32>>>>;

const ALL_KINDS: [EventKind; 10] = [
    EventKind::ElementRegistered,
    EventKind::ElementUnregistered,
    EventKind::ElementDataUpdated,
    EventKind::CallbackInvoked,
    EventKind::CallbackCompleted,
    EventKind::ElementReactivated,
    EventKind::MouseTrajectoryUpdate,
    EventKind::ScrollTrajectoryUpdate,
    EventKind::ManagerSettingsChanged,
    EventKind::DeviceStrategyChanged,
];

fn engine_with(rects: &[(u32, Rect)]) -> Engine {
    let mut platform = TestPlatform::default();
    platform.rects.extend(rects.iter().copied());
    Foresight::new(platform)
}

fn record(engine: &mut Engine) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    for kind in ALL_KINDS {
        let log = Rc::clone(&log);
        engine.add_listener(kind, move |e| log.borrow_mut().push(e.clone()));
    }
    log
}

fn count(log: &Log, kind: EventKind) -> usize {
    log.borrow().iter().filter(|e| e.kind() == kind).count()
}

fn invoked(log: &Log) -> Vec<(u32, CallbackHitType)> {
    log.borrow()
        .iter()
        .filter_map(|e| match &e.data {
            EventData::CallbackInvoked { element, hit_type } => Some((element.handle, *hit_type)),
            _ => None,
        })
        .collect()
}

fn mouse_at(x: f64, y: f64) -> InputEvent<u32> {
    InputEvent::PointerMove {
        point: Point::new(x, y),
        device: DeviceStrategy::Mouse,
    }
}

/// A callback that keeps its completion for the test to settle.
fn parking(slot: &Rc<RefCell<Option<Completion>>>) -> impl FnMut(Activation<u32>) + 'static {
    let slot = Rc::clone(slot);
    move |a| *slot.borrow_mut() = Some(a.into_completion())
}

const SQUARE: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

// ── Registry lifecycle ─────────────────────────────────────────────────

#[test]
fn register_then_unregister_round_trip() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    let before = engine.element_count();

    let reg = engine.register(1, |_| {}, RegisterOptions::new());
    assert!(reg.is_registered);
    assert!(engine.unregister(1));

    assert_eq!(engine.element_count(), before);
    assert_eq!(count(&log, EventKind::ElementRegistered), 1);
    assert_eq!(count(&log, EventKind::ElementUnregistered), 1);
    let last = log.borrow().last().cloned().unwrap();
    assert!(matches!(
        last.data,
        EventData::ElementUnregistered {
            reason: UnregisterReason::ApiCall,
            was_last_element: true,
            ..
        }
    ));
}

#[test]
fn registration_unregister_is_idempotent() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    let reg = engine.register(1, |_| {}, RegisterOptions::new());

    assert!(reg.unregister(&mut engine));
    assert!(!reg.unregister(&mut engine));
    assert!(!engine.unregister(1));
    assert_eq!(count(&log, EventKind::ElementUnregistered), 1);
}

#[test]
fn stale_registration_does_not_remove_a_newer_one() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let old = engine.register(1, |_| {}, RegisterOptions::new());
    engine.unregister(1);
    let new = engine.register(1, |_| {}, RegisterOptions::new());

    assert_ne!(old.id, new.id);
    assert!(!old.unregister(&mut engine));
    assert_eq!(engine.element_count(), 1);
    assert_eq!(engine.element(&1).unwrap().register_count, 2);
}

#[test]
fn duplicate_registration_updates_in_place() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let first = engine.register(1, |_| {}, RegisterOptions::new().name("first"));
    let second = engine.register(
        1,
        |_| {},
        RegisterOptions::new().name("second").hit_slop(10.0),
    );

    assert_eq!(first.id, second.id);
    assert_eq!(engine.element_count(), 1);
    let e = engine.element(&1).unwrap();
    assert_eq!(e.register_count, 2);
    assert_eq!(e.name, "second");
    assert_eq!(e.bounds.expanded_rect, Rect::new(-10.0, -10.0, 110.0, 110.0));
}

#[test]
fn limited_connection_refuses_registration() {
    let mut platform = TestPlatform::default();
    platform.rects.insert(1, SQUARE);
    platform.connection = Some(ConnectionInfo {
        effective_type: Some(ConnectionType::TwoG),
        save_data: false,
    });
    let mut engine = Foresight::new(platform);
    let log = record(&mut engine);

    let reg = engine.register(1, |_| {}, RegisterOptions::new());
    assert!(!reg.is_registered);
    assert!(reg.is_limited_connection);
    assert_eq!(engine.element_count(), 0);
    assert!(log.borrow().is_empty());
    assert!(!reg.unregister(&mut engine));
}

#[test]
fn platform_disconnect_unregisters() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(1, |_| {}, RegisterOptions::new());

    engine.handle_input(InputEvent::Disconnected { handle: 1 }, 5);
    assert_eq!(engine.element_count(), 0);
    assert!(log.borrow().iter().any(|e| matches!(
        e.data,
        EventData::ElementUnregistered {
            reason: UnregisterReason::Disconnected,
            ..
        }
    )));
}

// ── Mouse prediction ───────────────────────────────────────────────────

#[test]
fn trajectory_fires_exactly_once() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(1, |_| {}, RegisterOptions::new());

    engine.handle_input(mouse_at(150.0, 50.0), 0);
    engine.handle_input(mouse_at(130.0, 50.0), 16);
    engine.handle_input(mouse_at(125.0, 50.0), 32);

    assert_eq!(
        invoked(&log),
        vec![(1, CallbackHitType::Mouse(MouseHit::Trajectory))]
    );
    let info = engine.element(&1).unwrap().callback_info().clone();
    assert_eq!(info.callback_fired_count, 1);
    assert_eq!(engine.callback_hits().mouse.trajectory, 1);
    assert_eq!(engine.callback_hits().total, 1);
}

#[test]
fn disabling_mouse_prediction_keeps_active_callbacks() {
    let far = Rect::new(0.0, 300.0, 100.0, 400.0);
    let mut engine = engine_with(&[(1, SQUARE), (2, far)]);
    let log = record(&mut engine);
    let parked = Rc::new(RefCell::new(None));
    engine.register(1, parking(&parked), RegisterOptions::new());
    engine.register(2, |_| {}, RegisterOptions::new());

    engine.handle_input(mouse_at(150.0, 50.0), 0);
    engine.handle_input(mouse_at(130.0, 50.0), 16);
    assert!(engine.element(&1).unwrap().callback_info().is_running_callback);

    engine.alter_settings(&SettingsPatch::new().enable_mouse_prediction(false));

    // Heading straight for element 2 no longer predicts anything.
    engine.handle_input(mouse_at(150.0, 250.0), 32);
    engine.handle_input(mouse_at(120.0, 300.0), 48);
    assert_eq!(invoked(&log).len(), 1);
    assert!(engine.element(&1).unwrap().callback_info().is_running_callback);

    // The running callback still completes normally.
    parked.borrow_mut().take().unwrap().succeed();
    engine.advance(60);
    assert_eq!(count(&log, EventKind::CallbackCompleted), 1);

    // A literal hover still fires.
    engine.handle_input(mouse_at(50.0, 350.0), 80);
    assert_eq!(
        invoked(&log).last().copied(),
        Some((2, CallbackHitType::Mouse(MouseHit::Hover)))
    );
}

#[test]
fn mouse_trajectory_updates_are_published() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(1, |_| {}, RegisterOptions::new());
    engine.alter_settings(&SettingsPatch::new().trajectory_prediction_time_ms(100));

    engine.handle_input(mouse_at(300.0, 500.0), 0);
    engine.handle_input(mouse_at(310.0, 500.0), 100);
    engine.handle_input(mouse_at(320.0, 500.0), 200);

    let updates: Vec<(Point, Point)> = log
        .borrow()
        .iter()
        .filter_map(|e| match e.data {
            EventData::MouseTrajectoryUpdate {
                current, predicted, ..
            } => Some((current, predicted)),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[2], (Point::new(320.0, 500.0), Point::new(330.0, 500.0)));
}

// ── Coalescing and ordering ────────────────────────────────────────────

#[test]
fn hover_and_scroll_in_one_batch_fire_once() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(1, |_| {}, RegisterOptions::new());

    engine.handle_batch(
        [
            InputEvent::Scroll {
                delta: Vec2::new(0.0, 10.0),
            },
            mouse_at(50.0, 50.0),
        ],
        10,
    );

    assert_eq!(
        invoked(&log),
        vec![(1, CallbackHitType::Mouse(MouseHit::Hover))]
    );
    assert_eq!(engine.callback_hits().scroll.down, 0);
}

#[test]
fn registry_events_precede_prediction_events() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    engine.register(1, |_| {}, RegisterOptions::new());
    let log = record(&mut engine);

    engine
        .platform_mut()
        .rects
        .insert(1, Rect::new(200.0, 200.0, 300.0, 300.0));
    engine.handle_batch(
        [mouse_at(250.0, 250.0), InputEvent::BoundsChanged { handle: 1 }],
        10,
    );

    let kinds: Vec<EventKind> = log.borrow().iter().map(ForesightEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ElementDataUpdated,
            EventKind::MouseTrajectoryUpdate,
            EventKind::CallbackInvoked,
            EventKind::CallbackCompleted,
        ]
    );
    assert!(log.borrow().iter().any(|e| matches!(
        e.data,
        EventData::ElementDataUpdated { updated_props, .. } if updated_props == UpdatedProps::BOUNDS
    )));
}

// ── Reactivation ───────────────────────────────────────────────────────

#[test]
fn reactivates_after_cooldown() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(
        1,
        |a| a.succeed(),
        RegisterOptions::new().reactivate_after_ms(1000),
    );

    engine.handle_input(mouse_at(50.0, 50.0), 0);
    assert_eq!(count(&log, EventKind::CallbackCompleted), 1);
    assert_eq!(
        engine.element(&1).unwrap().callback_info().reactivate_at_ms,
        Some(1000)
    );

    engine.handle_input(mouse_at(60.0, 60.0), 500);
    engine.advance(999);
    assert_eq!(invoked(&log).len(), 1);
    assert_eq!(count(&log, EventKind::ElementReactivated), 0);

    engine.advance(1000);
    assert_eq!(count(&log, EventKind::ElementReactivated), 1);
    assert!(engine.element(&1).unwrap().is_idle());

    engine.handle_input(mouse_at(55.0, 55.0), 1001);
    assert_eq!(engine.callback_hits().mouse.hover, 2);
}

#[test]
fn without_cooldown_an_element_never_refires() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    engine.register(1, |_| {}, RegisterOptions::new());
    engine.handle_input(mouse_at(50.0, 50.0), 0);
    engine.advance(1_000_000);
    engine.handle_input(mouse_at(51.0, 50.0), 1_000_001);
    assert_eq!(engine.callback_hits().total, 1);
    assert!(!engine.element(&1).unwrap().is_idle());
}

#[test]
fn explicit_reactivate() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let parked = Rc::new(RefCell::new(None));
    engine.register(1, parking(&parked), RegisterOptions::new());
    engine.handle_input(mouse_at(50.0, 50.0), 0);

    assert!(!engine.reactivate(1), "still running");
    parked.borrow_mut().take().unwrap().succeed();
    engine.advance(5);
    assert!(engine.reactivate(1));
    assert!(!engine.reactivate(1), "already idle");
    assert!(!engine.reactivate(42));

    engine.handle_input(mouse_at(50.0, 50.0), 10);
    assert_eq!(engine.callback_hits().mouse.hover, 2);
}

#[test]
fn unregister_on_callback_removes_after_settlement() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(
        1,
        |_| {},
        RegisterOptions::new().unregister_on_callback(true),
    );
    engine.handle_input(mouse_at(50.0, 50.0), 0);

    assert_eq!(engine.element_count(), 0);
    assert!(!engine.is_listening());
    assert!(log.borrow().iter().any(|e| matches!(
        e.data,
        EventData::ElementUnregistered {
            reason: UnregisterReason::CallbackCompleted,
            ..
        }
    )));
}

// ── Callback settlement ────────────────────────────────────────────────

#[test]
fn failures_are_reported_not_retried() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    engine.register(
        1,
        |a| a.fail("prefetch failed"),
        RegisterOptions::new().reactivate_after_ms(100),
    );
    engine.handle_input(mouse_at(50.0, 50.0), 0);

    let completed = log
        .borrow()
        .iter()
        .find_map(|e| match &e.data {
            EventData::CallbackCompleted {
                status,
                error_message,
                ..
            } => Some((*status, error_message.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        completed,
        (CallbackStatus::Error, Some("prefetch failed".to_owned()))
    );
    assert_eq!(invoked(&log).len(), 1);

    // Errors follow the normal reactivation path.
    engine.advance(100);
    assert!(engine.element(&1).unwrap().is_idle());
}

#[test]
fn completion_from_another_thread() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    let parked = Rc::new(RefCell::new(None));
    engine.register(1, parking(&parked), RegisterOptions::new());
    engine.handle_input(mouse_at(50.0, 50.0), 100);

    let completion = parked.borrow_mut().take().unwrap();
    std::thread::spawn(move || completion.succeed())
        .join()
        .unwrap();
    assert_eq!(count(&log, EventKind::CallbackCompleted), 0);

    engine.advance(350);
    let elapsed = log.borrow().iter().find_map(|e| match e.data {
        EventData::CallbackCompleted { elapsed_ms, .. } => Some(elapsed_ms),
        _ => None,
    });
    assert_eq!(elapsed, Some(250));
    let info = engine.element(&1).unwrap().callback_info().clone();
    assert_eq!(info.last_status, Some(CallbackStatus::Success));
    assert_eq!(info.last_runtime_ms, Some(250));
    assert!(!info.is_running_callback);
}

fn completions(log: &Log) -> Vec<(u32, CallbackStatus, Option<String>)> {
    log.borrow()
        .iter()
        .filter_map(|e| match &e.data {
            EventData::CallbackCompleted {
                element,
                status,
                error_message,
                ..
            } => Some((element.handle, *status, error_message.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn worker_panic_reports_failure() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    let parked = Rc::new(RefCell::new(None));
    engine.register(1, parking(&parked), RegisterOptions::new());
    engine.handle_input(mouse_at(50.0, 50.0), 0);

    let completion = parked.borrow_mut().take().unwrap();
    let joined = std::thread::spawn(move || {
        let _completion = completion;
        panic!("worker died");
    })
    .join();
    assert!(joined.is_err(), "worker should have panicked");

    engine.advance(10);
    assert_eq!(
        completions(&log),
        vec![(1, CallbackStatus::Error, Some("callback panicked".to_owned()))]
    );
    let info = engine.element(&1).unwrap().callback_info().clone();
    assert_eq!(info.last_status, Some(CallbackStatus::Error));
    assert!(!info.is_running_callback);
}

#[test]
fn synchronous_panic_stays_inside_the_engine() {
    let mut engine = engine_with(&[(1, SQUARE), (2, SQUARE)]);
    let log = record(&mut engine);
    engine.register(1, |_| panic!("sync callback threw"), RegisterOptions::new());
    engine.register(2, |a| a.succeed(), RegisterOptions::new());

    engine.handle_input(mouse_at(50.0, 50.0), 0);

    // The second winner of the batch still fires and both settle.
    assert_eq!(invoked(&log).len(), 2);
    assert_eq!(
        completions(&log),
        vec![
            (1, CallbackStatus::Error, Some("callback panicked".to_owned())),
            (2, CallbackStatus::Success, None),
        ]
    );
    assert!(!engine.element(&1).unwrap().callback_info().is_running_callback);
}

#[test]
fn panic_after_stashing_the_completion_still_settles() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let log = record(&mut engine);
    let parked = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&parked);
    engine.register(
        1,
        move |a: Activation<u32>| {
            *slot.borrow_mut() = Some(a.into_completion());
            panic!("failed after handing off");
        },
        RegisterOptions::new(),
    );

    engine.handle_input(mouse_at(50.0, 50.0), 0);
    assert_eq!(
        completions(&log),
        vec![(1, CallbackStatus::Error, Some("callback panicked".to_owned()))]
    );

    // A late success from the stashed completion is ignored.
    parked.borrow_mut().take().unwrap().succeed();
    engine.advance(5);
    assert_eq!(completions(&log).len(), 1);
}

// ── Scroll, tab, touch ─────────────────────────────────────────────────

#[test]
fn scroll_projects_pointer_along_dominant_axis() {
    let below = Rect::new(0.0, 180.0, 100.0, 260.0);
    let mut engine = engine_with(&[(1, below)]);
    let log = record(&mut engine);
    engine.register(1, |_| {}, RegisterOptions::new());

    engine.handle_input(mouse_at(50.0, 50.0), 0);
    engine.handle_input(
        InputEvent::Scroll {
            delta: Vec2::new(2.0, 30.0),
        },
        10,
    );

    assert_eq!(
        invoked(&log),
        vec![(1, CallbackHitType::Scroll(ScrollDirection::Down))]
    );
    assert_eq!(count(&log, EventKind::ScrollTrajectoryUpdate), 1);
}

#[test]
fn scroll_prediction_can_be_disabled() {
    let below = Rect::new(0.0, 180.0, 100.0, 260.0);
    let mut engine = engine_with(&[(1, below)]);
    engine.register(1, |_| {}, RegisterOptions::new());
    engine.alter_settings(&SettingsPatch::new().enable_scroll_prediction(false));

    engine.handle_input(mouse_at(50.0, 50.0), 0);
    engine.handle_input(
        InputEvent::Scroll {
            delta: Vec2::new(0.0, 30.0),
        },
        10,
    );
    assert_eq!(engine.callback_hits().total, 0);
}

#[test]
fn tab_fires_within_offset_in_travel_direction() {
    let mut engine = engine_with(&[(3, SQUARE), (4, SQUARE), (5, SQUARE)]);
    engine.platform_mut().order = vec![1, 2, 3, 4, 5];
    let log = record(&mut engine);
    for h in [3, 4, 5] {
        engine.register(h, |_| {}, RegisterOptions::new());
    }

    // Not a keyboard traversal.
    engine.handle_input(
        InputEvent::FocusChange {
            target: 2,
            shift_key: false,
            keyboard: false,
        },
        0,
    );
    assert!(invoked(&log).is_empty());

    engine.handle_input(
        InputEvent::FocusChange {
            target: 2,
            shift_key: false,
            keyboard: true,
        },
        10,
    );
    assert_eq!(
        invoked(&log),
        vec![
            (3, CallbackHitType::Tab(TabDirection::Forwards)),
            (4, CallbackHitType::Tab(TabDirection::Forwards)),
        ]
    );
}

#[test]
fn shift_tab_fires_reverse() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    engine.platform_mut().order = vec![1, 2, 3];
    engine.register(1, |_| {}, RegisterOptions::new());

    engine.handle_input(
        InputEvent::FocusChange {
            target: 3,
            shift_key: true,
            keyboard: true,
        },
        0,
    );
    assert_eq!(engine.callback_hits().tab.reverse, 1);
}

#[test]
fn viewport_strategy_on_touch_devices() {
    let mut engine = engine_with(&[(1, SQUARE), (2, SQUARE)]);
    let log = record(&mut engine);
    engine.register(1, |_| {}, RegisterOptions::new());
    engine.register(2, |_| {}, RegisterOptions::new());

    // Visible while on a mouse: only a data update.
    engine.handle_input(
        InputEvent::Intersection {
            handle: 1,
            is_intersecting: true,
        },
        0,
    );
    assert!(invoked(&log).is_empty());
    assert_eq!(count(&log, EventKind::ElementDataUpdated), 1);

    // Switching to touch fires elements already in view.
    engine.handle_input(
        InputEvent::PointerMove {
            point: Point::new(500.0, 500.0),
            device: DeviceStrategy::Touch,
        },
        10,
    );
    assert_eq!(count(&log, EventKind::DeviceStrategyChanged), 1);
    assert_eq!(invoked(&log), vec![(1, CallbackHitType::Viewport)]);

    // Entering the viewport fires directly.
    engine.handle_input(
        InputEvent::Intersection {
            handle: 2,
            is_intersecting: true,
        },
        20,
    );
    assert_eq!(invoked(&log).last().copied(), Some((2, CallbackHitType::Viewport)));
    assert_eq!(engine.callback_hits().viewport, 2);
}

#[test]
fn touch_start_strategy() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    engine.register(1, |_| {}, RegisterOptions::new().hit_slop(10.0));
    engine.alter_settings(
        &SettingsPatch::new().touch_device_strategy(TouchDeviceStrategy::TouchStart),
    );

    engine.handle_input(
        InputEvent::TouchStart {
            point: Point::new(200.0, 200.0),
        },
        0,
    );
    assert_eq!(engine.callback_hits().total, 0);
    assert_eq!(engine.device_strategy(), DeviceStrategy::Touch);

    engine.handle_input(
        InputEvent::TouchStart {
            point: Point::new(105.0, 105.0),
        },
        10,
    );
    assert_eq!(engine.callback_hits().touch, 1);
}

#[test]
fn pen_uses_touch_strategy() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    engine.register(1, |_| {}, RegisterOptions::new());
    engine.handle_input(
        InputEvent::PointerMove {
            point: Point::new(50.0, 50.0),
            device: DeviceStrategy::Pen,
        },
        0,
    );
    assert!(engine.device_strategy().is_touch_class());
    assert_eq!(engine.callback_hits().mouse.hover, 0);
}

// ── Settings and throttling ────────────────────────────────────────────

#[test]
fn settings_events_list_only_changed_keys() {
    let mut engine = engine_with(&[]);
    let log = record(&mut engine);

    assert!(engine
        .alter_settings(&SettingsPatch::new().tab_offset(2))
        .is_empty());
    assert_eq!(count(&log, EventKind::ManagerSettingsChanged), 0);

    let updated = engine.alter_settings(
        &SettingsPatch::new()
            .tab_offset(5)
            .scroll_margin(9999.0)
            .enable_tab_prediction(true),
    );
    let keys: Vec<SettingKey> = updated.iter().map(|u| u.key).collect();
    assert_eq!(keys, vec![SettingKey::TabOffset, SettingKey::ScrollMargin]);
    assert_eq!(engine.settings().scroll_margin, 300.0);

    let events = log.borrow();
    let [event] = events.as_slice() else {
        panic!("expected exactly one event, got {}", events.len());
    };
    match &event.data {
        EventData::ManagerSettingsChanged {
            updated_settings, ..
        } => assert_eq!(updated_settings, &updated),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn resize_refresh_is_trailing_throttled() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    engine.alter_settings(&SettingsPatch::new().resize_scroll_throttle_delay_ms(100));
    engine.register(1, |_| {}, RegisterOptions::new());
    let log = record(&mut engine);

    engine.handle_input(InputEvent::Resize, 0);
    let moved = Rect::new(10.0, 10.0, 110.0, 110.0);
    engine.platform_mut().rects.insert(1, moved);

    engine.handle_input(InputEvent::Resize, 50);
    engine.handle_input(InputEvent::Resize, 60);
    assert_eq!(engine.element(&1).unwrap().bounds.original_rect, SQUARE);

    engine.advance(99);
    assert_eq!(engine.element(&1).unwrap().bounds.original_rect, SQUARE);

    engine.advance(100);
    assert_eq!(engine.element(&1).unwrap().bounds.original_rect, moved);
    assert_eq!(count(&log, EventKind::ElementDataUpdated), 1);

    engine.advance(500);
    assert_eq!(count(&log, EventKind::ElementDataUpdated), 1);
}

#[test]
fn history_size_change_is_live() {
    let mut engine = engine_with(&[]);
    let updated = engine.alter_settings(&SettingsPatch::new().position_history_size(1));
    assert_eq!(updated[0].key, SettingKey::PositionHistorySize);
    assert_eq!(engine.settings().position_history_size, 2);
}

// ── Event bus and diagnostics ──────────────────────────────────────────

#[test]
fn abort_signal_unsubscribes_everything_at_once() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let seen = Rc::new(RefCell::new(0_u32));
    let controller = AbortController::new();
    for kind in [EventKind::ElementRegistered, EventKind::CallbackInvoked] {
        let seen = Rc::clone(&seen);
        engine.add_listener_with_signal(kind, move |_| *seen.borrow_mut() += 1, &controller.signal());
    }
    engine.register(1, |_| {}, RegisterOptions::new());
    assert_eq!(*seen.borrow(), 1);

    controller.abort();
    engine.handle_input(mouse_at(50.0, 50.0), 0);
    assert_eq!(*seen.borrow(), 1);
    assert_eq!(engine.callback_hits().total, 1);
}

#[test]
fn remove_listener_stops_delivery() {
    let mut engine = engine_with(&[(1, SQUARE)]);
    let seen = Rc::new(RefCell::new(0_u32));
    let counter = Rc::clone(&seen);
    let id = engine.add_listener(EventKind::ElementRegistered, move |_| {
        *counter.borrow_mut() += 1;
    });
    assert!(engine.remove_listener(id));
    engine.register(1, |_| {}, RegisterOptions::new());
    assert_eq!(*seen.borrow(), 0);
}

#[test]
fn snapshot_and_hit_counters() {
    let mut engine = engine_with(&[(1, SQUARE), (2, SQUARE)]);
    engine.register(1, |_| {}, RegisterOptions::new().meta("kind", "link"));
    engine.register(2, |_| {}, RegisterOptions::new());
    engine.handle_input(mouse_at(50.0, 50.0), 0);

    let data = engine.snapshot();
    assert_eq!(data.registered_elements.len(), 2);
    assert_eq!(data.registered_elements[0].meta.get("kind").map(String::as_str), Some("link"));
    assert_eq!(data.callback_hits.mouse.hover, 2);
    assert!(data.is_listening);
    assert_eq!(data.last_pointer, Some(Point::new(50.0, 50.0)));

    engine.reset_callback_hits();
    assert_eq!(engine.callback_hits().total, 0);
    assert_eq!(engine.registered_elements().count(), 2);
}
