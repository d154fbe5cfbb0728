/// PROPERTY-BASED TESTS: position update throttling
///
/// Key invariants:
/// 1. A recipient farther away never hears more often than a closer one
/// 2. A faster item is never updated less often than a slower one
/// 3. Items out of range or tucked into an inventory are never sent

use std::time::Duration;

use proptest::prelude::*;

use ballast_client::ClientConfig;
use ballast_server::{InterestThrottle, ThrottleConfig, UpdateInterval, UserKey};
use ballast_shared::{Item, NetEntityId, Vec2};
use ballast_test::{ids, init_logging, TestHarness, TestWorld, TICK};

const ITEM: NetEntityId = NetEntityId::new(5);

fn rank(interval: UpdateInterval) -> Duration {
    match interval {
        UpdateInterval::Never => Duration::MAX,
        UpdateInterval::After(interval) => interval,
    }
}

fn throttle_with_base(base: Duration) -> InterestThrottle {
    let mut throttle = InterestThrottle::new(ThrottleConfig::default());
    throttle.reset(ITEM);
    throttle.advance(base);
    throttle
}

fn moving_item(speed: f32) -> Item {
    let mut item = Item::new(ITEM, Vec2::ZERO);
    item.velocity = Vec2::new(speed, 0.0);
    item
}

proptest! {
    #[test]
    fn prop_interval_grows_with_distance(
        base_ms in 0u64..60_000,
        speed in 0.0f32..20.0,
        near in 0.0f32..8000.0,
        extra in 0.0f32..8000.0,
    ) {
        let throttle = throttle_with_base(Duration::from_millis(base_ms));
        let item = moving_item(speed);
        let closer = throttle.next_interval(&item, Some(Vec2::new(near, 0.0)));
        let farther = throttle.next_interval(&item, Some(Vec2::new(0.0, near + extra)));
        prop_assert!(rank(closer) <= rank(farther));
    }

    #[test]
    fn prop_interval_shrinks_with_speed(
        base_ms in 0u64..60_000,
        slow in 0.0f32..20.0,
        faster_by in 0.0f32..20.0,
        distance in 0.0f32..6000.0,
    ) {
        let throttle = throttle_with_base(Duration::from_millis(base_ms));
        let recipient = Some(Vec2::new(distance, 0.0));
        let slow_interval = throttle.next_interval(&moving_item(slow), recipient);
        let fast_interval = throttle.next_interval(&moving_item(slow + faster_by), recipient);
        prop_assert!(rank(fast_interval) <= rank(slow_interval));
    }

    #[test]
    fn prop_interval_grows_while_idle(
        first_ms in 0u64..40_000,
        more_ms in 0u64..40_000,
        distance in 0.0f32..6000.0,
    ) {
        let mut throttle = throttle_with_base(Duration::from_millis(first_ms));
        let item = moving_item(0.0);
        let recipient = Some(Vec2::new(distance, 0.0));
        let before = throttle.next_interval(&item, recipient);
        throttle.advance(Duration::from_millis(more_ms));
        let after = throttle.next_interval(&item, recipient);
        prop_assert!(rank(before) <= rank(after));
        prop_assert!(rank(after) <= Duration::from_secs(30) * 10 || after == UpdateInterval::Never);
    }

    #[test]
    fn prop_spectators_hear_at_most_twice_a_second(base_ms in 0u64..60_000, speed in 0.0f32..20.0) {
        let throttle = throttle_with_base(Duration::from_millis(base_ms));
        let interval = throttle.next_interval(&moving_item(speed), None);
        prop_assert!(rank(interval) >= Duration::from_millis(500));
    }
}

/// An item beyond the far bound gets no updates at all
#[test]
fn far_recipient_is_never_updated() {
    let throttle = throttle_with_base(Duration::from_secs(1));
    let interval = throttle.next_interval(&moving_item(0.0), Some(Vec2::new(5001.0, 0.0)));
    assert_eq!(interval, UpdateInterval::Never);
}

/// Items in an inventory have no position of their own to send
#[test]
fn contained_item_is_never_updated() {
    let world = TestWorld::build();
    let throttle = InterestThrottle::new(ThrottleConfig::default());
    let wrench = world.item(ids::WRENCH).unwrap();
    assert!(throttle.next_interval(wrench, Some(Vec2::ZERO)).is_never());
}

/// A teleport far away from the only player is never reported to them
#[test]
fn teleported_out_of_range_stays_unseen() {
    init_logging();
    let mut harness = TestHarness::new(TestWorld::build());
    let captain = UserKey::new(1);
    harness.connect(captain, "captain", Some(ids::CAPTAIN), ClientConfig::default());
    harness.run(TICK, 4);

    harness
        .server
        .move_item(ids::FLARE, Vec2::new(9000.0, 0.0), Vec2::ZERO, true)
        .unwrap();
    harness.run(TICK, 100);

    let seen = harness.client(captain).world().item(ids::FLARE).unwrap().position;
    assert_eq!(seen, Vec2::new(4000.0, 0.0));
    assert_eq!(
        harness
            .server
            .throttle()
            .state(ids::FLARE, captain)
            .map(|state| state.current_interval),
        Some(UpdateInterval::Never)
    );
}

/// A teleport next to the player reaches them on the very next tick
#[test]
fn teleport_in_range_is_reported_promptly() {
    init_logging();
    let mut harness = TestHarness::new(TestWorld::build());
    let captain = UserKey::new(1);
    harness.connect(captain, "captain", Some(ids::CAPTAIN), ClientConfig::default());
    harness.run(TICK, 100);

    harness
        .server
        .move_item(ids::TORCH, Vec2::new(12.0, 3.0), Vec2::ZERO, true)
        .unwrap();
    harness.step(TICK);

    let seen = harness.client(captain).world().item(ids::TORCH).unwrap().position;
    assert_eq!(seen, Vec2::new(12.0, 3.0));
}
