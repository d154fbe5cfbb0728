/// PROPERTY-BASED TESTS: inventory reconciliation never duplicates items
///
/// Random claims from two crew members, valid or not, are fed straight into
/// the reconciler. Key invariants:
/// 1. Every item sits in at most one slot and its parent link agrees
/// 2. A denied or fully rejected claim leaves the claimed inventory as it was
/// 3. Every inventory that changed is listed for broadcast

use std::collections::BTreeMap;

use proptest::prelude::*;

use ballast_server::{InventoryReconciler, ReconcileConfig, Requester};
use ballast_shared::{InventorySlotClaim, NetEntityId, World};
use ballast_test::{ids, TestWorld};

const INVENTORIES: [NetEntityId; 4] = [ids::CAPTAIN, ids::ENGINEER, ids::TOOLBOX, ids::CABINET];

fn requesters() -> [Requester; 2] {
    [
        Requester::new("captain", Some(ids::CAPTAIN)),
        Requester::new("engineer", Some(ids::ENGINEER)),
    ]
}

fn snapshot(world: &World) -> BTreeMap<NetEntityId, Vec<u16>> {
    INVENTORIES
        .iter()
        .map(|inventory| (*inventory, TestWorld::slots(world, *inventory)))
        .collect()
}

fn claim_strategy() -> impl Strategy<Value = (usize, usize, Vec<u16>)> {
    (
        0usize..2,
        0usize..4,
        prop::collection::vec(prop::sample::select(vec![0u16, 20, 40, 41, 42, 43, 44, 50, 999]), 4),
    )
}

proptest! {
    #[test]
    fn prop_items_stay_unique(claims in prop::collection::vec(claim_strategy(), 1..40)) {
        let mut world = TestWorld::build();
        let reconciler = InventoryReconciler::from_config(&ReconcileConfig::default());
        let requesters = requesters();

        for (who, inventory, slots) in claims {
            let inventory = INVENTORIES[inventory];
            let capacity = world.inventory(inventory).unwrap().capacity();
            let claim = InventorySlotClaim::new(TestWorld::claim(&slots[..capacity]));

            let before = snapshot(&world);
            let outcome = reconciler
                .reconcile(&mut world, inventory, &claim, &requesters[who])
                .unwrap();
            let after = snapshot(&world);

            prop_assert!(world.check_consistency().is_ok());
            prop_assert_eq!(outcome.broadcasts.first(), Some(&inventory));
            if outcome.access_denied {
                prop_assert_eq!(&before, &after);
            }
            for (id, slots) in &after {
                if before.get(id) != Some(slots) {
                    prop_assert!(outcome.broadcasts.contains(id));
                }
            }
        }
    }
}

/// Two crew members each claim the other's item for themselves; neither
/// gets it and nothing is duplicated
#[test]
fn crossed_claims_change_nothing() {
    let mut world = TestWorld::build();
    world.put_item(ids::WELDER, ids::ENGINEER, 0).unwrap();
    let reconciler = InventoryReconciler::from_config(&ReconcileConfig::default());
    let [captain, engineer] = requesters();

    let outcome = reconciler
        .reconcile(
            &mut world,
            ids::CAPTAIN,
            &InventorySlotClaim::new(TestWorld::claim(&[40, 42, 0, 0])),
            &captain,
        )
        .unwrap();
    assert!(!outcome.fully_accepted());
    let outcome = reconciler
        .reconcile(
            &mut world,
            ids::ENGINEER,
            &InventorySlotClaim::new(TestWorld::claim(&[42, 40, 0, 0])),
            &engineer,
        )
        .unwrap();
    assert!(!outcome.fully_accepted());

    assert_eq!(TestWorld::slots(&world, ids::CAPTAIN), vec![40, 0, 0, 0]);
    assert_eq!(TestWorld::slots(&world, ids::ENGINEER), vec![42, 0, 0, 0]);
    world.check_consistency().unwrap();
}
