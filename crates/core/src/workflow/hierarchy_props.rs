//! Property-based tests for HierarchyResolver.
//!
//! Manager maps are generated without any tree discipline, so cycles and
//! self-loops are common inputs.

use std::collections::HashSet;

use proptest::prelude::*;
use spendflow_shared::types::EmployeeId;

use crate::workflow::hierarchy::{HierarchyResolver, OrgChart};

/// Strategy for a company of `1..25` employees, each pointing at an
/// arbitrary (possibly absent, possibly cyclic) manager index.
fn arb_manager_map() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..25).prop_flat_map(|n| prop::collection::vec(prop::option::of(0..n), n))
}

fn build(map: &[Option<usize>]) -> (OrgChart, Vec<EmployeeId>) {
    let ids: Vec<EmployeeId> = map.iter().map(|_| EmployeeId::new()).collect();
    let chart = OrgChart::from_edges(
        map.iter()
            .enumerate()
            .map(|(i, manager)| (ids[i], manager.map(|m| ids[m]))),
    );
    (chart, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Ancestor chain terminates and never contains the employee
    // =========================================================================

    #[test]
    fn prop_ancestors_terminate_without_self(map in arb_manager_map()) {
        let (chart, ids) = build(&map);
        for id in &ids {
            let chain = HierarchyResolver::ancestors(&chart, *id);
            prop_assert!(chain.len() < ids.len());
            prop_assert!(!chain.contains(id));

            let unique: HashSet<_> = chain.iter().collect();
            prop_assert_eq!(unique.len(), chain.len());
        }
    }

    /// Each chain entry is the manager of the previous one.
    #[test]
    fn prop_ancestors_follow_manager_edges(map in arb_manager_map()) {
        let (chart, ids) = build(&map);
        for id in &ids {
            let mut current = *id;
            for manager in HierarchyResolver::ancestors(&chart, *id) {
                prop_assert_eq!(chart.manager_of(current), Some(manager));
                current = manager;
            }
        }
    }

    // =========================================================================
    // Descendants equal the fixed point of unioning direct reports
    // =========================================================================

    #[test]
    fn prop_descendants_fixed_point(map in arb_manager_map()) {
        let (chart, ids) = build(&map);
        for root in &ids {
            let mut closure: HashSet<EmployeeId> = HashSet::new();
            let mut frontier: Vec<EmployeeId> = chart.direct_reports(*root).to_vec();
            while let Some(next) = frontier.pop() {
                if next != *root && closure.insert(next) {
                    frontier.extend_from_slice(chart.direct_reports(next));
                }
            }

            let descendants = HierarchyResolver::descendants(&chart, *root);
            let unique: HashSet<EmployeeId> = descendants.iter().copied().collect();

            prop_assert_eq!(unique.len(), descendants.len());
            prop_assert!(!unique.contains(root));
            prop_assert_eq!(unique, closure);
        }
    }

    // =========================================================================
    // Cycle guard accepts only assignments that keep the chart acyclic
    // =========================================================================

    #[test]
    fn prop_accepted_assignment_keeps_chain_rooted(
        map in arb_manager_map(),
        employee in any::<prop::sample::Index>(),
        manager in any::<prop::sample::Index>(),
    ) {
        let (mut chart, ids) = build(&map);
        let employee = ids[employee.index(ids.len())];
        let manager = ids[manager.index(ids.len())];

        if !HierarchyResolver::would_create_cycle(&chart, employee, manager) {
            chart.insert(employee, manager);
            prop_assert!(!HierarchyResolver::ancestors(&chart, manager).contains(&manager));
            prop_assert!(!HierarchyResolver::descendants(&chart, employee).contains(&manager));
        }
    }
}
