//! Employee hierarchy traversal.
//!
//! The manager relationship is held as an explicit adjacency map
//! (employee → manager) plus a reverse index (manager → direct reports).
//! Every traversal keeps a visited set, so malformed data containing a
//! cycle yields a truncated result instead of an endless loop.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use spendflow_shared::types::EmployeeId;

/// Snapshot of one company's manager relationships.
#[derive(Debug, Clone, Default)]
pub struct OrgChart {
    managers: HashMap<EmployeeId, EmployeeId>,
    reports: HashMap<EmployeeId, Vec<EmployeeId>>,
}

impl OrgChart {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chart from `(employee, manager)` pairs.
    ///
    /// Employees without a manager may be passed with `None`; they are
    /// roots and contribute no edge.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (EmployeeId, Option<EmployeeId>)>,
    {
        let mut chart = Self::new();
        for (employee, manager) in edges {
            if let Some(manager) = manager {
                chart.insert(employee, manager);
            }
        }
        chart
    }

    /// Records that `employee` reports to `manager`, replacing any
    /// previous manager.
    pub fn insert(&mut self, employee: EmployeeId, manager: EmployeeId) {
        if let Some(previous) = self.managers.insert(employee, manager) {
            if let Some(siblings) = self.reports.get_mut(&previous) {
                siblings.retain(|id| *id != employee);
            }
        }
        self.reports.entry(manager).or_default().push(employee);
    }

    /// Returns the direct manager of an employee.
    #[must_use]
    pub fn manager_of(&self, employee: EmployeeId) -> Option<EmployeeId> {
        self.managers.get(&employee).copied()
    }

    /// Returns the direct reports of a manager, in insertion order.
    #[must_use]
    pub fn direct_reports(&self, manager: EmployeeId) -> &[EmployeeId] {
        self.reports.get(&manager).map_or(&[], Vec::as_slice)
    }

    /// Number of employees that have a manager.
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Returns true if no manager relationship is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

/// One entry of a management chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    /// The manager.
    pub employee_id: EmployeeId,
    /// Distance from the employee, starting at 1 for the direct manager.
    pub level: usize,
}

/// Stateless traversals over an [`OrgChart`].
pub struct HierarchyResolver;

impl HierarchyResolver {
    /// Returns the management chain of `employee`, nearest manager first.
    ///
    /// Stops at the first manager already seen (including the employee
    /// itself), so the result never contains `employee` and never repeats.
    #[must_use]
    pub fn ancestors(chart: &OrgChart, employee: EmployeeId) -> Vec<EmployeeId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([employee]);
        let mut current = employee;

        while let Some(manager) = chart.manager_of(current) {
            if !visited.insert(manager) {
                break;
            }
            chain.push(manager);
            current = manager;
        }

        chain
    }

    /// Returns the management chain annotated with 1-based levels.
    #[must_use]
    pub fn chain_with_levels(chart: &OrgChart, employee: EmployeeId) -> Vec<ChainLink> {
        Self::ancestors(chart, employee)
            .into_iter()
            .enumerate()
            .map(|(idx, employee_id)| ChainLink {
                employee_id,
                level: idx + 1,
            })
            .collect()
    }

    /// Returns every strict descendant of `manager` in depth-first preorder.
    ///
    /// Each employee appears at most once and `manager` itself is excluded
    /// even when malformed data routes back to it.
    #[must_use]
    pub fn descendants(chart: &OrgChart, manager: EmployeeId) -> Vec<EmployeeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([manager]);
        let mut stack: Vec<EmployeeId> = chart.direct_reports(manager).iter().rev().copied().collect();

        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            result.push(next);
            stack.extend(chart.direct_reports(next).iter().rev().copied());
        }

        result
    }

    /// Returns true if making `new_manager` the manager of `employee` would
    /// close a loop in the chart.
    #[must_use]
    pub fn would_create_cycle(
        chart: &OrgChart,
        employee: EmployeeId,
        new_manager: EmployeeId,
    ) -> bool {
        employee == new_manager || Self::ancestors(chart, new_manager).contains(&employee)
    }
}
