//! Expense visibility.
//!
//! Admins see every expense of their company, managers see their own and
//! those of their whole reporting subtree, everyone else sees their own.

use std::collections::HashSet;

use spendflow_shared::types::EmployeeId;

use crate::workflow::hierarchy::{HierarchyResolver, OrgChart};
use crate::workflow::types::EmployeeRole;

/// Set of expense owners a viewer may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseScope {
    /// Every expense of the viewer's company.
    Company,
    /// Expenses owned by any of these employees (viewer included).
    Team(HashSet<EmployeeId>),
    /// Only the viewer's own expenses.
    Own(EmployeeId),
}

impl ExpenseScope {
    /// Resolves the scope of `viewer` with the given role.
    #[must_use]
    pub fn for_viewer(chart: &OrgChart, viewer: EmployeeId, role: EmployeeRole) -> Self {
        match role {
            EmployeeRole::Admin => Self::Company,
            EmployeeRole::Manager => {
                let mut team: HashSet<EmployeeId> =
                    HierarchyResolver::descendants(chart, viewer).into_iter().collect();
                team.insert(viewer);
                Self::Team(team)
            }
            EmployeeRole::Employee => Self::Own(viewer),
        }
    }

    /// Returns true if an expense owned by `owner` is visible.
    ///
    /// Company membership is checked by the caller.
    #[must_use]
    pub fn includes(&self, owner: EmployeeId) -> bool {
        match self {
            Self::Company => true,
            Self::Team(members) => members.contains(&owner),
            Self::Own(viewer) => *viewer == owner,
        }
    }

    /// Returns the owners to filter on, or `None` for the whole company.
    #[must_use]
    pub fn owner_filter(&self) -> Option<Vec<EmployeeId>> {
        match self {
            Self::Company => None,
            Self::Team(members) => Some(members.iter().copied().collect()),
            Self::Own(viewer) => Some(vec![*viewer]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> (OrgChart, [EmployeeId; 4]) {
        // director <- manager <- employee, outsider has no manager
        let ids = [
            EmployeeId::new(),
            EmployeeId::new(),
            EmployeeId::new(),
            EmployeeId::new(),
        ];
        let chart = OrgChart::from_edges([(ids[1], Some(ids[0])), (ids[2], Some(ids[1]))]);
        (chart, ids)
    }

    #[test]
    fn test_admin_sees_company() {
        let (chart, ids) = org();
        let scope = ExpenseScope::for_viewer(&chart, ids[3], EmployeeRole::Admin);
        assert_eq!(scope, ExpenseScope::Company);
        assert!(scope.includes(ids[2]));
        assert!(scope.owner_filter().is_none());
    }

    #[test]
    fn test_manager_sees_subtree_and_self() {
        let (chart, ids) = org();
        let scope = ExpenseScope::for_viewer(&chart, ids[0], EmployeeRole::Manager);
        assert!(scope.includes(ids[0]));
        assert!(scope.includes(ids[1]));
        assert!(scope.includes(ids[2]));
        assert!(!scope.includes(ids[3]));
        assert_eq!(scope.owner_filter().map(|v| v.len()), Some(3));
    }

    #[test]
    fn test_mid_manager_does_not_see_up() {
        let (chart, ids) = org();
        let scope = ExpenseScope::for_viewer(&chart, ids[1], EmployeeRole::Manager);
        assert!(!scope.includes(ids[0]));
        assert!(scope.includes(ids[2]));
    }

    #[test]
    fn test_employee_sees_own() {
        let (chart, ids) = org();
        let scope = ExpenseScope::for_viewer(&chart, ids[2], EmployeeRole::Employee);
        assert!(scope.includes(ids[2]));
        assert!(!scope.includes(ids[1]));
        assert_eq!(scope.owner_filter(), Some(vec![ids[2]]));
    }
}
