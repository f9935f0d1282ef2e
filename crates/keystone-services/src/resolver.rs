//! Constructor selection.

use crate::capability::{CapabilityId, Param};
use crate::descriptor::{Constructor, Implementation};
use crate::error::{ServiceError, ServiceResult};

/// Pick the constructor the container will invoke for `implementation`.
///
/// Constructors are tried in ascending parameter count (declaration order
/// breaks ties); the first one whose parameters are all capabilities wins.
///
/// # Errors
///
/// Returns [`ServiceError::NoEligibleConstructor`] if every constructor takes
/// at least one plain value parameter, or if none are declared.
pub fn select_constructor(implementation: &Implementation) -> ServiceResult<&Constructor> {
    let mut candidates: Vec<&Constructor> = implementation.constructors().iter().collect();
    candidates.sort_by_key(|constructor| constructor.arity());

    candidates
        .into_iter()
        .find(|constructor| {
            constructor
                .params()
                .iter()
                .all(|param| matches!(param, Param::Capability(_)))
        })
        .ok_or(ServiceError::NoEligibleConstructor {
            implementation: implementation.name(),
        })
}

/// Ordered capability parameters of the selected constructor.
///
/// # Errors
///
/// Same as [`select_constructor`].
pub fn dependencies_of(implementation: &Implementation) -> ServiceResult<Vec<CapabilityId>> {
    Ok(select_constructor(implementation)?.capabilities().collect())
}
