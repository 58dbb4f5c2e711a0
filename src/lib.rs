// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
mod context;
mod diff;
pub mod error;
mod parse;
mod policy;
mod report;
mod rules;
mod sections;

#[cfg(test)]
mod test;

use std::path::Path;

use crate::error::LoadErrors;

pub use crate::diff::PolicyDifference;
pub use crate::policy::SELinuxPolicy;
pub use crate::report::Report;
pub use crate::sections::{Section, SectionSelection};

/// Load two policies and compute all differences between them
///
/// Policy 1 is the baseline; entries only in policy 2 are reported as added
/// and entries only in policy 1 as removed.  Both policies load before any
/// failure is reported, so one run surfaces the problems in both files.
pub fn diff_policies<P: AsRef<Path>>(
    policy1: P,
    policy2: P,
) -> Result<PolicyDifference, LoadErrors> {
    let mut errors = LoadErrors::new();
    let orig = load(policy1, &mut errors);
    let new = load(policy2, &mut errors);
    match (orig, new) {
        (Some(orig), Some(new)) => Ok(PolicyDifference::new(&orig, &new)),
        _ => Err(errors),
    }
}

fn load<P: AsRef<Path>>(path: P, errors: &mut LoadErrors) -> Option<SELinuxPolicy> {
    match SELinuxPolicy::from_file(path) {
        Ok(policy) => Some(policy),
        Err(e) => {
            errors.append(e);
            None
        }
    }
}
