// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use codespan_reporting::files::SimpleFile;
use tracing::{debug, info};

use crate::context::{Context, Level, MlsRange};
use crate::error::LoadErrors;
use crate::parse;
use crate::rules::{
    AvRule, AvRuleType, Conditional, DefaultRangeValue, DefaultRuleType, DefaultValue, FsUseType,
    Protocol, RoleAllow, TeRule, TeRuleType,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandleUnknown {
    Allow,
    Deny,
    Reject,
}

impl fmt::Display for HandleUnknown {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            HandleUnknown::Allow => "allow",
            HandleUnknown::Deny => "deny",
            HandleUnknown::Reject => "reject",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for HandleUnknown {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(HandleUnknown::Allow),
            "deny" => Ok(HandleUnknown::Deny),
            "reject" => Ok(HandleUnknown::Reject),
            _ => Err(()),
        }
    }
}

/// Policy-wide properties compared by the properties diff
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    pub version: Option<u32>,
    pub handle_unknown: Option<HandleUnknown>,
    pub mls: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeDecl {
    pub attributes: BTreeSet<String>,
    pub aliases: BTreeSet<String>,
    pub permissive: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDecl {
    pub roles: BTreeSet<String>,
    pub level: Option<Level>,
    pub range: Option<MlsRange>,
}

/// The matching key for an access vector rule.  Permissions live in the map
/// value so that duplicate statements merge.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AvKey {
    pub ruletype: AvRuleType,
    pub source: String,
    pub target: String,
    pub tclass: String,
    pub conditional: Option<Conditional>,
}

impl AvKey {
    pub fn rule(&self, perms: &BTreeSet<String>) -> AvRule {
        AvRule {
            ruletype: self.ruletype,
            source: self.source.clone(),
            target: self.target.clone(),
            tclass: self.tclass.clone(),
            perms: perms.clone(),
            conditional: self.conditional.clone(),
        }
    }
}

/// The matching key for a type_* rule.  The default type is the value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TeKey {
    pub ruletype: TeRuleType,
    pub source: String,
    pub target: String,
    pub tclass: String,
    pub filename: Option<String>,
    pub conditional: Option<Conditional>,
}

impl TeKey {
    pub fn rule(&self, default: &str) -> TeRule {
        TeRule {
            ruletype: self.ruletype,
            source: self.source.clone(),
            target: self.target.clone(),
            tclass: self.tclass.clone(),
            default: default.to_string(),
            filename: self.filename.clone(),
            conditional: self.conditional.clone(),
        }
    }
}

/// A fully loaded policy
///
/// All collections are ordered maps and sets keyed the way the differ matches
/// entries, so diffing is a linear merge walk.
#[derive(Clone, Debug, Default)]
pub struct SELinuxPolicy {
    pub properties: Properties,
    pub commons: BTreeMap<String, BTreeSet<String>>,
    // Class permissions include the inherited common's
    pub classes: BTreeMap<String, BTreeSet<String>>,
    pub booleans: BTreeMap<String, bool>,
    pub roles: BTreeMap<String, BTreeSet<String>>,
    pub types: BTreeMap<String, TypeDecl>,
    pub attributes: BTreeMap<String, BTreeSet<String>>,
    pub users: BTreeMap<String, UserDecl>,
    pub categories: BTreeMap<String, BTreeSet<String>>,
    pub sensitivities: BTreeMap<String, BTreeSet<String>>,
    pub levels: BTreeMap<String, BTreeSet<String>>,
    pub av_rules: BTreeMap<AvKey, BTreeSet<String>>,
    pub te_rules: BTreeMap<TeKey, String>,
    pub role_allows: BTreeSet<RoleAllow>,
    pub role_transitions: BTreeMap<(String, String, String), String>,
    pub range_transitions: BTreeMap<(String, String, String), MlsRange>,
    pub initial_sids: BTreeMap<String, Context>,
    pub fs_uses: BTreeMap<(FsUseType, String), Context>,
    pub genfscons: BTreeMap<(String, String, Option<String>), Context>,
    pub netifcons: BTreeMap<String, (Context, Context)>,
    pub nodecons: BTreeMap<(IpAddr, IpAddr), Context>,
    pub portcons: BTreeMap<(Protocol, u16, u16), Context>,
    pub polcaps: BTreeSet<String>,
    pub defaults: BTreeMap<(DefaultRuleType, String), (DefaultValue, Option<DefaultRangeValue>)>,
}

impl SELinuxPolicy {
    pub fn new() -> Self {
        SELinuxPolicy::default()
    }

    /// Load a policy from a policy source file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SELinuxPolicy, LoadErrors> {
        let path = path.as_ref();
        let policy_str = std::fs::read_to_string(path)?;
        let file = SimpleFile::new(path.display().to_string(), policy_str);
        let policy = parse::parse_policy(&file)?;
        info!(
            "loaded policy {}: {} types, {} rules",
            path.display(),
            policy.types.len(),
            policy.av_rules.len() + policy.te_rules.len()
        );
        debug!(
            "policy {}: {} classes, {} roles, {} users, {} booleans",
            path.display(),
            policy.classes.len(),
            policy.roles.len(),
            policy.users.len(),
            policy.booleans.len()
        );
        Ok(policy)
    }

    /// Merge an av rule into the policy, unioning permissions on key collision
    pub fn insert_av(&mut self, key: AvKey, perms: BTreeSet<String>) {
        self.av_rules.entry(key).or_default().extend(perms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_av_rules_merge() {
        let mut policy = SELinuxPolicy::new();
        let key = AvKey {
            ruletype: AvRuleType::Allow,
            source: "a_t".to_string(),
            target: "b_t".to_string(),
            tclass: "file".to_string(),
            conditional: None,
        };
        policy.insert_av(key.clone(), ["read".to_string()].iter().cloned().collect());
        policy.insert_av(key.clone(), ["write".to_string()].iter().cloned().collect());
        assert_eq!(policy.av_rules.len(), 1);
        let perms = &policy.av_rules[&key];
        assert_eq!(perms.len(), 2);
        assert_eq!(key.rule(perms).to_string(), "allow a_t b_t:file { read write };");
    }
}
