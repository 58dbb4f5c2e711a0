// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT

//! Semantic difference computation between two loaded policies
//!
//! Every category yields a Delta: the entries only in policy 2 (added), only
//! in policy 1 (removed), and the entries present in both whose value
//! changed (modified).  A Modified* record always carries a non-empty
//! change, so an entry lands in exactly one of added, removed, modified or
//! unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use tracing::debug;

use crate::context::{Context, Level, MlsRange};
use crate::policy::{HandleUnknown, SELinuxPolicy};
use crate::rules::{
    AvRule, AvRuleType, DefaultRangeValue, DefaultRule, DefaultRuleType, DefaultValue, FsUse,
    FsUseType, Genfscon, InitialSid, Netifcon, Nodecon, Portcon, Protocol, RangeTransition,
    RoleAllow, RoleTransition, TeRule, TeRuleType,
};

/// The added/removed/modified triple for one difference category
#[derive(Clone, Debug)]
pub struct Delta<T: Ord, M: Ord> {
    pub added: BTreeSet<T>,
    pub removed: BTreeSet<T>,
    pub modified: BTreeSet<M>,
}

impl<T: Ord, M: Ord> Delta<T, M> {
    pub fn new() -> Self {
        Delta {
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            modified: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.removed.len(), self.modified.len())
    }
}

impl<T: Ord, M: Ord> Default for Delta<T, M> {
    fn default() -> Self {
        Delta::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedProperty {
    pub property: String,
    pub added: String,
    pub removed: String,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedCommon {
    pub name: String,
    pub added_perms: BTreeSet<String>,
    pub removed_perms: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedClass {
    pub name: String,
    pub added_perms: BTreeSet<String>,
    pub removed_perms: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedBoolean {
    pub name: String,
    pub added_state: bool,
    pub removed_state: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedRole {
    pub name: String,
    pub added_types: BTreeSet<String>,
    pub removed_types: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedType {
    pub name: String,
    pub added_attributes: BTreeSet<String>,
    pub removed_attributes: BTreeSet<String>,
    pub added_aliases: BTreeSet<String>,
    pub removed_aliases: BTreeSet<String>,
    pub modified_permissive: bool,
    // The permissive state in policy 1, so a toggle renders as added or
    // removed correctly
    pub was_permissive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedAttribute {
    pub name: String,
    pub added_types: BTreeSet<String>,
    pub removed_types: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedUser {
    pub name: String,
    pub added_roles: BTreeSet<String>,
    pub removed_roles: BTreeSet<String>,
    pub added_level: Option<Level>,
    pub removed_level: Option<Level>,
    pub added_range: Option<MlsRange>,
    pub removed_range: Option<MlsRange>,
}

impl ModifiedUser {
    pub fn level_changed(&self) -> bool {
        self.added_level.is_some() || self.removed_level.is_some()
    }

    pub fn range_changed(&self) -> bool {
        self.added_range.is_some() || self.removed_range.is_some()
    }
}

/// Alias changes for categories and sensitivities
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedAliases {
    pub name: String,
    pub added_aliases: BTreeSet<String>,
    pub removed_aliases: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedLevel {
    pub sensitivity: String,
    pub added_categories: BTreeSet<String>,
    pub removed_categories: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedAvRule {
    pub rule: AvRule,
    pub added_perms: BTreeSet<String>,
    pub removed_perms: BTreeSet<String>,
    pub matched_perms: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedTeRule {
    pub rule: TeRule,
    pub added_default: String,
    pub removed_default: String,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedRoleTransition {
    pub rule: RoleTransition,
    pub added_default: String,
    pub removed_default: String,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedRangeTransition {
    pub rule: RangeTransition,
    pub added_range: MlsRange,
    pub removed_range: MlsRange,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedInitialSid {
    pub name: String,
    pub added_context: Context,
    pub removed_context: Context,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedFsUse {
    pub ruletype: FsUseType,
    pub fs: String,
    pub added_context: Context,
    pub removed_context: Context,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedGenfscon {
    pub fs: String,
    pub path: String,
    pub filetype: Option<String>,
    pub added_context: Context,
    pub removed_context: Context,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedNetifcon {
    pub netif: String,
    pub added_context: Option<Context>,
    pub removed_context: Option<Context>,
    pub added_packet: Option<Context>,
    pub removed_packet: Option<Context>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedNodecon {
    pub address: IpAddr,
    pub netmask: IpAddr,
    pub added_context: Context,
    pub removed_context: Context,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedPortcon {
    pub protocol: Protocol,
    pub low: u16,
    pub high: u16,
    pub added_context: Context,
    pub removed_context: Context,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModifiedDefault {
    pub ruletype: DefaultRuleType,
    pub tclass: String,
    // Policy 2 values, plus the policy 1 value where it changed
    pub default: DefaultValue,
    pub old_default: Option<DefaultValue>,
    pub range: Option<DefaultRangeValue>,
    pub old_range: Option<DefaultRangeValue>,
}

/// All differences between two policies
#[derive(Clone, Debug, Default)]
pub struct PolicyDifference {
    pub properties: BTreeSet<ModifiedProperty>,
    pub commons: Delta<String, ModifiedCommon>,
    pub classes: Delta<String, ModifiedClass>,
    pub booleans: Delta<String, ModifiedBoolean>,
    pub roles: Delta<String, ModifiedRole>,
    pub types: Delta<String, ModifiedType>,
    pub attributes: Delta<String, ModifiedAttribute>,
    pub users: Delta<String, ModifiedUser>,
    pub categories: Delta<String, ModifiedAliases>,
    pub sensitivities: Delta<String, ModifiedAliases>,
    pub levels: Delta<Level, ModifiedLevel>,
    pub allows: Delta<AvRule, ModifiedAvRule>,
    pub neverallows: Delta<AvRule, ModifiedAvRule>,
    pub auditallows: Delta<AvRule, ModifiedAvRule>,
    pub dontaudits: Delta<AvRule, ModifiedAvRule>,
    pub type_transitions: Delta<TeRule, ModifiedTeRule>,
    pub type_changes: Delta<TeRule, ModifiedTeRule>,
    pub type_members: Delta<TeRule, ModifiedTeRule>,
    pub role_allows: Delta<RoleAllow, RoleAllow>,
    pub role_transitions: Delta<RoleTransition, ModifiedRoleTransition>,
    pub range_transitions: Delta<RangeTransition, ModifiedRangeTransition>,
    pub initial_sids: Delta<InitialSid, ModifiedInitialSid>,
    pub fs_uses: Delta<FsUse, ModifiedFsUse>,
    pub genfscons: Delta<Genfscon, ModifiedGenfscon>,
    pub netifcons: Delta<Netifcon, ModifiedNetifcon>,
    pub nodecons: Delta<Nodecon, ModifiedNodecon>,
    pub portcons: Delta<Portcon, ModifiedPortcon>,
    pub polcaps: Delta<String, String>,
    pub defaults: Delta<DefaultRule, ModifiedDefault>,
}

// Walk two maps, classifying each key as added, removed or (via the modified
// callback, which returns None for unchanged entries) modified
fn map_delta<K, V, T, M, I, F>(
    orig: &BTreeMap<K, V>,
    new: &BTreeMap<K, V>,
    item: I,
    modified: F,
) -> Delta<T, M>
where
    K: Ord,
    T: Ord,
    M: Ord,
    I: Fn(&K, &V) -> T,
    F: Fn(&K, &V, &V) -> Option<M>,
{
    let mut delta = Delta::new();
    for (key, value) in new {
        match orig.get(key) {
            Some(old) => {
                if let Some(m) = modified(key, old, value) {
                    delta.modified.insert(m);
                }
            }
            None => {
                delta.added.insert(item(key, value));
            }
        }
    }
    for (key, value) in orig {
        if !new.contains_key(key) {
            delta.removed.insert(item(key, value));
        }
    }
    delta
}

// Added/removed split of two sets, with the intersection for rule rendering
fn set_split<T: Clone + Ord>(
    orig: &BTreeSet<T>,
    new: &BTreeSet<T>,
) -> (BTreeSet<T>, BTreeSet<T>, BTreeSet<T>) {
    let added = new.difference(orig).cloned().collect();
    let removed = orig.difference(new).cloned().collect();
    let matched = orig.intersection(new).cloned().collect();
    (added, removed, matched)
}

fn set_delta<T: Clone + Ord, M: Ord>(orig: &BTreeSet<T>, new: &BTreeSet<T>) -> Delta<T, M> {
    let mut delta = Delta::new();
    let (added, removed, _) = set_split(orig, new);
    delta.added = added;
    delta.removed = removed;
    delta
}

fn changed<T: Clone + PartialEq>(old: &T, new: &T) -> (Option<T>, Option<T>) {
    if old == new {
        (None, None)
    } else {
        (Some(new.clone()), Some(old.clone()))
    }
}

impl PolicyDifference {
    /// Compute all differences between two policies
    pub fn new(orig: &SELinuxPolicy, new: &SELinuxPolicy) -> Self {
        let diff = PolicyDifference {
            properties: properties_diff(orig, new),
            commons: map_delta(&orig.commons, &new.commons, name_of, |name, old, new| {
                let (added_perms, removed_perms, _) = set_split(old, new);
                if added_perms.is_empty() && removed_perms.is_empty() {
                    None
                } else {
                    Some(ModifiedCommon {
                        name: name.clone(),
                        added_perms,
                        removed_perms,
                    })
                }
            }),
            classes: map_delta(&orig.classes, &new.classes, name_of, |name, old, new| {
                let (added_perms, removed_perms, _) = set_split(old, new);
                if added_perms.is_empty() && removed_perms.is_empty() {
                    None
                } else {
                    Some(ModifiedClass {
                        name: name.clone(),
                        added_perms,
                        removed_perms,
                    })
                }
            }),
            booleans: map_delta(&orig.booleans, &new.booleans, name_of, |name, old, new| {
                if old == new {
                    None
                } else {
                    Some(ModifiedBoolean {
                        name: name.clone(),
                        added_state: *new,
                        removed_state: *old,
                    })
                }
            }),
            roles: map_delta(&orig.roles, &new.roles, name_of, |name, old, new| {
                let (added_types, removed_types, _) = set_split(old, new);
                if added_types.is_empty() && removed_types.is_empty() {
                    None
                } else {
                    Some(ModifiedRole {
                        name: name.clone(),
                        added_types,
                        removed_types,
                    })
                }
            }),
            types: map_delta(&orig.types, &new.types, name_of, |name, old, new| {
                let (added_attributes, removed_attributes, _) =
                    set_split(&old.attributes, &new.attributes);
                let (added_aliases, removed_aliases, _) = set_split(&old.aliases, &new.aliases);
                let modified_permissive = old.permissive != new.permissive;
                if added_attributes.is_empty()
                    && removed_attributes.is_empty()
                    && added_aliases.is_empty()
                    && removed_aliases.is_empty()
                    && !modified_permissive
                {
                    None
                } else {
                    Some(ModifiedType {
                        name: name.clone(),
                        added_attributes,
                        removed_attributes,
                        added_aliases,
                        removed_aliases,
                        modified_permissive,
                        was_permissive: old.permissive,
                    })
                }
            }),
            attributes: map_delta(
                &orig.attributes,
                &new.attributes,
                name_of,
                |name, old, new| {
                    let (added_types, removed_types, _) = set_split(old, new);
                    if added_types.is_empty() && removed_types.is_empty() {
                        None
                    } else {
                        Some(ModifiedAttribute {
                            name: name.clone(),
                            added_types,
                            removed_types,
                        })
                    }
                },
            ),
            users: map_delta(&orig.users, &new.users, name_of, |name, old, new| {
                let (added_roles, removed_roles, _) = set_split(&old.roles, &new.roles);
                let (added_level, removed_level) = changed(&old.level, &new.level);
                let (added_range, removed_range) = changed(&old.range, &new.range);
                if added_roles.is_empty()
                    && removed_roles.is_empty()
                    && added_level.is_none()
                    && added_range.is_none()
                {
                    None
                } else {
                    Some(ModifiedUser {
                        name: name.clone(),
                        added_roles,
                        removed_roles,
                        added_level: added_level.flatten(),
                        removed_level: removed_level.flatten(),
                        added_range: added_range.flatten(),
                        removed_range: removed_range.flatten(),
                    })
                }
            }),
            categories: aliases_delta(&orig.categories, &new.categories),
            sensitivities: aliases_delta(&orig.sensitivities, &new.sensitivities),
            levels: map_delta(
                &orig.levels,
                &new.levels,
                |sens, cats| Level {
                    sensitivity: sens.clone(),
                    categories: cats.clone(),
                },
                |sens, old, new| {
                    let (added_categories, removed_categories, _) = set_split(old, new);
                    if added_categories.is_empty() && removed_categories.is_empty() {
                        None
                    } else {
                        Some(ModifiedLevel {
                            sensitivity: sens.clone(),
                            added_categories,
                            removed_categories,
                        })
                    }
                },
            ),
            allows: av_delta(orig, new, AvRuleType::Allow),
            neverallows: av_delta(orig, new, AvRuleType::Neverallow),
            auditallows: av_delta(orig, new, AvRuleType::Auditallow),
            dontaudits: av_delta(orig, new, AvRuleType::Dontaudit),
            type_transitions: te_delta(orig, new, TeRuleType::TypeTransition),
            type_changes: te_delta(orig, new, TeRuleType::TypeChange),
            type_members: te_delta(orig, new, TeRuleType::TypeMember),
            role_allows: set_delta(&orig.role_allows, &new.role_allows),
            role_transitions: map_delta(
                &orig.role_transitions,
                &new.role_transitions,
                |key, default| role_transition(key, default),
                |key, old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedRoleTransition {
                            rule: role_transition(key, new),
                            added_default: new.clone(),
                            removed_default: old.clone(),
                        })
                    }
                },
            ),
            range_transitions: map_delta(
                &orig.range_transitions,
                &new.range_transitions,
                |key, range| range_transition(key, range),
                |key, old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedRangeTransition {
                            rule: range_transition(key, new),
                            added_range: new.clone(),
                            removed_range: old.clone(),
                        })
                    }
                },
            ),
            initial_sids: map_delta(
                &orig.initial_sids,
                &new.initial_sids,
                |name, context| InitialSid {
                    name: name.clone(),
                    context: context.clone(),
                },
                |name, old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedInitialSid {
                            name: name.clone(),
                            added_context: new.clone(),
                            removed_context: old.clone(),
                        })
                    }
                },
            ),
            fs_uses: map_delta(
                &orig.fs_uses,
                &new.fs_uses,
                |(ruletype, fs), context| FsUse {
                    ruletype: *ruletype,
                    fs: fs.clone(),
                    context: context.clone(),
                },
                |(ruletype, fs), old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedFsUse {
                            ruletype: *ruletype,
                            fs: fs.clone(),
                            added_context: new.clone(),
                            removed_context: old.clone(),
                        })
                    }
                },
            ),
            genfscons: map_delta(
                &orig.genfscons,
                &new.genfscons,
                |(fs, path, filetype), context| Genfscon {
                    fs: fs.clone(),
                    path: path.clone(),
                    filetype: filetype.clone(),
                    context: context.clone(),
                },
                |(fs, path, filetype), old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedGenfscon {
                            fs: fs.clone(),
                            path: path.clone(),
                            filetype: filetype.clone(),
                            added_context: new.clone(),
                            removed_context: old.clone(),
                        })
                    }
                },
            ),
            netifcons: map_delta(
                &orig.netifcons,
                &new.netifcons,
                |netif, (context, packet)| Netifcon {
                    netif: netif.clone(),
                    context: context.clone(),
                    packet: packet.clone(),
                },
                |netif, old, new| {
                    let (added_context, removed_context) = changed(&old.0, &new.0);
                    let (added_packet, removed_packet) = changed(&old.1, &new.1);
                    if added_context.is_none() && added_packet.is_none() {
                        None
                    } else {
                        Some(ModifiedNetifcon {
                            netif: netif.clone(),
                            added_context,
                            removed_context,
                            added_packet,
                            removed_packet,
                        })
                    }
                },
            ),
            nodecons: map_delta(
                &orig.nodecons,
                &new.nodecons,
                |(address, netmask), context| Nodecon {
                    address: *address,
                    netmask: *netmask,
                    context: context.clone(),
                },
                |(address, netmask), old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedNodecon {
                            address: *address,
                            netmask: *netmask,
                            added_context: new.clone(),
                            removed_context: old.clone(),
                        })
                    }
                },
            ),
            portcons: map_delta(
                &orig.portcons,
                &new.portcons,
                |(protocol, low, high), context| Portcon {
                    protocol: *protocol,
                    low: *low,
                    high: *high,
                    context: context.clone(),
                },
                |(protocol, low, high), old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedPortcon {
                            protocol: *protocol,
                            low: *low,
                            high: *high,
                            added_context: new.clone(),
                            removed_context: old.clone(),
                        })
                    }
                },
            ),
            polcaps: set_delta(&orig.polcaps, &new.polcaps),
            defaults: map_delta(
                &orig.defaults,
                &new.defaults,
                |(ruletype, tclass), (default, range)| DefaultRule {
                    ruletype: *ruletype,
                    tclass: tclass.clone(),
                    default: *default,
                    range: *range,
                },
                |(ruletype, tclass), old, new| {
                    if old == new {
                        None
                    } else {
                        Some(ModifiedDefault {
                            ruletype: *ruletype,
                            tclass: tclass.clone(),
                            default: new.0,
                            old_default: (old.0 != new.0).then_some(old.0),
                            range: new.1,
                            old_range: if old.1 != new.1 { old.1 } else { None },
                        })
                    }
                },
            ),
        };
        // The modified sets never contain empty deltas; assert the cheap
        // cases in debug builds
        debug_assert!(diff
            .booleans
            .modified
            .iter()
            .all(|m| m.added_state != m.removed_state));
        debug!(
            "computed policy difference: {} type changes, {} allow changes",
            diff.types.counts().0 + diff.types.counts().1 + diff.types.counts().2,
            diff.allows.counts().0 + diff.allows.counts().1 + diff.allows.counts().2
        );
        diff
    }
}

fn name_of<V>(name: &String, _: &V) -> String {
    name.clone()
}

fn properties_diff(orig: &SELinuxPolicy, new: &SELinuxPolicy) -> BTreeSet<ModifiedProperty> {
    let mut modified = BTreeSet::new();
    if orig.properties.version != new.properties.version {
        modified.insert(ModifiedProperty {
            property: "version".to_string(),
            added: display_version(new.properties.version),
            removed: display_version(orig.properties.version),
        });
    }
    if orig.properties.handle_unknown != new.properties.handle_unknown {
        modified.insert(ModifiedProperty {
            property: "handle_unknown".to_string(),
            added: display_handle_unknown(new.properties.handle_unknown),
            removed: display_handle_unknown(orig.properties.handle_unknown),
        });
    }
    if orig.properties.mls != new.properties.mls {
        modified.insert(ModifiedProperty {
            property: "MLS".to_string(),
            added: new.properties.mls.to_string(),
            removed: orig.properties.mls.to_string(),
        });
    }
    modified
}

fn display_version(version: Option<u32>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

fn display_handle_unknown(value: Option<HandleUnknown>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

fn aliases_delta(
    orig: &BTreeMap<String, BTreeSet<String>>,
    new: &BTreeMap<String, BTreeSet<String>>,
) -> Delta<String, ModifiedAliases> {
    map_delta(orig, new, name_of, |name, old, new| {
        let (added_aliases, removed_aliases, _) = set_split(old, new);
        if added_aliases.is_empty() && removed_aliases.is_empty() {
            None
        } else {
            Some(ModifiedAliases {
                name: name.clone(),
                added_aliases,
                removed_aliases,
            })
        }
    })
}

fn av_delta(
    orig: &SELinuxPolicy,
    new: &SELinuxPolicy,
    ruletype: AvRuleType,
) -> Delta<AvRule, ModifiedAvRule> {
    let orig_rules: BTreeMap<_, _> = orig
        .av_rules
        .iter()
        .filter(|(key, _)| key.ruletype == ruletype)
        .collect();
    let new_rules: BTreeMap<_, _> = new
        .av_rules
        .iter()
        .filter(|(key, _)| key.ruletype == ruletype)
        .collect();
    map_delta(
        &orig_rules,
        &new_rules,
        |key, perms| key.rule(perms),
        |key, old, new| {
            let (added_perms, removed_perms, matched_perms) = set_split(old, new);
            if added_perms.is_empty() && removed_perms.is_empty() {
                None
            } else {
                Some(ModifiedAvRule {
                    rule: key.rule(&matched_perms),
                    added_perms,
                    removed_perms,
                    matched_perms,
                })
            }
        },
    )
}

fn te_delta(
    orig: &SELinuxPolicy,
    new: &SELinuxPolicy,
    ruletype: TeRuleType,
) -> Delta<TeRule, ModifiedTeRule> {
    let orig_rules: BTreeMap<_, _> = orig
        .te_rules
        .iter()
        .filter(|(key, _)| key.ruletype == ruletype)
        .collect();
    let new_rules: BTreeMap<_, _> = new
        .te_rules
        .iter()
        .filter(|(key, _)| key.ruletype == ruletype)
        .collect();
    map_delta(
        &orig_rules,
        &new_rules,
        |key, default| key.rule(default),
        |key, old, new| {
            if old == new {
                None
            } else {
                Some(ModifiedTeRule {
                    rule: key.rule(new),
                    added_default: new.to_string(),
                    removed_default: old.to_string(),
                })
            }
        },
    )
}

fn role_transition(key: &(String, String, String), default: &str) -> RoleTransition {
    RoleTransition {
        source: key.0.clone(),
        target: key.1.clone(),
        tclass: key.2.clone(),
        default: default.to_string(),
    }
}

fn range_transition(key: &(String, String, String), range: &MlsRange) -> RangeTransition {
    RangeTransition {
        source: key.0.clone(),
        target: key.1.clone(),
        tclass: key.2.clone(),
        range: range.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_policy;
    use codespan_reporting::files::SimpleFile;

    fn policy(source: &str) -> SELinuxPolicy {
        let file = SimpleFile::new("test.conf".to_string(), source.to_string());
        parse_policy(&file).expect("policy should parse")
    }

    #[test]
    fn identical_policies_have_no_differences() {
        let source = "type foo_t;
             role bar_r types foo_t;
             allow foo_t foo_t:file read;
             portcon tcp 80 system_u:object_r:http_port_t;
            ";
        let diff = PolicyDifference::new(&policy(source), &policy(source));
        assert!(diff.properties.is_empty());
        assert!(diff.types.is_empty());
        assert!(diff.roles.is_empty());
        assert!(diff.allows.is_empty());
        assert!(diff.portcons.is_empty());
    }

    #[test]
    fn added_and_removed_components() {
        let orig = policy("type foo_t;\nrole bar_r;\n");
        let new = policy("type foo_t;\ntype baz_t;\n");
        let diff = PolicyDifference::new(&orig, &new);
        assert!(diff.types.added.contains("baz_t"));
        assert!(diff.types.removed.is_empty());
        assert!(diff.roles.removed.contains("bar_r"));
        assert!(diff.roles.added.is_empty());
        assert!(diff.types.modified.is_empty());
    }

    #[test]
    fn modified_class_perms() {
        let orig = policy("class file { read write };\n");
        let new = policy("class file { read create };\n");
        let diff = PolicyDifference::new(&orig, &new);
        let modified = diff.classes.modified.iter().next().unwrap();
        assert_eq!(modified.name, "file");
        assert!(modified.added_perms.contains("create"));
        assert!(modified.removed_perms.contains("write"));
        assert_eq!(diff.classes.counts(), (0, 0, 1));
    }

    #[test]
    fn modified_boolean_state() {
        let orig = policy("bool secure_mode false;\n");
        let new = policy("bool secure_mode true;\n");
        let diff = PolicyDifference::new(&orig, &new);
        let modified = diff.booleans.modified.iter().next().unwrap();
        assert!(modified.added_state);
        assert!(!modified.removed_state);
    }

    #[test]
    fn modified_type_permissive_and_aliases() {
        let orig = policy("type foo_t;\ntypealias foo_t alias old_t;\npermissive foo_t;\n");
        let new = policy("type foo_t;\ntypealias foo_t alias new_t;\n");
        let diff = PolicyDifference::new(&orig, &new);
        let modified = diff.types.modified.iter().next().unwrap();
        assert!(modified.added_aliases.contains("new_t"));
        assert!(modified.removed_aliases.contains("old_t"));
        assert!(modified.modified_permissive);
        assert!(modified.was_permissive);
    }

    #[test]
    fn modified_user_level_and_range() {
        let orig = policy(
            "sensitivity s0;\nrole r;\nuser u roles r level s0 range s0;\n",
        );
        let new = policy(
            "sensitivity s0;\nsensitivity s1;\nrole r;\nuser u roles r level s1 range s0 - s1;\n",
        );
        let diff = PolicyDifference::new(&orig, &new);
        let modified = diff.users.modified.iter().next().unwrap();
        assert!(modified.level_changed());
        assert!(modified.range_changed());
        assert_eq!(modified.added_level.as_ref().unwrap().to_string(), "s1");
        assert_eq!(
            modified.added_range.as_ref().unwrap().to_string(),
            "s0 - s1"
        );
        // Sensitivity s1 was also added
        assert!(diff.sensitivities.added.contains("s1"));
    }

    #[test]
    fn modified_av_rule_perms() {
        let orig = policy("allow a_t b_t:file { read write };\n");
        let new = policy("allow a_t b_t:file { read create };\n");
        let diff = PolicyDifference::new(&orig, &new);
        assert_eq!(diff.allows.counts(), (0, 0, 1));
        let modified = diff.allows.modified.iter().next().unwrap();
        assert!(modified.added_perms.contains("create"));
        assert!(modified.removed_perms.contains("write"));
        assert!(modified.matched_perms.contains("read"));
    }

    #[test]
    fn conditional_rules_match_separately() {
        let orig = policy("allow a_t b_t:file read;\n");
        let new = policy("if (x) {\nallow a_t b_t:file read;\n}\n");
        let diff = PolicyDifference::new(&orig, &new);
        // Same rule body under a conditional is a different rule
        assert_eq!(diff.allows.counts(), (1, 1, 0));
    }

    #[test]
    fn av_rule_types_do_not_mix() {
        let orig = policy("allow a_t b_t:file read;\n");
        let new = policy("dontaudit a_t b_t:file read;\n");
        let diff = PolicyDifference::new(&orig, &new);
        assert_eq!(diff.allows.counts(), (0, 1, 0));
        assert_eq!(diff.dontaudits.counts(), (1, 0, 0));
    }

    #[test]
    fn modified_te_rule_default() {
        let orig = policy("type_transition a_t b_t:process c_t;\n");
        let new = policy("type_transition a_t b_t:process d_t;\n");
        let diff = PolicyDifference::new(&orig, &new);
        let modified = diff.type_transitions.modified.iter().next().unwrap();
        assert_eq!(modified.added_default, "d_t");
        assert_eq!(modified.removed_default, "c_t");
    }

    #[test]
    fn named_transitions_match_by_filename() {
        let orig = policy("type_transition a_t b_t:file c_t \"one\";\n");
        let new = policy("type_transition a_t b_t:file c_t \"two\";\n");
        let diff = PolicyDifference::new(&orig, &new);
        assert_eq!(diff.type_transitions.counts(), (1, 1, 0));
    }

    #[test]
    fn modified_labeling_contexts() {
        let orig = policy(
            "portcon tcp 80 system_u:object_r:http_port_t;
             netifcon eth0 system_u:object_r:netif_t system_u:object_r:packet_t;
            ",
        );
        let new = policy(
            "portcon tcp 80 system_u:object_r:port_t;
             netifcon eth0 system_u:object_r:netif_t system_u:object_r:server_packet_t;
            ",
        );
        let diff = PolicyDifference::new(&orig, &new);
        let portcon = diff.portcons.modified.iter().next().unwrap();
        assert_eq!(portcon.added_context.type_, "port_t");
        assert_eq!(portcon.removed_context.type_, "http_port_t");
        let netifcon = diff.netifcons.modified.iter().next().unwrap();
        assert!(netifcon.added_context.is_none());
        assert_eq!(
            netifcon.added_packet.as_ref().unwrap().type_,
            "server_packet_t"
        );
    }

    #[test]
    fn property_differences() {
        let orig = policy("policy_version 31;\nhandle_unknown deny;\n");
        let new = policy("policy_version 32;\nhandle_unknown deny;\nsensitivity s0;\n");
        let diff = PolicyDifference::new(&orig, &new);
        assert_eq!(diff.properties.len(), 2);
        let version = diff
            .properties
            .iter()
            .find(|p| p.property == "version")
            .unwrap();
        assert_eq!(version.added, "32");
        assert_eq!(version.removed, "31");
        let mls = diff.properties.iter().find(|p| p.property == "MLS").unwrap();
        assert_eq!(mls.added, "true");
    }

    #[test]
    fn role_allow_and_polcap_add_remove_only() {
        let orig = policy("role_allow a_r b_r;\npolicycap one;\n");
        let new = policy("role_allow a_r c_r;\npolicycap two;\n");
        let diff = PolicyDifference::new(&orig, &new);
        assert_eq!(diff.role_allows.counts(), (1, 1, 0));
        assert_eq!(diff.polcaps.counts(), (1, 1, 0));
        assert!(diff.role_allows.modified.is_empty());
    }

    #[test]
    fn modified_default_rule() {
        let orig = policy("default_range file source low;\n");
        let new = policy("default_range file target low_high;\n");
        let diff = PolicyDifference::new(&orig, &new);
        let modified = diff.defaults.modified.iter().next().unwrap();
        assert_eq!(modified.default, DefaultValue::Target);
        assert_eq!(modified.old_default, Some(DefaultValue::Source));
        assert_eq!(modified.range, Some(DefaultRangeValue::LowHigh));
        assert_eq!(modified.old_range, Some(DefaultRangeValue::Low));
    }
}
