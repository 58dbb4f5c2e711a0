// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT

//! Plain-text difference report
//!
//! Categories print in a fixed order.  A category block prints when it has
//! differences or when its section was requested by name; --stats trims every
//! block to its header line.

use std::collections::BTreeSet;
use std::fmt;
use std::io;

use crate::context::Context;
use crate::diff::{Delta, ModifiedAvRule, ModifiedTeRule, PolicyDifference};
use crate::sections::{Section, SectionSelection};

pub struct Report<'a> {
    diff: &'a PolicyDifference,
    sections: SectionSelection,
    stats: bool,
}

impl<'a> Report<'a> {
    pub fn new(diff: &'a PolicyDifference, sections: SectionSelection, stats: bool) -> Self {
        Report {
            diff,
            sections,
            stats,
        }
    }

    /// Write the full report
    pub fn write<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.properties(out)?;
        self.perm_holder(out, Section::Commons, "Commons", &self.diff.commons)?;
        self.perm_holder(out, Section::Classes, "Classes", &self.diff.classes)?;
        self.booleans(out)?;
        self.roles(out)?;
        self.types(out)?;
        self.attributes(out)?;
        self.users(out)?;
        self.aliased(out, Section::Categories, "Categories", &self.diff.categories)?;
        self.aliased(
            out,
            Section::Sensitivities,
            "Sensitivities",
            &self.diff.sensitivities,
        )?;
        self.levels(out)?;
        self.av_rules(out, Section::Allows, "Allow Rules", &self.diff.allows)?;
        self.av_rules(
            out,
            Section::Neverallows,
            "Neverallow Rules",
            &self.diff.neverallows,
        )?;
        self.av_rules(
            out,
            Section::Auditallows,
            "Auditallow Rules",
            &self.diff.auditallows,
        )?;
        self.av_rules(
            out,
            Section::Dontaudits,
            "Dontaudit Rules",
            &self.diff.dontaudits,
        )?;
        self.te_rules(
            out,
            Section::TypeTransitions,
            "Type_transition Rules",
            &self.diff.type_transitions,
        )?;
        self.te_rules(
            out,
            Section::TypeChanges,
            "Type_change Rules",
            &self.diff.type_changes,
        )?;
        self.te_rules(
            out,
            Section::TypeMembers,
            "Type_member Rules",
            &self.diff.type_members,
        )?;
        self.role_allows(out)?;
        self.role_transitions(out)?;
        self.range_transitions(out)?;
        self.initial_sids(out)?;
        self.fs_uses(out)?;
        self.genfscons(out)?;
        self.netifcons(out)?;
        self.nodecons(out)?;
        self.portcons(out)?;
        self.polcaps(out)?;
        self.defaults(out)?;
        Ok(())
    }

    // A block prints when it has content or was asked for by name
    fn show(&self, section: Section, empty: bool) -> bool {
        self.sections.is_selected(section) && (!empty || self.sections.is_explicit(section))
    }

    fn properties<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.show(Section::Properties, self.diff.properties.is_empty()) {
            return Ok(());
        }
        writeln!(out, "Policy Properties ({} Modified)", self.diff.properties.len())?;
        if !self.stats {
            for prop in &self.diff.properties {
                writeln!(out, "      * {} +{} -{}", prop.property, prop.added, prop.removed)?;
            }
        }
        writeln!(out)
    }

    // Commons and classes share their permission-set shape
    fn perm_holder<W: io::Write>(
        &self,
        out: &mut W,
        section: Section,
        name: &str,
        delta: &Delta<String, impl PermHolderMod>,
    ) -> io::Result<()> {
        if !self.show(section, delta.is_empty()) {
            return Ok(());
        }
        header(out, name, delta)?;
        if !self.stats {
            added_removed(out, name, &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified {}: {}", name, delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_perms().len(), "Added permissions");
                    counted(&mut change, m.removed_perms().len(), "Removed permissions");
                    writeln!(out, "      * {} ({})", m.name(), change.join(", "))?;
                    details(out, '+', m.added_perms())?;
                    details(out, '-', m.removed_perms())?;
                }
            }
        }
        writeln!(out)
    }

    fn booleans<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.booleans;
        if !self.show(Section::Booleans, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Booleans", delta)?;
        if !self.stats {
            added_removed(out, "Booleans", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Booleans: {}", delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(out, "      * {} (Modified default state)", m.name)?;
                    writeln!(out, "          + {}", m.added_state)?;
                    writeln!(out, "          - {}", m.removed_state)?;
                }
            }
        }
        writeln!(out)
    }

    fn roles<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.roles;
        if !self.show(Section::Roles, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Roles", delta)?;
        if !self.stats {
            added_removed(out, "Roles", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Roles: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_types.len(), "Added types");
                    counted(&mut change, m.removed_types.len(), "Removed types");
                    writeln!(out, "      * {} ({})", m.name, change.join(", "))?;
                    details(out, '+', &m.added_types)?;
                    details(out, '-', &m.removed_types)?;
                }
            }
        }
        writeln!(out)
    }

    fn types<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.types;
        if !self.show(Section::Types, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Types", delta)?;
        if !self.stats {
            added_removed(out, "Types", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Types: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_attributes.len(), "Added attributes");
                    counted(&mut change, m.removed_attributes.len(), "Removed attributes");
                    counted(&mut change, m.added_aliases.len(), "Added aliases");
                    counted(&mut change, m.removed_aliases.len(), "Removed aliases");
                    if m.modified_permissive {
                        if m.was_permissive {
                            change.push("Removed permissive".to_string());
                        } else {
                            change.push("Added permissive".to_string());
                        }
                    }
                    writeln!(out, "      * {} ({})", m.name, change.join(", "))?;
                    if !m.added_attributes.is_empty() || !m.removed_attributes.is_empty() {
                        writeln!(out, "          Attributes:")?;
                        details(out, '+', &m.added_attributes)?;
                        details(out, '-', &m.removed_attributes)?;
                    }
                    if !m.added_aliases.is_empty() || !m.removed_aliases.is_empty() {
                        writeln!(out, "          Aliases:")?;
                        details(out, '+', &m.added_aliases)?;
                        details(out, '-', &m.removed_aliases)?;
                    }
                }
            }
        }
        writeln!(out)
    }

    fn attributes<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.attributes;
        if !self.show(Section::Attributes, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Type Attributes", delta)?;
        if !self.stats {
            added_removed(out, "Type Attributes", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Type Attributes: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_types.len(), "Added types");
                    counted(&mut change, m.removed_types.len(), "Removed types");
                    writeln!(out, "      * {} ({})", m.name, change.join(", "))?;
                    details(out, '+', &m.added_types)?;
                    details(out, '-', &m.removed_types)?;
                }
            }
        }
        writeln!(out)
    }

    fn users<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.users;
        if !self.show(Section::Users, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Users", delta)?;
        if !self.stats {
            added_removed(out, "Users", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Users: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_roles.len(), "Added roles");
                    counted(&mut change, m.removed_roles.len(), "Removed roles");
                    if m.level_changed() {
                        change.push("Modified default level".to_string());
                    }
                    if m.range_changed() {
                        change.push("Modified range".to_string());
                    }
                    writeln!(out, "      * {} ({})", m.name, change.join(", "))?;
                    if !m.added_roles.is_empty() || !m.removed_roles.is_empty() {
                        writeln!(out, "          Roles:")?;
                        details(out, '+', &m.added_roles)?;
                        details(out, '-', &m.removed_roles)?;
                    }
                    if m.level_changed() {
                        writeln!(out, "          Default level:")?;
                        opt_detail(out, '+', &m.added_level)?;
                        opt_detail(out, '-', &m.removed_level)?;
                    }
                    if m.range_changed() {
                        writeln!(out, "          Range:")?;
                        opt_detail(out, '+', &m.added_range)?;
                        opt_detail(out, '-', &m.removed_range)?;
                    }
                }
            }
        }
        writeln!(out)
    }

    // Categories and sensitivities both only carry aliases
    fn aliased<W: io::Write>(
        &self,
        out: &mut W,
        section: Section,
        name: &str,
        delta: &Delta<String, crate::diff::ModifiedAliases>,
    ) -> io::Result<()> {
        if !self.show(section, delta.is_empty()) {
            return Ok(());
        }
        header(out, name, delta)?;
        if !self.stats {
            added_removed(out, name, &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified {}: {}", name, delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_aliases.len(), "Added Aliases");
                    counted(&mut change, m.removed_aliases.len(), "Removed Aliases");
                    writeln!(out, "      * {} ({})", m.name, change.join(", "))?;
                    writeln!(out, "          Aliases:")?;
                    details(out, '+', &m.added_aliases)?;
                    details(out, '-', &m.removed_aliases)?;
                }
            }
        }
        writeln!(out)
    }

    fn levels<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.levels;
        if !self.show(Section::Levels, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Levels", delta)?;
        if !self.stats {
            added_removed(out, "Levels", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Levels: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let mut change = Vec::new();
                    counted(&mut change, m.added_categories.len(), "Added Categories");
                    counted(&mut change, m.removed_categories.len(), "Removed Categories");
                    writeln!(out, "      * {} ({})", m.sensitivity, change.join(", "))?;
                    details(out, '+', &m.added_categories)?;
                    details(out, '-', &m.removed_categories)?;
                }
            }
        }
        writeln!(out)
    }

    fn av_rules<W: io::Write>(
        &self,
        out: &mut W,
        section: Section,
        name: &str,
        delta: &Delta<crate::rules::AvRule, ModifiedAvRule>,
    ) -> io::Result<()> {
        if !self.show(section, delta.is_empty()) {
            return Ok(());
        }
        header(out, name, delta)?;
        if !self.stats {
            added_removed(out, name, &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified {}: {}", name, delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(out, "      * {}", av_modified_line(m))?;
                }
            }
        }
        writeln!(out)
    }

    fn te_rules<W: io::Write>(
        &self,
        out: &mut W,
        section: Section,
        name: &str,
        delta: &Delta<crate::rules::TeRule, ModifiedTeRule>,
    ) -> io::Result<()> {
        if !self.show(section, delta.is_empty()) {
            return Ok(());
        }
        header(out, name, delta)?;
        if !self.stats {
            added_removed(out, name, &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified {}: {}", name, delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(out, "      * {}", te_modified_line(m))?;
                }
            }
        }
        writeln!(out)
    }

    fn role_allows<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.role_allows;
        if !self.show(Section::RoleAllows, delta.is_empty()) {
            return Ok(());
        }
        writeln!(
            out,
            "Role allow Rules ({} Added, {} Removed)",
            delta.added.len(),
            delta.removed.len()
        )?;
        if !self.stats {
            added_removed(out, "Role allow Rules", &delta.added, &delta.removed)?;
        }
        writeln!(out)
    }

    fn role_transitions<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.role_transitions;
        if !self.show(Section::RoleTransitions, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Role_transition Rules", delta)?;
        if !self.stats {
            added_removed(out, "Role_transition Rules", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Role_transition Rules: {}", delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(
                        out,
                        "      * role_transition {} {}:{} +{} -{}",
                        m.rule.source, m.rule.target, m.rule.tclass, m.added_default,
                        m.removed_default
                    )?;
                }
            }
        }
        writeln!(out)
    }

    fn range_transitions<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.range_transitions;
        if !self.show(Section::RangeTransitions, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Range_transition Rules", delta)?;
        if !self.stats {
            added_removed(out, "Range_transition Rules", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(
                    out,
                    "   Modified Range_transition Rules: {}",
                    delta.modified.len()
                )?;
                // Brackets around the ranges since ranges contain '-' and
                // spaces themselves
                for m in &delta.modified {
                    writeln!(
                        out,
                        "      * range_transition {} {}:{} +[{}] -[{}]",
                        m.rule.source, m.rule.target, m.rule.tclass, m.added_range,
                        m.removed_range
                    )?;
                }
            }
        }
        writeln!(out)
    }

    fn initial_sids<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.initial_sids;
        if !self.show(Section::InitialSids, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Initial SIDs", delta)?;
        if !self.stats {
            added_removed(out, "Initial SIDs", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Initial SIDs: {}", delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(
                        out,
                        "      * {} +[{}] -[{}];",
                        m.name, m.added_context, m.removed_context
                    )?;
                }
            }
        }
        writeln!(out)
    }

    fn fs_uses<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.fs_uses;
        if !self.show(Section::FsUses, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Fs_use", delta)?;
        if !self.stats {
            added_removed(out, "Fs_use", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Fs_use: {}", delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(
                        out,
                        "      * {} {} +[{}] -[{}];",
                        m.ruletype, m.fs, m.added_context, m.removed_context
                    )?;
                }
            }
        }
        writeln!(out)
    }

    fn genfscons<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.genfscons;
        if !self.show(Section::Genfscons, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Genfscons", delta)?;
        if !self.stats {
            added_removed(out, "Genfscons", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Genfscons: {}", delta.modified.len())?;
                for m in &delta.modified {
                    match &m.filetype {
                        Some(ft) => writeln!(
                            out,
                            "      * genfscon {} {} {} +[{}] -[{}];",
                            m.fs, m.path, ft, m.added_context, m.removed_context
                        )?,
                        None => writeln!(
                            out,
                            "      * genfscon {} {} +[{}] -[{}];",
                            m.fs, m.path, m.added_context, m.removed_context
                        )?,
                    }
                }
            }
        }
        writeln!(out)
    }

    fn netifcons<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.netifcons;
        if !self.show(Section::Netifcons, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Netifcons", delta)?;
        if !self.stats {
            added_removed(out, "Netifcons", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Netifcons: {}", delta.modified.len())?;
                // A one line rendering is unreadable when both contexts
                // changed, so these get their own nested blocks
                for m in &delta.modified {
                    let mut change = Vec::new();
                    if m.removed_context.is_some() {
                        change.push("Modified Context");
                    }
                    if m.removed_packet.is_some() {
                        change.push("Modified Packet Context");
                    }
                    writeln!(out, "      * {} ({})", m.netif, change.join(", "))?;
                    context_pair(out, "Context:", &m.added_context, &m.removed_context)?;
                    context_pair(out, "Packet Context:", &m.added_packet, &m.removed_packet)?;
                }
            }
        }
        writeln!(out)
    }

    fn nodecons<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.nodecons;
        if !self.show(Section::Nodecons, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Nodecons", delta)?;
        if !self.stats {
            added_removed(out, "Nodecons", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Nodecons: {}", delta.modified.len())?;
                for m in &delta.modified {
                    writeln!(
                        out,
                        "      * nodecon {} {} +[{}] -[{}];",
                        m.address, m.netmask, m.added_context, m.removed_context
                    )?;
                }
            }
        }
        writeln!(out)
    }

    fn portcons<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.portcons;
        if !self.show(Section::Portcons, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Portcons", delta)?;
        if !self.stats {
            added_removed(out, "Portcons", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Portcons: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let ports = if m.low == m.high {
                        m.low.to_string()
                    } else {
                        format!("{}-{}", m.low, m.high)
                    };
                    writeln!(
                        out,
                        "      * portcon {} {} +[{}] -[{}];",
                        m.protocol, ports, m.added_context, m.removed_context
                    )?;
                }
            }
        }
        writeln!(out)
    }

    fn polcaps<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.polcaps;
        if !self.show(Section::Polcaps, delta.is_empty()) {
            return Ok(());
        }
        writeln!(
            out,
            "Policy Capabilities ({} Added, {} Removed)",
            delta.added.len(),
            delta.removed.len()
        )?;
        if !self.stats {
            added_removed(out, "Policy Capabilities", &delta.added, &delta.removed)?;
        }
        writeln!(out)
    }

    fn defaults<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let delta = &self.diff.defaults;
        if !self.show(Section::Defaults, delta.is_empty()) {
            return Ok(());
        }
        header(out, "Defaults", delta)?;
        if !self.stats {
            added_removed(out, "Defaults", &delta.added, &delta.removed)?;
            if !delta.modified.is_empty() {
                writeln!(out, "   Modified Defaults: {}", delta.modified.len())?;
                for m in &delta.modified {
                    let mut line = format!("      * {} {} ", m.ruletype, m.tclass);
                    match m.old_default {
                        Some(old) => line.push_str(&format!("+{} -{}", m.default, old)),
                        None => line.push_str(&m.default.to_string()),
                    }
                    match (m.range, m.old_range) {
                        (Some(new), Some(old)) => line.push_str(&format!(" +{} -{};", new, old)),
                        (Some(new), None) => line.push_str(&format!(" {};", new)),
                        _ => line.push(';'),
                    }
                    writeln!(out, "{}", line)?;
                }
            }
        }
        writeln!(out)
    }
}

fn header<W: io::Write, T: Ord, M: Ord>(
    out: &mut W,
    name: &str,
    delta: &Delta<T, M>,
) -> io::Result<()> {
    let (added, removed, modified) = delta.counts();
    writeln!(
        out,
        "{} ({} Added, {} Removed, {} Modified)",
        name, added, removed, modified
    )
}

// The added and removed sub-blocks, which every category shares
fn added_removed<W: io::Write, T: Ord + fmt::Display>(
    out: &mut W,
    name: &str,
    added: &BTreeSet<T>,
    removed: &BTreeSet<T>,
) -> io::Result<()> {
    if !added.is_empty() {
        writeln!(out, "   Added {}: {}", name, added.len())?;
        for item in added {
            writeln!(out, "      + {}", item)?;
        }
    }
    if !removed.is_empty() {
        writeln!(out, "   Removed {}: {}", name, removed.len())?;
        for item in removed {
            writeln!(out, "      - {}", item)?;
        }
    }
    Ok(())
}

// Nested detail lines under a modified entry
fn details<W: io::Write, T: fmt::Display>(
    out: &mut W,
    prefix: char,
    items: &BTreeSet<T>,
) -> io::Result<()> {
    for item in items {
        writeln!(out, "          {} {}", prefix, item)?;
    }
    Ok(())
}

fn opt_detail<W: io::Write, T: fmt::Display>(
    out: &mut W,
    prefix: char,
    item: &Option<T>,
) -> io::Result<()> {
    if let Some(item) = item {
        writeln!(out, "          {} {}", prefix, item)?;
    }
    Ok(())
}

fn context_pair<W: io::Write>(
    out: &mut W,
    label: &str,
    added: &Option<Context>,
    removed: &Option<Context>,
) -> io::Result<()> {
    if let (Some(added), Some(removed)) = (added, removed) {
        writeln!(out, "          {}", label)?;
        writeln!(out, "             + {}", added)?;
        writeln!(out, "             - {}", removed)?;
    }
    Ok(())
}

fn counted(change: &mut Vec<String>, count: usize, label: &str) {
    if count > 0 {
        change.push(format!("{} {}", count, label));
    }
}

// Modified av rules always brace the permission set, with matched
// permissions first, then added, then removed
fn av_modified_line(m: &ModifiedAvRule) -> String {
    let perms = m
        .matched_perms
        .iter()
        .cloned()
        .chain(m.added_perms.iter().map(|p| format!("+{}", p)))
        .chain(m.removed_perms.iter().map(|p| format!("-{}", p)))
        .collect::<Vec<String>>()
        .join(" ");
    let mut line = format!(
        "{} {} {}:{} {{ {} }};",
        m.rule.ruletype, m.rule.source, m.rule.target, m.rule.tclass, perms
    );
    if let Some(cond) = &m.rule.conditional {
        line.push_str(&format!(" {}", cond));
    }
    line
}

fn te_modified_line(m: &ModifiedTeRule) -> String {
    let mut line = format!(
        "{} {} {}:{} +{} -{}",
        m.rule.ruletype, m.rule.source, m.rule.target, m.rule.tclass, m.added_default,
        m.removed_default
    );
    if let Some(name) = &m.rule.filename {
        line.push_str(&format!(" {}", name));
    }
    line.push(';');
    if let Some(cond) = &m.rule.conditional {
        line.push_str(&format!(" {}", cond));
    }
    line
}

// Shared access for the two permission-holding component kinds
trait PermHolderMod: Ord {
    fn name(&self) -> &str;
    fn added_perms(&self) -> &BTreeSet<String>;
    fn removed_perms(&self) -> &BTreeSet<String>;
}

impl PermHolderMod for crate::diff::ModifiedCommon {
    fn name(&self) -> &str {
        &self.name
    }
    fn added_perms(&self) -> &BTreeSet<String> {
        &self.added_perms
    }
    fn removed_perms(&self) -> &BTreeSet<String> {
        &self.removed_perms
    }
}

impl PermHolderMod for crate::diff::ModifiedClass {
    fn name(&self) -> &str {
        &self.name
    }
    fn added_perms(&self) -> &BTreeSet<String> {
        &self.added_perms
    }
    fn removed_perms(&self) -> &BTreeSet<String> {
        &self.removed_perms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_policy;
    use crate::policy::SELinuxPolicy;
    use crate::sections::SectionSelection;
    use codespan_reporting::files::SimpleFile;

    fn policy(source: &str) -> SELinuxPolicy {
        let file = SimpleFile::new("test.conf".to_string(), source.to_string());
        parse_policy(&file).expect("policy should parse")
    }

    fn render(orig: &str, new: &str, sections: SectionSelection, stats: bool) -> String {
        let diff = PolicyDifference::new(&policy(orig), &policy(new));
        let report = Report::new(&diff, sections, stats);
        let mut out = Vec::new();
        report.write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn identical_policies_print_nothing() {
        let source = "type foo_t;\nallow foo_t foo_t:file read;\n";
        assert_eq!(render(source, source, SectionSelection::all(), false), "");
    }

    #[test]
    fn type_block_format() {
        let out = render(
            "type foo_t;\ntype bar_t;\n",
            "type foo_t;\ntype baz_t;\n",
            SectionSelection::all(),
            false,
        );
        assert_eq!(
            out,
            "Types (1 Added, 1 Removed, 0 Modified)\n\
             \x20  Added Types: 1\n\
             \x20     + baz_t\n\
             \x20  Removed Types: 1\n\
             \x20     - bar_t\n\n"
        );
    }

    #[test]
    fn modified_class_block_format() {
        let out = render(
            "class file { read write };\n",
            "class file { read create };\n",
            SectionSelection::all(),
            false,
        );
        assert_eq!(
            out,
            "Classes (0 Added, 0 Removed, 1 Modified)\n\
             \x20  Modified Classes: 1\n\
             \x20     * file (1 Added permissions, 1 Removed permissions)\n\
             \x20         + create\n\
             \x20         - write\n\n"
        );
    }

    #[test]
    fn modified_allow_rule_format() {
        let out = render(
            "allow a_t b_t:file { read write };\n",
            "allow a_t b_t:file { read create };\n",
            SectionSelection::all(),
            false,
        );
        assert_eq!(
            out,
            "Allow Rules (0 Added, 0 Removed, 1 Modified)\n\
             \x20  Modified Allow Rules: 1\n\
             \x20     * allow a_t b_t:file { read +create -write };\n\n"
        );
    }

    #[test]
    fn conditional_rule_renders_with_branch() {
        let out = render(
            "",
            "if (secure_mode) {\nallow a_t b_t:file read;\n}\n",
            SectionSelection::all(),
            false,
        );
        assert!(out.contains("      + allow a_t b_t:file read; [ secure_mode ]\n"));
    }

    #[test]
    fn properties_block_format() {
        let out = render(
            "policy_version 31;\n",
            "policy_version 32;\n",
            SectionSelection::all(),
            false,
        );
        assert_eq!(
            out,
            "Policy Properties (1 Modified)\n\
             \x20     * version +32 -31\n\n"
        );
    }

    #[test]
    fn stats_prints_headers_only() {
        let out = render(
            "type foo_t;\n",
            "type bar_t;\n",
            SectionSelection::all(),
            true,
        );
        assert_eq!(out, "Types (1 Added, 1 Removed, 0 Modified)\n\n");
    }

    #[test]
    fn explicit_section_header_prints_when_empty() {
        let selection =
            SectionSelection::from_requested([Section::Booleans].iter().cloned().collect());
        let out = render("type foo_t;\n", "type bar_t;\n", selection, false);
        // The type difference is suppressed, the empty boolean block is not
        assert_eq!(out, "Booleans (0 Added, 0 Removed, 0 Modified)\n\n");
    }

    #[test]
    fn netifcon_nested_context_format() {
        let out = render(
            "netifcon eth0 system_u:object_r:netif_t system_u:object_r:packet_t;\n",
            "netifcon eth0 system_u:object_r:netif_t system_u:object_r:server_packet_t;\n",
            SectionSelection::all(),
            false,
        );
        assert_eq!(
            out,
            "Netifcons (0 Added, 0 Removed, 1 Modified)\n\
             \x20  Modified Netifcons: 1\n\
             \x20     * eth0 (Modified Packet Context)\n\
             \x20         Packet Context:\n\
             \x20            + system_u:object_r:server_packet_t\n\
             \x20            - system_u:object_r:packet_t\n\n"
        );
    }

    #[test]
    fn modified_default_range_format() {
        let out = render(
            "default_range file source low;\n",
            "default_range file source high;\n",
            SectionSelection::all(),
            false,
        );
        assert_eq!(
            out,
            "Defaults (0 Added, 0 Removed, 1 Modified)\n\
             \x20  Modified Defaults: 1\n\
             \x20     * default_range file source +high -low;\n\n"
        );
    }

    #[test]
    fn sections_print_in_category_order() {
        let out = render(
            "",
            "type foo_t;\nbool b true;\nallow foo_t foo_t:file read;\npolicycap cap;\n",
            SectionSelection::all(),
            false,
        );
        let booleans = out.find("Booleans (").unwrap();
        let types = out.find("Types (").unwrap();
        let allows = out.find("Allow Rules (").unwrap();
        let polcaps = out.find("Policy Capabilities (").unwrap();
        assert!(booleans < types && types < allows && allows < polcaps);
    }

    #[test]
    fn report_is_deterministic() {
        let orig = "type a_t;\ntype b_t;\n";
        let new = "type c_t;\ntype d_t;\n";
        let first = render(orig, new, SectionSelection::all(), false);
        let second = render(orig, new, SectionSelection::all(), false);
        assert_eq!(first, second);
        let added = first.find("+ c_t").unwrap();
        let added_second = first.find("+ d_t").unwrap();
        assert!(added < added_second);
    }
}
