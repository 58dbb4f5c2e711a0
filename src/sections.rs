// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT

//! Report section selection
//!
//! With no explicit requests every section is shown.  Requesting any section
//! switches to an exclusive allow-list of just the requested ones.

use std::collections::BTreeSet;

/// One report section, in output order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Properties,
    Commons,
    Classes,
    Booleans,
    Roles,
    Types,
    Attributes,
    Users,
    Categories,
    Sensitivities,
    Levels,
    Allows,
    Neverallows,
    Auditallows,
    Dontaudits,
    TypeTransitions,
    TypeChanges,
    TypeMembers,
    RoleAllows,
    RoleTransitions,
    RangeTransitions,
    InitialSids,
    FsUses,
    Genfscons,
    Netifcons,
    Nodecons,
    Portcons,
    Polcaps,
    Defaults,
}

impl Section {
    /// All sections in the order the report prints them
    pub const ALL: [Section; 29] = [
        Section::Properties,
        Section::Commons,
        Section::Classes,
        Section::Booleans,
        Section::Roles,
        Section::Types,
        Section::Attributes,
        Section::Users,
        Section::Categories,
        Section::Sensitivities,
        Section::Levels,
        Section::Allows,
        Section::Neverallows,
        Section::Auditallows,
        Section::Dontaudits,
        Section::TypeTransitions,
        Section::TypeChanges,
        Section::TypeMembers,
        Section::RoleAllows,
        Section::RoleTransitions,
        Section::RangeTransitions,
        Section::InitialSids,
        Section::FsUses,
        Section::Genfscons,
        Section::Netifcons,
        Section::Nodecons,
        Section::Portcons,
        Section::Polcaps,
        Section::Defaults,
    ];
}

/// Which sections the report shows
#[derive(Clone, Debug, Default)]
pub struct SectionSelection {
    requested: BTreeSet<Section>,
}

impl SectionSelection {
    /// The default selection: every section, none explicitly requested
    pub fn all() -> Self {
        SectionSelection::default()
    }

    pub fn from_requested(requested: BTreeSet<Section>) -> Self {
        SectionSelection { requested }
    }

    /// Whether the section appears in the report at all
    pub fn is_selected(&self, section: Section) -> bool {
        self.requested.is_empty() || self.requested.contains(&section)
    }

    /// Whether the section was asked for by name, which forces its header
    /// even when it has no differences
    pub fn is_explicit(&self, section: Section) -> bool {
        self.requested.contains(&section)
    }
}
