use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use sediff::Section;

const COMPONENT: &str = "component differences";
const TERULE: &str = "type enforcement rule differences";
const RBACRULE: &str = "RBAC rule differences";
const MLSRULE: &str = "MLS rule differences";
const LABELING: &str = "labeling statement differences";
const OTHER: &str = "other differences";

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    name = "sediff",
    about = "SELinux policy semantic difference tool.",
    after_help = "If no differences are selected, all differences will be printed.",
    long_about = None
)]
pub struct Args {
    /// Path to the first SELinux policy to diff
    #[clap(value_name = "POLICY1")]
    pub policy1: PathBuf,
    /// Path to the second SELinux policy to diff
    #[clap(value_name = "POLICY2")]
    pub policy2: PathBuf,
    /// Display only statistics
    #[clap(long)]
    pub stats: bool,
    /// Print extra informational messages
    #[clap(short, long)]
    pub verbose: bool,
    /// Enable debugging
    #[clap(long)]
    pub debug: bool,

    /// Print common differences
    #[clap(long, help_heading = COMPONENT)]
    pub common: bool,
    /// Print class differences
    #[clap(short, long, help_heading = COMPONENT)]
    pub class: bool,
    /// Print type differences
    #[clap(short = 't', long = "type", help_heading = COMPONENT)]
    pub type_: bool,
    /// Print type attribute differences
    #[clap(short, long, help_heading = COMPONENT)]
    pub attribute: bool,
    /// Print role differences
    #[clap(short, long, help_heading = COMPONENT)]
    pub role: bool,
    /// Print user differences
    #[clap(short, long, help_heading = COMPONENT)]
    pub user: bool,
    /// Print Boolean differences
    #[clap(short, long = "bool", help_heading = COMPONENT)]
    pub bool_: bool,
    /// Print MLS sensitivity differences
    #[clap(long, help_heading = COMPONENT)]
    pub sensitivity: bool,
    /// Print MLS category differences
    #[clap(long, help_heading = COMPONENT)]
    pub category: bool,
    /// Print MLS level definition differences
    #[clap(long, help_heading = COMPONENT)]
    pub level: bool,

    /// Print allow rule differences
    #[clap(short = 'A', long, help_heading = TERULE)]
    pub allow: bool,
    /// Print neverallow rule differences
    #[clap(long, help_heading = TERULE)]
    pub neverallow: bool,
    /// Print auditallow rule differences
    #[clap(long, help_heading = TERULE)]
    pub auditallow: bool,
    /// Print dontaudit rule differences
    #[clap(long, help_heading = TERULE)]
    pub dontaudit: bool,
    /// Print type_transition rule differences
    #[clap(short = 'T', long = "type_trans", help_heading = TERULE)]
    pub type_trans: bool,
    /// Print type_change rule differences
    #[clap(long = "type_change", help_heading = TERULE)]
    pub type_change: bool,
    /// Print type_member rule differences
    #[clap(long = "type_member", help_heading = TERULE)]
    pub type_member: bool,

    /// Print role allow rule differences
    #[clap(long = "role_allow", help_heading = RBACRULE)]
    pub role_allow: bool,
    /// Print role_transition rule differences
    #[clap(long = "role_trans", help_heading = RBACRULE)]
    pub role_trans: bool,

    /// Print range_transition rule differences
    #[clap(long = "range_trans", help_heading = MLSRULE)]
    pub range_trans: bool,

    /// Print initial SID differences
    #[clap(long, help_heading = LABELING)]
    pub initialsid: bool,
    /// Print fs_use_* differences
    #[clap(long = "fs_use", help_heading = LABELING)]
    pub fs_use: bool,
    /// Print genfscon differences
    #[clap(long, help_heading = LABELING)]
    pub genfscon: bool,
    /// Print netifcon differences
    #[clap(long, help_heading = LABELING)]
    pub netifcon: bool,
    /// Print nodecon differences
    #[clap(long, help_heading = LABELING)]
    pub nodecon: bool,
    /// Print portcon differences
    #[clap(long, help_heading = LABELING)]
    pub portcon: bool,

    /// Print default_* differences
    #[clap(long, help_heading = OTHER)]
    pub default: bool,
    /// Print policy property differences (handle_unknown, version, MLS)
    #[clap(long, help_heading = OTHER)]
    pub property: bool,
    /// Print policy capability differences
    #[clap(long, help_heading = OTHER)]
    pub polcap: bool,
}

impl Args {
    /// The sections requested by name.  Empty means no flags were given, so
    /// everything prints.
    pub fn sections(&self) -> BTreeSet<Section> {
        let flags = [
            (self.property, Section::Properties),
            (self.common, Section::Commons),
            (self.class, Section::Classes),
            (self.bool_, Section::Booleans),
            (self.role, Section::Roles),
            (self.type_, Section::Types),
            (self.attribute, Section::Attributes),
            (self.user, Section::Users),
            (self.category, Section::Categories),
            (self.sensitivity, Section::Sensitivities),
            (self.level, Section::Levels),
            (self.allow, Section::Allows),
            (self.neverallow, Section::Neverallows),
            (self.auditallow, Section::Auditallows),
            (self.dontaudit, Section::Dontaudits),
            (self.type_trans, Section::TypeTransitions),
            (self.type_change, Section::TypeChanges),
            (self.type_member, Section::TypeMembers),
            (self.role_allow, Section::RoleAllows),
            (self.role_trans, Section::RoleTransitions),
            (self.range_trans, Section::RangeTransitions),
            (self.initialsid, Section::InitialSids),
            (self.fs_use, Section::FsUses),
            (self.genfscon, Section::Genfscons),
            (self.netifcon, Section::Netifcons),
            (self.nodecon, Section::Nodecons),
            (self.portcon, Section::Portcons),
            (self.polcap, Section::Polcaps),
            (self.default, Section::Defaults),
        ];
        flags
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, section)| *section)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_requests_nothing() {
        let args = Args::parse_from(["sediff", "old.conf", "new.conf"]);
        assert!(args.sections().is_empty());
        assert!(!args.stats);
    }

    #[test]
    fn flags_map_to_sections() {
        let args = Args::parse_from(["sediff", "-A", "--type_trans", "--bool", "a", "b"]);
        let sections = args.sections();
        assert_eq!(sections.len(), 3);
        assert!(sections.contains(&Section::Allows));
        assert!(sections.contains(&Section::TypeTransitions));
        assert!(sections.contains(&Section::Booleans));
    }

    #[test]
    fn short_flags() {
        let args = Args::parse_from(["sediff", "-t", "-T", "-b", "a", "b"]);
        let sections = args.sections();
        assert!(sections.contains(&Section::Types));
        assert!(sections.contains(&Section::TypeTransitions));
        assert!(sections.contains(&Section::Booleans));
    }
}
