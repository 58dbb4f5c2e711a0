// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT

//! Rule and labeling statement types
//!
//! Every type here renders in policy source syntax via Display and carries a
//! total ordering so that BTreeSet iteration is the deterministic sort order
//! the report relies on.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::context::{Context, MlsRange};

/// A conditional expression guarding a rule, with the branch the rule lives
/// in.  Rules outside of conditional blocks carry None instead.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Conditional {
    pub expr: String,
    pub branch: bool,
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[ {} ]", self.expr)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AvRuleType {
    Allow,
    Neverallow,
    Auditallow,
    Dontaudit,
}

impl fmt::Display for AvRuleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AvRuleType::Allow => "allow",
            AvRuleType::Neverallow => "neverallow",
            AvRuleType::Auditallow => "auditallow",
            AvRuleType::Dontaudit => "dontaudit",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AvRuleType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(AvRuleType::Allow),
            "neverallow" => Ok(AvRuleType::Neverallow),
            "auditallow" => Ok(AvRuleType::Auditallow),
            "dontaudit" => Ok(AvRuleType::Dontaudit),
            _ => Err(()),
        }
    }
}

/// An access vector rule
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvRule {
    pub ruletype: AvRuleType,
    pub source: String,
    pub target: String,
    pub tclass: String,
    pub perms: BTreeSet<String>,
    pub conditional: Option<Conditional>,
}

impl AvRule {
    // The matching key: everything except the permission set
    fn key(&self) -> (AvRuleType, &str, &str, &str, &Option<Conditional>) {
        (
            self.ruletype,
            &self.source,
            &self.target,
            &self.tclass,
            &self.conditional,
        )
    }
}

impl Ord for AvRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(&other.key())
            .then_with(|| self.perms.cmp(&other.perms))
    }
}

impl PartialOrd for AvRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AvRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{} ",
            self.ruletype, self.source, self.target, self.tclass
        )?;
        write_perm_set(f, &self.perms)?;
        write!(f, ";")?;
        if let Some(cond) = &self.conditional {
            write!(f, " {}", cond)?;
        }
        Ok(())
    }
}

// Single permissions print bare, larger sets in braces
fn write_perm_set(f: &mut fmt::Formatter, perms: &BTreeSet<String>) -> fmt::Result {
    if perms.len() == 1 {
        // Unwrap safe since len is 1
        write!(f, "{}", perms.iter().next().unwrap())
    } else {
        write!(
            f,
            "{{ {} }}",
            perms.iter().cloned().collect::<Vec<String>>().join(" ")
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TeRuleType {
    TypeTransition,
    TypeChange,
    TypeMember,
}

impl fmt::Display for TeRuleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TeRuleType::TypeTransition => "type_transition",
            TeRuleType::TypeChange => "type_change",
            TeRuleType::TypeMember => "type_member",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TeRuleType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "type_transition" => Ok(TeRuleType::TypeTransition),
            "type_change" => Ok(TeRuleType::TypeChange),
            "type_member" => Ok(TeRuleType::TypeMember),
            _ => Err(()),
        }
    }
}

/// A type_transition, type_change or type_member rule.  The filename is only
/// present on named file transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeRule {
    pub ruletype: TeRuleType,
    pub source: String,
    pub target: String,
    pub tclass: String,
    pub default: String,
    pub filename: Option<String>,
    pub conditional: Option<Conditional>,
}

impl TeRule {
    fn key(
        &self,
    ) -> (
        TeRuleType,
        &str,
        &str,
        &str,
        &Option<String>,
        &Option<Conditional>,
    ) {
        (
            self.ruletype,
            &self.source,
            &self.target,
            &self.tclass,
            &self.filename,
            &self.conditional,
        )
    }
}

impl Ord for TeRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(&other.key())
            .then_with(|| self.default.cmp(&other.default))
    }
}

impl PartialOrd for TeRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TeRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{} {}",
            self.ruletype, self.source, self.target, self.tclass, self.default
        )?;
        if let Some(name) = &self.filename {
            write!(f, " \"{}\"", name)?;
        }
        write!(f, ";")?;
        if let Some(cond) = &self.conditional {
            write!(f, " {}", cond)?;
        }
        Ok(())
    }
}

/// A role allow rule
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoleAllow {
    pub source: String,
    pub target: String,
}

impl fmt::Display for RoleAllow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "allow {} {};", self.source, self.target)
    }
}

/// A role_transition rule
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoleTransition {
    pub source: String,
    pub target: String,
    pub tclass: String,
    pub default: String,
}

impl fmt::Display for RoleTransition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "role_transition {} {}:{} {};",
            self.source, self.target, self.tclass, self.default
        )
    }
}

/// A range_transition rule
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RangeTransition {
    pub source: String,
    pub target: String,
    pub tclass: String,
    pub range: MlsRange,
}

impl fmt::Display for RangeTransition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "range_transition {} {}:{} {};",
            self.source, self.target, self.tclass, self.range
        )
    }
}

/// An initial SID labeling statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InitialSid {
    pub name: String,
    pub context: Context,
}

impl fmt::Display for InitialSid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sid {} {}", self.name, self.context)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FsUseType {
    Xattr,
    Task,
    Trans,
}

impl fmt::Display for FsUseType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            FsUseType::Xattr => "fs_use_xattr",
            FsUseType::Task => "fs_use_task",
            FsUseType::Trans => "fs_use_trans",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FsUseType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fs_use_xattr" => Ok(FsUseType::Xattr),
            "fs_use_task" => Ok(FsUseType::Task),
            "fs_use_trans" => Ok(FsUseType::Trans),
            _ => Err(()),
        }
    }
}

/// An fs_use_* labeling statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FsUse {
    pub ruletype: FsUseType,
    pub fs: String,
    pub context: Context,
}

impl fmt::Display for FsUse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {};", self.ruletype, self.fs, self.context)
    }
}

/// A genfscon labeling statement.  The filetype is the "-d" style file type
/// filter, absent when the statement covers all file types.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Genfscon {
    pub fs: String,
    pub path: String,
    pub filetype: Option<String>,
    pub context: Context,
}

impl fmt::Display for Genfscon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.filetype {
            Some(ft) => write!(f, "genfscon {} {} {} {};", self.fs, self.path, ft, self.context),
            None => write!(f, "genfscon {} {} {};", self.fs, self.path, self.context),
        }
    }
}

/// A netifcon labeling statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Netifcon {
    pub netif: String,
    pub context: Context,
    pub packet: Context,
}

impl fmt::Display for Netifcon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "netifcon {} {} {};", self.netif, self.context, self.packet)
    }
}

/// A nodecon labeling statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Nodecon {
    pub address: IpAddr,
    pub netmask: IpAddr,
    pub context: Context,
}

impl fmt::Display for Nodecon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "nodecon {} {} {};", self.address, self.netmask, self.context)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Protocol {
    Tcp,
    Udp,
    Dccp,
    Sctp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Dccp => "dccp",
            Protocol::Sctp => "sctp",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "dccp" => Ok(Protocol::Dccp),
            "sctp" => Ok(Protocol::Sctp),
            _ => Err(()),
        }
    }
}

/// A portcon labeling statement
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Portcon {
    pub protocol: Protocol,
    pub low: u16,
    pub high: u16,
    pub context: Context,
}

impl Portcon {
    /// The port field as it appears in policy source: "80" or "80-90"
    pub fn port_display(&self) -> String {
        if self.low == self.high {
            self.low.to_string()
        } else {
            format!("{}-{}", self.low, self.high)
        }
    }
}

impl fmt::Display for Portcon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "portcon {} {} {};",
            self.protocol,
            self.port_display(),
            self.context
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DefaultRuleType {
    User,
    Role,
    Type,
    Range,
}

impl fmt::Display for DefaultRuleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DefaultRuleType::User => "default_user",
            DefaultRuleType::Role => "default_role",
            DefaultRuleType::Type => "default_type",
            DefaultRuleType::Range => "default_range",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DefaultRuleType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default_user" => Ok(DefaultRuleType::User),
            "default_role" => Ok(DefaultRuleType::Role),
            "default_type" => Ok(DefaultRuleType::Type),
            "default_range" => Ok(DefaultRuleType::Range),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DefaultValue {
    Source,
    Target,
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DefaultValue::Source => "source",
            DefaultValue::Target => "target",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DefaultValue {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(DefaultValue::Source),
            "target" => Ok(DefaultValue::Target),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DefaultRangeValue {
    Low,
    High,
    LowHigh,
}

impl fmt::Display for DefaultRangeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DefaultRangeValue::Low => "low",
            DefaultRangeValue::High => "high",
            DefaultRangeValue::LowHigh => "low_high",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DefaultRangeValue {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(DefaultRangeValue::Low),
            "high" => Ok(DefaultRangeValue::High),
            "low_high" => Ok(DefaultRangeValue::LowHigh),
            _ => Err(()),
        }
    }
}

/// A default_* statement.  The range value is only present on default_range.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DefaultRule {
    pub ruletype: DefaultRuleType,
    pub tclass: String,
    pub default: DefaultValue,
    pub range: Option<DefaultRangeValue>,
}

impl fmt::Display for DefaultRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.range {
            Some(r) => write!(f, "{} {} {} {};", self.ruletype, self.tclass, self.default, r),
            None => write!(f, "{} {} {};", self.ruletype, self.tclass, self.default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn av_rule_display() {
        let mut rule = AvRule {
            ruletype: AvRuleType::Allow,
            source: "init_t".to_string(),
            target: "bin_t".to_string(),
            tclass: "file".to_string(),
            perms: set(&["read"]),
            conditional: None,
        };
        assert_eq!(rule.to_string(), "allow init_t bin_t:file read;");

        rule.perms = set(&["write", "read"]);
        assert_eq!(rule.to_string(), "allow init_t bin_t:file { read write };");

        rule.conditional = Some(Conditional {
            expr: "secure_mode".to_string(),
            branch: true,
        });
        assert_eq!(
            rule.to_string(),
            "allow init_t bin_t:file { read write }; [ secure_mode ]"
        );
    }

    #[test]
    fn av_rule_orders_by_key_not_perms() {
        let a = AvRule {
            ruletype: AvRuleType::Allow,
            source: "a_t".to_string(),
            target: "b_t".to_string(),
            tclass: "file".to_string(),
            perms: set(&["write"]),
            conditional: None,
        };
        let b = AvRule {
            ruletype: AvRuleType::Allow,
            source: "a_t".to_string(),
            target: "c_t".to_string(),
            tclass: "file".to_string(),
            perms: set(&["append"]),
            conditional: None,
        };
        assert!(a < b);
    }

    #[test]
    fn te_rule_display() {
        let rule = TeRule {
            ruletype: TeRuleType::TypeTransition,
            source: "init_t".to_string(),
            target: "bin_t".to_string(),
            tclass: "process".to_string(),
            default: "daemon_t".to_string(),
            filename: None,
            conditional: None,
        };
        assert_eq!(rule.to_string(), "type_transition init_t bin_t:process daemon_t;");

        let named = TeRule {
            filename: Some("ls".to_string()),
            ..rule
        };
        assert_eq!(
            named.to_string(),
            "type_transition init_t bin_t:process daemon_t \"ls\";"
        );
    }

    #[test]
    fn labeling_display() {
        let ctx: Context = "system_u:object_r:port_t:s0".parse().unwrap();
        let portcon = Portcon {
            protocol: Protocol::Tcp,
            low: 80,
            high: 80,
            context: ctx.clone(),
        };
        assert_eq!(portcon.to_string(), "portcon tcp 80 system_u:object_r:port_t:s0;");

        let ranged = Portcon {
            low: 1024,
            high: 2048,
            ..portcon
        };
        assert_eq!(
            ranged.to_string(),
            "portcon tcp 1024-2048 system_u:object_r:port_t:s0;"
        );

        let nodecon = Nodecon {
            address: "10.1.1.0".parse().unwrap(),
            netmask: "255.255.255.0".parse().unwrap(),
            context: ctx.clone(),
        };
        assert_eq!(
            nodecon.to_string(),
            "nodecon 10.1.1.0 255.255.255.0 system_u:object_r:port_t:s0;"
        );

        let genfscon = Genfscon {
            fs: "proc".to_string(),
            path: "/net".to_string(),
            filetype: Some("-d".to_string()),
            context: ctx,
        };
        assert_eq!(
            genfscon.to_string(),
            "genfscon proc /net -d system_u:object_r:port_t:s0;"
        );
    }

    #[test]
    fn default_rule_display() {
        let rule = DefaultRule {
            ruletype: DefaultRuleType::Range,
            tclass: "file".to_string(),
            default: DefaultValue::Source,
            range: Some(DefaultRangeValue::LowHigh),
        };
        assert_eq!(rule.to_string(), "default_range file source low_high;");
    }
}
