// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT

//! Line-oriented parser for the policy source subset sediff understands
//!
//! One statement per line, "#" comments, trailing semicolons optional.
//! Brace lists are space separated ("{ read write }").  Conditional blocks
//! wrap rule statements:
//!
//! ```text
//! if (some_bool) {
//!     allow a_t b_t:file read;
//! } else {
//!     dontaudit a_t b_t:file read;
//! }
//! ```
//!
//! Parsing keeps going after a bad statement so one run reports every
//! problem in the file.

use std::collections::BTreeSet;
use std::ops::Range;

use codespan_reporting::files::SimpleFile;

use crate::context::{Context, Level, MlsRange};
use crate::error::{LoadErrors, ParseError};
use crate::policy::{AvKey, HandleUnknown, SELinuxPolicy, TeKey};
use crate::rules::{
    AvRuleType, Conditional, DefaultRangeValue, DefaultRuleType, DefaultValue, FsUseType, Protocol,
    RoleAllow, TeRuleType,
};

/// Parse a policy source file into a policy object
pub fn parse_policy(file: &SimpleFile<String, String>) -> Result<SELinuxPolicy, LoadErrors> {
    let mut parser = Parser {
        file,
        policy: SELinuxPolicy::new(),
        errors: LoadErrors::new(),
        cond: None,
        cond_range: 0..0,
    };
    parser.run();
    let Parser { policy, errors, .. } = parser;
    errors.into_result(policy)
}

// Token cursor over a single statement line
struct Words<'a> {
    toks: Vec<&'a str>,
    pos: usize,
    file: &'a SimpleFile<String, String>,
    range: Range<usize>,
}

impl<'a> Words<'a> {
    fn new(line: &'a str, file: &'a SimpleFile<String, String>, range: Range<usize>) -> Self {
        Words {
            toks: line.split_whitespace().collect(),
            pos: 0,
            file,
            range,
        }
    }

    fn error(&self, msg: &str, help: &str) -> ParseError {
        ParseError::new(msg, self.file, self.range.clone(), help)
    }

    fn next(&mut self, what: &str) -> Result<&'a str, ParseError> {
        match self.toks.get(self.pos) {
            Some(t) => {
                self.pos += 1;
                Ok(t)
            }
            None => Err(self.error("Incomplete statement", &format!("Expected {}", what))),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.toks.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<&'a str> {
        self.toks.get(self.pos + n).copied()
    }

    fn accept(&mut self, word: &str) -> bool {
        if self.peek() == Some(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // A brace list or a single word
    fn list(&mut self, what: &str) -> Result<Vec<&'a str>, ParseError> {
        if self.accept("{") {
            let mut items = Vec::new();
            loop {
                let t = self.next(&format!("{} or \"}}\"", what))?;
                if t == "}" {
                    break;
                }
                items.push(t);
            }
            if items.is_empty() {
                return Err(self.error("Empty list", &format!("Expected at least one {}", what)));
            }
            Ok(items)
        } else {
            Ok(vec![self.next(what)?])
        }
    }

    // Everything left on the line, joined.  Used for MLS ranges, which may
    // contain spaces ("s0 - s15").
    fn rest(&mut self, what: &str) -> Result<String, ParseError> {
        if self.pos == self.toks.len() {
            return Err(self.error("Incomplete statement", &format!("Expected {}", what)));
        }
        let joined = self.toks[self.pos..].join(" ");
        self.pos = self.toks.len();
        Ok(joined)
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.pos == self.toks.len() {
            Ok(())
        } else {
            Err(self.error(
                "Trailing tokens",
                &format!("Did not expect \"{}\" here", self.toks[self.pos]),
            ))
        }
    }
}

struct Parser<'a> {
    file: &'a SimpleFile<String, String>,
    policy: SELinuxPolicy,
    errors: LoadErrors,
    cond: Option<Conditional>,
    cond_range: Range<usize>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) {
        let file = self.file;
        let source: &'a str = file.source();
        let mut offset = 0;
        for line in source.lines() {
            let line_len = line.len();
            let code = match line.find('#') {
                Some(i) => &line[..i],
                None => line,
            };
            let trimmed = code.trim();
            if !trimmed.is_empty() {
                let lead = code.len() - code.trim_start().len();
                let range = (offset + lead)..(offset + code.trim_end().len());
                if let Err(e) = self.line(trimmed, range) {
                    self.errors.add_error(e);
                }
            }
            offset += line_len + 1;
        }
        if self.cond.is_some() {
            self.errors.add_error(ParseError::new(
                "Unclosed conditional block",
                self.file,
                self.cond_range.clone(),
                "This \"if\" is never closed",
            ));
        }
    }

    fn line(&mut self, line: &'a str, range: Range<usize>) -> Result<(), ParseError> {
        match line {
            "}" => match self.cond.take() {
                Some(_) => Ok(()),
                None => Err(ParseError::new(
                    "Unmatched \"}\"",
                    self.file,
                    range,
                    "No conditional block is open here",
                )),
            },
            "} else {" => match self.cond.take() {
                Some(c) if c.branch => {
                    self.cond = Some(Conditional {
                        expr: c.expr,
                        branch: false,
                    });
                    Ok(())
                }
                _ => Err(ParseError::new(
                    "Unmatched \"else\"",
                    self.file,
                    range,
                    "Expected an open \"if\" branch before \"else\"",
                )),
            },
            l if l.starts_with("if") && l.ends_with('{') => self.open_conditional(l, range),
            _ => self.statement(Words::new(line, self.file, range)),
        }
    }

    fn open_conditional(&mut self, line: &str, range: Range<usize>) -> Result<(), ParseError> {
        if self.cond.is_some() {
            return Err(ParseError::new(
                "Nested conditional block",
                self.file,
                range,
                "Conditional blocks cannot nest",
            ));
        }
        let expr = match (line.find('('), line.rfind(')')) {
            (Some(open), Some(close)) if open < close => line[open + 1..close].trim(),
            _ => {
                return Err(ParseError::new(
                    "Invalid conditional",
                    self.file,
                    range,
                    "Expected \"if (expression) {\"",
                ))
            }
        };
        if expr.is_empty() {
            return Err(ParseError::new(
                "Invalid conditional",
                self.file,
                range,
                "The conditional expression is empty",
            ));
        }
        self.cond = Some(Conditional {
            expr: expr.to_string(),
            branch: true,
        });
        self.cond_range = range;
        Ok(())
    }

    fn statement(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let line = {
            // Strip the optional trailing semicolon off the final token
            let last = w.toks.len() - 1;
            match w.toks[last].strip_suffix(';') {
                Some("") => {
                    w.toks.truncate(last);
                    w
                }
                Some(t) => {
                    w.toks[last] = t;
                    w
                }
                None => w,
            }
        };
        let mut w = line;
        if w.peek().is_none() {
            return Err(w.error("Empty statement", "Expected a statement before \";\""));
        }
        let keyword = w.next("a statement keyword")?;

        // Only rules may appear inside conditional blocks
        if self.cond.is_some()
            && keyword.parse::<AvRuleType>().is_err()
            && keyword.parse::<TeRuleType>().is_err()
        {
            return Err(w.error(
                "Statement not allowed in a conditional block",
                "Only access vector and type_* rules may be conditional",
            ));
        }

        if let Ok(ruletype) = keyword.parse::<AvRuleType>() {
            // "allow" is also the RBAC rule keyword.  An av rule target
            // always carries ":class".
            if ruletype == AvRuleType::Allow
                && !w.peek_at(1).map(|t| t.contains(':')).unwrap_or(false)
            {
                return self.role_allow(w);
            }
            return self.av_rule(ruletype, w);
        }
        if let Ok(ruletype) = keyword.parse::<TeRuleType>() {
            return self.te_rule(ruletype, w);
        }
        if let Ok(ruletype) = keyword.parse::<FsUseType>() {
            return self.fs_use(ruletype, w);
        }
        if let Ok(ruletype) = keyword.parse::<DefaultRuleType>() {
            return self.default_rule(ruletype, w);
        }

        match keyword {
            "policy_version" => {
                let tok = w.next("a version number")?;
                let version = tok
                    .parse::<u32>()
                    .map_err(|_| w.error("Invalid policy version", "Expected an integer"))?;
                self.policy.properties.version = Some(version);
                w.finish()
            }
            "handle_unknown" => {
                let tok = w.next("allow, deny or reject")?;
                let value = tok.parse::<HandleUnknown>().map_err(|_| {
                    w.error("Invalid handle_unknown", "Expected allow, deny or reject")
                })?;
                self.policy.properties.handle_unknown = Some(value);
                w.finish()
            }
            "common" => {
                let name = w.next("a common name")?;
                let perms = w.list("a permission")?;
                self.policy
                    .commons
                    .entry(name.to_string())
                    .or_default()
                    .extend(perms.iter().map(|p| p.to_string()));
                w.finish()
            }
            "class" => self.class(w),
            "bool" => {
                let name = w.next("a boolean name")?;
                let state = match w.next("true or false")? {
                    "true" => true,
                    "false" => false,
                    _ => return Err(w.error("Invalid boolean state", "Expected true or false")),
                };
                self.policy.booleans.insert(name.to_string(), state);
                w.finish()
            }
            "attribute" => {
                let name = w.next("an attribute name")?;
                self.policy.attributes.entry(name.to_string()).or_default();
                w.finish()
            }
            "type" => {
                let name = w.next("a type name")?;
                self.policy.types.entry(name.to_string()).or_default();
                w.finish()
            }
            "typealias" => self.typealias(w),
            "typeattribute" => self.typeattribute(w),
            "permissive" => {
                let name = w.next("a type name")?;
                match self.policy.types.get_mut(name) {
                    Some(decl) => decl.permissive = true,
                    None => {
                        return Err(
                            w.error("Unknown type", &format!("\"{}\" is not declared", name))
                        )
                    }
                }
                w.finish()
            }
            "role" => {
                let name = w.next("a role name")?;
                let entry = self.policy.roles.entry(name.to_string()).or_default();
                if w.accept("types") {
                    let types = w.list("a type")?;
                    entry.extend(types.iter().map(|t| t.to_string()));
                }
                w.finish()
            }
            "user" => self.user(w),
            "sensitivity" => {
                self.policy.properties.mls = true;
                self.aliased(w, "a sensitivity name", |policy| &mut policy.sensitivities)
            }
            "category" => self.aliased(w, "a category name", |policy| &mut policy.categories),
            "level" => {
                let tok = w.next("an MLS level")?;
                let level = tok
                    .parse::<Level>()
                    .map_err(|e| w.error("Invalid MLS level", &e.to_string()))?;
                self.policy
                    .levels
                    .entry(level.sensitivity)
                    .or_default()
                    .extend(level.categories);
                w.finish()
            }
            "role_allow" => self.role_allow(w),
            "role_transition" => {
                let source = w.next("a source role")?;
                let tok = w.next("a target (target:class)")?;
                let (target, tclass) = split_target(&w, tok)?;
                let default = w.next("a default role")?;
                self.policy
                    .role_transitions
                    .insert((source.to_string(), target, tclass), default.to_string());
                w.finish()
            }
            "range_transition" => {
                let source = w.next("a source type")?;
                let tok = w.next("a target (target:class)")?;
                let (target, tclass) = split_target(&w, tok)?;
                let range = w.rest("an MLS range")?;
                let range = range
                    .parse::<MlsRange>()
                    .map_err(|e| w.error("Invalid MLS range", &e.to_string()))?;
                self.policy
                    .range_transitions
                    .insert((source.to_string(), target, tclass), range);
                w.finish()
            }
            "sid" => {
                let name = w.next("an initial SID name")?;
                let tok = w.next("a security context")?;
                let context = parse_context(&w, tok)?;
                self.policy.initial_sids.insert(name.to_string(), context);
                w.finish()
            }
            "genfscon" => self.genfscon(w),
            "netifcon" => {
                let netif = w.next("an interface name")?;
                let tok = w.next("a security context")?;
                let context = parse_context(&w, tok)?;
                let tok = w.next("a packet context")?;
                let packet = parse_context(&w, tok)?;
                self.policy
                    .netifcons
                    .insert(netif.to_string(), (context, packet));
                w.finish()
            }
            "nodecon" => {
                let tok = w.next("an IP address")?;
                let address = parse_addr(&w, tok)?;
                let tok = w.next("a netmask")?;
                let netmask = parse_addr(&w, tok)?;
                let tok = w.next("a security context")?;
                let context = parse_context(&w, tok)?;
                self.policy.nodecons.insert((address, netmask), context);
                w.finish()
            }
            "portcon" => self.portcon(w),
            "policycap" => {
                let name = w.next("a capability name")?;
                self.policy.polcaps.insert(name.to_string());
                w.finish()
            }
            _ => Err(w.error(
                "Unknown statement",
                &format!("\"{}\" is not a recognized statement keyword", keyword),
            )),
        }
    }

    fn class(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let name = w.next("a class name")?;
        let mut perms: BTreeSet<String> = BTreeSet::new();
        if w.accept("inherits") {
            let common = w.next("a common name")?;
            match self.policy.commons.get(common) {
                Some(common_perms) => perms.extend(common_perms.iter().cloned()),
                None => {
                    return Err(w.error(
                        "Unknown common",
                        &format!("\"{}\" is not declared before this class", common),
                    ))
                }
            }
        }
        if w.peek().is_some() {
            perms.extend(w.list("a permission")?.iter().map(|p| p.to_string()));
        }
        self.policy
            .classes
            .entry(name.to_string())
            .or_default()
            .extend(perms);
        w.finish()
    }

    fn typealias(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let name = w.next("a type name")?;
        if !w.accept("alias") {
            return Err(w.error("Invalid typealias", "Expected \"alias\" after the type name"));
        }
        let aliases = w.list("an alias name")?;
        match self.policy.types.get_mut(name) {
            Some(decl) => decl
                .aliases
                .extend(aliases.iter().map(|a| a.to_string())),
            None => return Err(w.error("Unknown type", &format!("\"{}\" is not declared", name))),
        }
        w.finish()
    }

    fn typeattribute(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let name = w.next("a type name")?;
        if self.policy.types.get(name).is_none() {
            return Err(w.error("Unknown type", &format!("\"{}\" is not declared", name)));
        }
        let mut attrs = Vec::new();
        while let Some(tok) = w.peek() {
            w.pos += 1;
            let attr = tok.trim_end_matches(',');
            if !attr.is_empty() {
                attrs.push(attr.to_string());
            }
        }
        if attrs.is_empty() {
            return Err(w.error("Incomplete statement", "Expected at least one attribute"));
        }
        for attr in attrs {
            self.policy
                .attributes
                .entry(attr.clone())
                .or_default()
                .insert(name.to_string());
            // Unwrap safe since the declaration was checked above
            self.policy
                .types
                .get_mut(name)
                .unwrap()
                .attributes
                .insert(attr);
        }
        Ok(())
    }

    fn user(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let name = w.next("a user name")?;
        if !w.accept("roles") {
            return Err(w.error("Invalid user", "Expected \"roles\" after the user name"));
        }
        let roles = w.list("a role")?;
        let entry = self.policy.users.entry(name.to_string()).or_default();
        entry.roles.extend(roles.iter().map(|r| r.to_string()));
        if w.accept("level") {
            let tok = w.next("an MLS level")?;
            let level = tok
                .parse::<Level>()
                .map_err(|e| w.error("Invalid MLS level", &e.to_string()))?;
            self.policy.users.get_mut(name).unwrap().level = Some(level);
        }
        if w.accept("range") {
            let range = w.rest("an MLS range")?;
            let range = range
                .parse::<MlsRange>()
                .map_err(|e| w.error("Invalid MLS range", &e.to_string()))?;
            self.policy.users.get_mut(name).unwrap().range = Some(range);
        }
        w.finish()
    }

    // sensitivity and category statements share the "name [alias ...]" shape
    fn aliased<F>(&mut self, mut w: Words<'a>, what: &str, collection: F) -> Result<(), ParseError>
    where
        F: Fn(&mut SELinuxPolicy) -> &mut std::collections::BTreeMap<String, BTreeSet<String>>,
    {
        let name = w.next(what)?;
        let entry = collection(&mut self.policy)
            .entry(name.to_string())
            .or_default();
        if w.accept("alias") {
            let aliases = w.list("an alias name")?;
            entry.extend(aliases.iter().map(|a| a.to_string()));
        }
        w.finish()
    }

    fn av_rule(&mut self, ruletype: AvRuleType, mut w: Words<'a>) -> Result<(), ParseError> {
        let source = w.next("a source type")?;
        let tok = w.next("a target (target:class)")?;
        let (target, tclass) = split_target(&w, tok)?;
        let perms = w.list("a permission")?;
        let key = AvKey {
            ruletype,
            source: source.to_string(),
            target,
            tclass,
            conditional: self.cond.clone(),
        };
        self.policy
            .insert_av(key, perms.iter().map(|p| p.to_string()).collect());
        w.finish()
    }

    fn te_rule(&mut self, ruletype: TeRuleType, mut w: Words<'a>) -> Result<(), ParseError> {
        let source = w.next("a source type")?;
        let tok = w.next("a target (target:class)")?;
        let (target, tclass) = split_target(&w, tok)?;
        let default = w.next("a default type")?;
        let filename = match w.peek() {
            Some(tok) if ruletype == TeRuleType::TypeTransition => {
                w.pos += 1;
                let name = tok
                    .strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .filter(|t| !t.is_empty());
                match name {
                    Some(n) => Some(n.to_string()),
                    None => {
                        return Err(
                            w.error("Invalid filename", "Expected a quoted filename token")
                        )
                    }
                }
            }
            _ => None,
        };
        let key = TeKey {
            ruletype,
            source: source.to_string(),
            target,
            tclass,
            filename,
            conditional: self.cond.clone(),
        };
        self.policy.te_rules.insert(key, default.to_string());
        w.finish()
    }

    fn role_allow(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let source = w.next("a source role")?;
        let target = w.next("a target role")?;
        self.policy.role_allows.insert(RoleAllow {
            source: source.to_string(),
            target: target.to_string(),
        });
        w.finish()
    }

    fn fs_use(&mut self, ruletype: FsUseType, mut w: Words<'a>) -> Result<(), ParseError> {
        let fs = w.next("a filesystem type")?;
        let tok = w.next("a security context")?;
        let context = parse_context(&w, tok)?;
        self.policy.fs_uses.insert((ruletype, fs.to_string()), context);
        w.finish()
    }

    fn genfscon(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let fs = w.next("a filesystem type")?;
        let path = w.next("a path")?;
        let filetype = match w.peek() {
            Some(tok) if tok.starts_with('-') && !tok.contains(':') => {
                w.pos += 1;
                Some(tok.to_string())
            }
            _ => None,
        };
        let tok = w.next("a security context")?;
        let context = parse_context(&w, tok)?;
        self.policy
            .genfscons
            .insert((fs.to_string(), path.to_string(), filetype), context);
        w.finish()
    }

    fn portcon(&mut self, mut w: Words<'a>) -> Result<(), ParseError> {
        let proto = w.next("a protocol")?;
        let protocol = proto
            .parse::<Protocol>()
            .map_err(|_| w.error("Invalid protocol", "Expected tcp, udp, dccp or sctp"))?;
        let ports = w.next("a port or port range")?;
        let (low, high) = match ports.find('-') {
            Some(i) => (&ports[..i], &ports[i + 1..]),
            None => (ports, ports),
        };
        let low = low
            .parse::<u16>()
            .map_err(|_| w.error("Invalid port", "Expected a port number"))?;
        let high = high
            .parse::<u16>()
            .map_err(|_| w.error("Invalid port", "Expected a port number"))?;
        if low > high {
            return Err(w.error("Invalid port range", "The low port exceeds the high port"));
        }
        let tok = w.next("a security context")?;
        let context = parse_context(&w, tok)?;
        self.policy.portcons.insert((protocol, low, high), context);
        w.finish()
    }

    fn default_rule(&mut self, ruletype: DefaultRuleType, mut w: Words<'a>) -> Result<(), ParseError> {
        let classes = w.list("an object class")?;
        let tok = w.next("source or target")?;
        let default = tok
            .parse::<DefaultValue>()
            .map_err(|_| w.error("Invalid default", "Expected source or target"))?;
        let range = if ruletype == DefaultRuleType::Range {
            let tok = w.next("low, high or low_high")?;
            Some(
                tok.parse::<DefaultRangeValue>()
                    .map_err(|_| w.error("Invalid default range", "Expected low, high or low_high"))?,
            )
        } else {
            None
        };
        for class in classes {
            self.policy
                .defaults
                .insert((ruletype, class.to_string()), (default, range));
        }
        w.finish()
    }
}

fn split_target(w: &Words, tok: &str) -> Result<(String, String), ParseError> {
    let mut parts = tok.splitn(2, ':');
    match (parts.next(), parts.next()) {
        (Some(target), Some(tclass)) if !target.is_empty() && !tclass.is_empty() => {
            Ok((target.to_string(), tclass.to_string()))
        }
        _ => Err(w.error(
            "Invalid rule target",
            &format!("Expected \"target:class\", found \"{}\"", tok),
        )),
    }
}

fn parse_context(w: &Words, tok: &str) -> Result<Context, ParseError> {
    tok.parse::<Context>()
        .map_err(|e| w.error("Invalid security context", &e.to_string()))
}

fn parse_addr(w: &Words, tok: &str) -> Result<std::net::IpAddr, ParseError> {
    tok.parse::<std::net::IpAddr>()
        .map_err(|_| w.error("Invalid address", &format!("\"{}\" is not an IP address", tok)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::AvRule;

    fn parse(source: &str) -> Result<SELinuxPolicy, LoadErrors> {
        let file = SimpleFile::new("test.conf".to_string(), source.to_string());
        parse_policy(&file)
    }

    fn parse_ok(source: &str) -> SELinuxPolicy {
        parse(source).expect("policy should parse")
    }

    #[test]
    fn components() {
        let policy = parse_ok(
            "policy_version 32;
             handle_unknown deny;
             common file { ioctl read write };
             class file inherits file { open };
             class process { fork signal };
             bool secure_mode false;
             attribute domain;
             type init_t;
             typealias init_t alias initrc_t;
             typeattribute init_t domain;
             permissive init_t;
             role system_r types init_t;
             sensitivity s0;
             category c0 alias red;
             level s0:c0;
             user system_u roles system_r level s0 range s0 - s0:c0;
            ",
        );
        assert_eq!(policy.properties.version, Some(32));
        assert_eq!(policy.properties.handle_unknown, Some(HandleUnknown::Deny));
        assert!(policy.properties.mls);
        assert_eq!(policy.commons["file"].len(), 3);
        // Inherited common perms are folded into the class
        assert_eq!(policy.classes["file"].len(), 4);
        assert_eq!(policy.classes["process"].len(), 2);
        assert_eq!(policy.booleans["secure_mode"], false);
        let init = &policy.types["init_t"];
        assert!(init.permissive);
        assert!(init.aliases.contains("initrc_t"));
        assert!(init.attributes.contains("domain"));
        assert!(policy.attributes["domain"].contains("init_t"));
        assert!(policy.roles["system_r"].contains("init_t"));
        assert!(policy.sensitivities.contains_key("s0"));
        assert!(policy.categories["c0"].contains("red"));
        assert_eq!(policy.levels["s0"].len(), 1);
        let user = &policy.users["system_u"];
        assert_eq!(user.level.as_ref().unwrap().to_string(), "s0");
        assert_eq!(user.range.as_ref().unwrap().to_string(), "s0 - s0:c0");
    }

    #[test]
    fn rules() {
        let policy = parse_ok(
            "allow init_t bin_t:file { read execute };
             dontaudit init_t tmp_t:dir read;
             type_transition init_t bin_t:process daemon_t;
             type_transition init_t etc_t:file conf_t \"config\";
             allow system_r user_r;
             role_transition system_r bin_t:process user_r;
             range_transition init_t bin_t:process s0 - s1;
            ",
        );
        assert_eq!(policy.av_rules.len(), 2);
        assert_eq!(policy.te_rules.len(), 2);
        // "allow" with no :class on the target is a role allow
        assert_eq!(policy.role_allows.len(), 1);
        assert_eq!(policy.role_transitions.len(), 1);
        let range = &policy.range_transitions[&(
            "init_t".to_string(),
            "bin_t".to_string(),
            "process".to_string(),
        )];
        assert_eq!(range.to_string(), "s0 - s1");
        let named = policy
            .te_rules
            .keys()
            .find(|k| k.filename.is_some())
            .unwrap();
        assert_eq!(named.filename.as_deref(), Some("config"));
    }

    #[test]
    fn labeling() {
        let policy = parse_ok(
            "sid kernel system_u:system_r:kernel_t:s0
             fs_use_xattr ext4 system_u:object_r:fs_t:s0;
             genfscon proc / system_u:object_r:proc_t:s0;
             genfscon proc /net -d system_u:object_r:proc_net_t:s0;
             netifcon eth0 system_u:object_r:netif_t:s0 system_u:object_r:packet_t:s0;
             nodecon 10.0.0.0 255.0.0.0 system_u:object_r:node_t:s0;
             portcon tcp 80 system_u:object_r:http_port_t:s0;
             portcon udp 1024-2048 system_u:object_r:port_t:s0;
             policycap network_peer_controls;
             default_user file source;
             default_range { file dir } target low_high;
            ",
        );
        assert_eq!(policy.initial_sids.len(), 1);
        assert_eq!(policy.fs_uses.len(), 1);
        assert_eq!(policy.genfscons.len(), 2);
        assert_eq!(policy.netifcons.len(), 1);
        assert_eq!(policy.nodecons.len(), 1);
        assert_eq!(policy.portcons.len(), 2);
        assert!(policy.polcaps.contains("network_peer_controls"));
        assert_eq!(policy.defaults.len(), 3);
    }

    #[test]
    fn conditional_blocks() {
        let policy = parse_ok(
            "bool secure_mode false;
             if (secure_mode) {
                 allow init_t bin_t:file read;
             } else {
                 allow init_t bin_t:file write;
             }
             allow init_t bin_t:file getattr;
            ",
        );
        assert_eq!(policy.av_rules.len(), 3);
        let rules: Vec<AvRule> = policy
            .av_rules
            .iter()
            .map(|(k, v)| k.rule(v))
            .collect();
        let conditional: Vec<&AvRule> =
            rules.iter().filter(|r| r.conditional.is_some()).collect();
        assert_eq!(conditional.len(), 2);
        assert!(conditional
            .iter()
            .any(|r| r.conditional.as_ref().unwrap().branch));
        assert!(conditional
            .iter()
            .any(|r| !r.conditional.as_ref().unwrap().branch));
    }

    #[test]
    fn duplicate_statements_merge() {
        let policy = parse_ok(
            "allow a_t b_t:file read;
             allow a_t b_t:file write;
             role r types a_t;
             role r types b_t;
            ",
        );
        assert_eq!(policy.av_rules.len(), 1);
        assert_eq!(policy.av_rules.values().next().unwrap().len(), 2);
        assert_eq!(policy.roles["r"].len(), 2);
    }

    #[test]
    fn errors_accumulate() {
        let errors = parse(
            "type init_t;
             frob init_t;
             allow init_t bin_t read;
             bool broken maybe;
            ",
        )
        .unwrap_err();
        assert_eq!(errors.error_count(), 3);
    }

    #[test]
    fn conditional_errors() {
        assert!(parse("}").is_err());
        assert!(parse("} else {").is_err());
        assert!(parse("if (x) {\nallow a b:c d;\n").is_err());
        assert!(parse("if (x) {\nbool y true;\n}").is_err());
        assert!(parse("if (x) {\nif (y) {\n}\n}").is_err());
    }

    #[test]
    fn comments_and_blanks() {
        let policy = parse_ok(
            "# a full line comment

             type init_t; # a trailing comment
            ",
        );
        assert_eq!(policy.types.len(), 1);
    }
}
