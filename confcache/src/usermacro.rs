// Copyright 2026 confcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! User macro resolution.
//!
//! A macro `{$NAME:context}` resolves, in order, to a host macro with the same context found on the given hosts
//! or up their template chains, a global macro with the same context, a host macro without context, and a global
//! macro without context.

use confcache_memory::{Interned, StrKey};
use hashbrown::HashSet;

use crate::{model::parse_macro_ref, store::Store};

/// A macro value matching the requested context, and the first context free value seen on the way.
#[derive(Debug, Default)]
struct Found<'a> {
    exact: Option<&'a str>,
    default: Option<&'a str>,
}

impl<'a> Found<'a> {
    /// Consider one macro, returning `true` once an exact match is known.
    fn offer(&mut self, macro_context: Option<&'a str>, context: Option<&str>, value: &'a str) -> bool {
        match (macro_context, context) {
            (None, None) => {
                self.exact = Some(value);
                true
            }
            (Some(mc), Some(c)) if mc == c => {
                self.exact = Some(value);
                true
            }
            (None, Some(_)) => {
                self.default.get_or_insert(value);
                false
            }
            _ => false,
        }
    }
}

impl Store {
    fn context_of<'a>(&'a self, context: &'a Option<Interned>) -> Option<&'a str> {
        context.as_ref().map(|c| self.pool.get(c))
    }

    fn find_host_macro<'a>(&'a self, hostids: &[u64], name: StrKey, context: Option<&str>) -> Found<'a> {
        let mut found = Found::default();
        let mut visited = HashSet::new();
        let mut level = hostids.iter().copied().filter(|&id| visited.insert(id)).collect::<Vec<_>>();

        while !level.is_empty() {
            for &hostid in &level {
                for &id in self.hmacros_hm.get(&(hostid, name)) {
                    let Some(m) = self.hmacros.get(id) else {
                        continue;
                    };
                    if found.offer(self.context_of(&m.context), context, self.pool.get(&m.value)) {
                        return found;
                    }
                }
            }
            level = level
                .iter()
                .flat_map(|&hostid| self.htmpls.get(&hostid).iter().copied())
                .filter(|&id| visited.insert(id))
                .collect();
        }
        found
    }

    fn find_global_macro<'a>(&'a self, name: StrKey, context: Option<&str>) -> Found<'a> {
        let mut found = Found::default();
        for &id in self.gmacros_m.get(&name) {
            let Some(m) = self.gmacros.get(id) else {
                continue;
            };
            if found.offer(self.context_of(&m.context), context, self.pool.get(&m.value)) {
                break;
            }
        }
        found
    }

    /// Value of the user macro `name` with optional `context` for the given hosts.
    pub(crate) fn resolve_macro(&self, hostids: &[u64], name: &str, context: Option<&str>) -> Option<&str> {
        let key = self.pool.lookup(name)?;
        let host = self.find_host_macro(hostids, key, context);
        if host.exact.is_some() {
            return host.exact;
        }
        let global = self.find_global_macro(key, context);
        global.exact.or(host.default).or(global.default)
    }

    /// Replace every resolvable user macro in `text`.
    ///
    /// Values rejected by `validator` are not substituted.
    pub(crate) fn expand_macros_with(&self, text: &str, hostids: &[u64], validator: Option<&dyn Fn(&str) -> bool>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find("{$") {
            out.push_str(&rest[..pos]);
            rest = &rest[pos..];
            let Some(m) = parse_macro_ref(rest) else {
                out.push('{');
                rest = &rest[1..];
                continue;
            };
            let value = self
                .resolve_macro(hostids, m.name, m.context.as_deref())
                .filter(|&v| validator.is_none_or(|f| f(v)));
            match value {
                Some(v) => out.push_str(v),
                None => out.push_str(&rest[..m.len]),
            }
            rest = &rest[m.len..];
        }
        out.push_str(rest);
        out
    }

    /// Replace every resolvable user macro in `text`.
    pub(crate) fn expand_macros(&self, text: &str, hostids: &[u64]) -> String {
        if !text.contains("{$") {
            return text.to_string();
        }
        self.expand_macros_with(text, hostids, None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confcache_memory::{arena::MIN_CAPACITY, Arena};

    use super::*;
    use crate::{
        config::CacheConfig,
        model::{GlobalMacro, HostMacro},
    };

    fn store() -> Store {
        let arena = Arc::new(Arena::new(MIN_CAPACITY * 8).unwrap());
        Store::new(CacheConfig::default(), arena)
    }

    fn global(store: &mut Store, id: u64, name: &str, context: Option<&str>, value: &str) {
        let m = GlobalMacro {
            globalmacroid: id,
            name: store.pool.intern(name).unwrap(),
            context: context.map(|c| store.pool.intern(c).unwrap()),
            value: store.pool.intern(value).unwrap(),
        };
        store.gmacros_m.add(m.name.key(), id);
        store.gmacros.find_or_create(id, || m).unwrap();
    }

    fn host(store: &mut Store, id: u64, hostid: u64, name: &str, context: Option<&str>, value: &str) {
        let m = HostMacro {
            hostmacroid: id,
            hostid,
            name: store.pool.intern(name).unwrap(),
            context: context.map(|c| store.pool.intern(c).unwrap()),
            value: store.pool.intern(value).unwrap(),
        };
        store.hmacros_hm.add((hostid, m.name.key()), id);
        store.hmacros.find_or_create(id, || m).unwrap();
    }

    #[test]
    fn test_precedence() {
        let mut store = store();
        host(&mut store, 1, 10, "M", Some("ctx"), "HV");
        host(&mut store, 2, 10, "M", None, "HD");
        global(&mut store, 3, "M", Some("ctx"), "GV");
        global(&mut store, 4, "M", None, "GD");

        assert_eq!(store.resolve_macro(&[10], "M", Some("ctx")), Some("HV"));
        assert_eq!(store.resolve_macro(&[10], "M", None), Some("HD"));
        assert_eq!(store.resolve_macro(&[10], "M", Some("other")), Some("HD"));
        assert_eq!(store.resolve_macro(&[20], "M", Some("ctx")), Some("GV"));
        assert_eq!(store.resolve_macro(&[20], "M", Some("other")), Some("GD"));
        assert_eq!(store.resolve_macro(&[10], "UNKNOWN", None), None);
    }

    #[test]
    fn test_global_context_beats_host_default() {
        let mut store = store();
        host(&mut store, 2, 10, "M", None, "HD");
        global(&mut store, 3, "M", Some("ctx"), "GV");
        assert_eq!(store.resolve_macro(&[10], "M", Some("ctx")), Some("GV"));
    }

    #[test]
    fn test_template_chain() {
        let mut store = store();
        store.htmpls.add(10, 100);
        store.htmpls.add(100, 1000);
        host(&mut store, 1, 1000, "PORT", None, "161");
        host(&mut store, 2, 100, "COMMUNITY", None, "public");
        host(&mut store, 3, 10, "COMMUNITY", None, "private");
        assert_eq!(store.resolve_macro(&[10], "PORT", None), Some("161"));
        assert_eq!(store.resolve_macro(&[10], "COMMUNITY", None), Some("private"));
        assert_eq!(store.resolve_macro(&[100], "COMMUNITY", None), Some("public"));
    }

    #[test]
    fn test_expand() {
        let mut store = store();
        host(&mut store, 1, 10, "IP", None, "10.0.0.1");
        global(&mut store, 2, "PORT", None, "10050");
        global(&mut store, 3, "SECRET", None, "hunter2");

        assert_eq!(store.expand_macros("{$IP}:{$PORT}", &[10]), "10.0.0.1:10050");
        assert_eq!(store.expand_macros("{$MISSING} {$IP", &[10]), "{$MISSING} {$IP");
        assert_eq!(store.expand_macros("no macros", &[10]), "no macros");

        let reject_secrets = |v: &str| v != "hunter2";
        assert_eq!(
            store.expand_macros_with("{$PORT}/{$SECRET}", &[10], Some(&reject_secrets)),
            "10050/{$SECRET}"
        );
    }
}
