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

//! User macros.
//!
//! Global macro columns: `macro, value`. Host macro columns: `hostid, macro, value`.

use confcache_common::error::Result;
use confcache_memory::{Interned, StringPool};

use super::{drive, Applied, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{parse_macro_ref, GlobalMacro, HostMacro},
    store::{Release, Store},
};

/// Split `{$NAME:context}` into name and context, `None` if the text is not a single macro.
fn parse_macro_name(text: &str) -> Option<(&str, Option<String>)> {
    let m = parse_macro_ref(text)?;
    (m.len == text.len()).then_some((m.name, m.context))
}

fn replace_context(pool: &mut StringPool, found: bool, slot: &mut Option<Interned>, context: Option<&str>) -> Result<()> {
    match (slot.as_mut(), context) {
        (Some(interned), Some(ctx)) => {
            pool.replace(found, interned, ctx)?;
        }
        (None, Some(ctx)) => *slot = Some(pool.intern(ctx)?),
        (_, None) => slot.take().release(pool),
    }
    Ok(())
}

impl Store {
    pub(super) fn sync_global_macros(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let globalmacroid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_global_macro(globalmacroid);
                return Ok(Applied::Done);
            }
            let Some((name, context)) = parse_macro_name(row.str(0)) else {
                tracing::warn!(globalmacroid, r#macro = row.str(0), "[sync]: cannot parse global macro");
                return Ok(Applied::Skipped);
            };

            let (token, found) = self.gmacros.find_or_create(globalmacroid, || GlobalMacro {
                globalmacroid,
                ..Default::default()
            })?;
            let Some(m) = self.gmacros.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            let renamed = !found || self.pool.get(&m.name) != name;
            if renamed {
                if found {
                    self.gmacros_m.remove(&m.name.key(), globalmacroid);
                }
                self.pool.replace(found, &mut m.name, name)?;
                self.gmacros_m.add(m.name.key(), globalmacroid);
            }
            replace_context(&mut self.pool, found, &mut m.context, context.as_deref())?;
            self.pool.replace(found, &mut m.value, row.str(1))?;
            Ok(Applied::Done)
        })
    }

    fn remove_global_macro(&mut self, globalmacroid: u64) {
        if let Some(m) = self.gmacros.remove(globalmacroid) {
            self.gmacros_m.remove(&m.name.key(), globalmacroid);
            m.release(&mut self.pool);
        }
    }

    pub(super) fn sync_host_macros(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let hostmacroid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_host_macro(hostmacroid);
                return Ok(Applied::Done);
            }
            let hostid = row.u64(0);
            let Some((name, context)) = parse_macro_name(row.str(1)) else {
                tracing::warn!(hostmacroid, hostid, r#macro = row.str(1), "[sync]: cannot parse host macro");
                return Ok(Applied::Skipped);
            };

            let (token, found) = self.hmacros.find_or_create(hostmacroid, || HostMacro {
                hostmacroid,
                hostid,
                ..Default::default()
            })?;
            let Some(m) = self.hmacros.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            let renamed = !found || m.hostid != hostid || self.pool.get(&m.name) != name;
            if renamed {
                if found {
                    self.hmacros_hm.remove(&(m.hostid, m.name.key()), hostmacroid);
                }
                m.hostid = hostid;
                self.pool.replace(found, &mut m.name, name)?;
                self.hmacros_hm.add((hostid, m.name.key()), hostmacroid);
            }
            replace_context(&mut self.pool, found, &mut m.context, context.as_deref())?;
            self.pool.replace(found, &mut m.value, row.str(2))?;
            Ok(Applied::Done)
        })
    }

    pub(crate) fn remove_host_macro(&mut self, hostmacroid: u64) {
        if let Some(m) = self.hmacros.remove(hostmacroid) {
            self.hmacros_hm.remove(&(m.hostid, m.name.key()), hostmacroid);
            m.release(&mut self.pool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_macro_name() {
        assert_eq!(parse_macro_name("{$M}"), Some(("M", None)));
        assert_eq!(parse_macro_name("{$M:ctx}"), Some(("M", Some("ctx".to_string()))));
        assert_eq!(parse_macro_name("{$M:\"a b\"}"), Some(("M", Some("a b".to_string()))));
        assert_eq!(parse_macro_name("{$M} tail"), None);
        assert_eq!(parse_macro_name("M"), None);
    }
}
