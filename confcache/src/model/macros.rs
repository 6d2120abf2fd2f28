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

use confcache_memory::Interned;

/// A global user macro.
#[derive(Debug, Default)]
pub struct GlobalMacro {
    /// Macro id.
    pub globalmacroid: u64,
    /// Name without the `{$` and `}` delimiters.
    pub name: Interned,
    /// Context, `None` for the default macro.
    pub context: Option<Interned>,
    /// Value.
    pub value: Interned,
}

/// A host or template level user macro.
#[derive(Debug, Default)]
pub struct HostMacro {
    /// Macro id.
    pub hostmacroid: u64,
    /// Owner host or template.
    pub hostid: u64,
    /// Name without the `{$` and `}` delimiters.
    pub name: Interned,
    /// Context, `None` for the default macro.
    pub context: Option<Interned>,
    /// Value.
    pub value: Interned,
}

/// A user macro reference parsed from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRef<'a> {
    /// Name.
    pub name: &'a str,
    /// Context, unquoted.
    pub context: Option<String>,
    /// Length of the reference in the source text.
    pub len: usize,
}

fn is_macro_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == b'_' || c == b'.'
}

/// Parse a user macro reference such as `{$NAME}`, `{$NAME:context}` or `{$NAME:"quoted context"}` at the start
/// of `text`.
pub fn parse_macro_ref(text: &str) -> Option<MacroRef<'_>> {
    let bytes = text.as_bytes();
    if !text.starts_with("{$") {
        return None;
    }

    let name_len = bytes[2..].iter().take_while(|&&c| is_macro_char(c)).count();
    if name_len == 0 {
        return None;
    }
    let name = &text[2..2 + name_len];
    let mut pos = 2 + name_len;

    match bytes.get(pos)? {
        b'}' => {
            return Some(MacroRef {
                name,
                context: None,
                len: pos + 1,
            })
        }
        b':' => pos += 1,
        _ => return None,
    }

    // Leading spaces before a quoted context are ignored.
    let ctx_start = pos;
    while bytes.get(pos) == Some(&b' ') {
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'"') {
        pos += 1;
        let mut context = String::new();
        loop {
            match bytes.get(pos)? {
                b'\\' if bytes.get(pos + 1) == Some(&b'"') => {
                    context.push('"');
                    pos += 2;
                }
                b'"' => {
                    pos += 1;
                    break;
                }
                _ => {
                    let ch = text[pos..].chars().next()?;
                    context.push(ch);
                    pos += ch.len_utf8();
                }
            }
        }
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        if bytes.get(pos)? != &b'}' {
            return None;
        }
        return Some(MacroRef {
            name,
            context: Some(context),
            len: pos + 1,
        });
    }

    let end = text[ctx_start..].find('}')? + ctx_start;
    Some(MacroRef {
        name,
        context: Some(text[ctx_start..end].to_string()),
        len: end + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_macro_ref() {
        let m = parse_macro_ref("{$PORT} and more").unwrap();
        assert_eq!((m.name, m.context, m.len), ("PORT", None, 7));

        let m = parse_macro_ref("{$LOW.SPACE:/var}").unwrap();
        assert_eq!((m.name, m.context.as_deref(), m.len), ("LOW.SPACE", Some("/var"), 17));

        let m = parse_macro_ref(r#"{$M: "a:\"b}" }"#).unwrap();
        assert_eq!(m.context.as_deref(), Some(r#"a:"b}"#));
        assert_eq!(m.len, 15);

        for bad in ["{$}", "{$lower}", "{$M", "{$M:\"open}", "{M}", "{$M!}"] {
            assert_eq!(parse_macro_ref(bad), None, "{bad}");
        }
    }
}
