//! The alias table.
//!
//! Aliases are keyed by the client executable's name and replace the first
//! token of a completed line. Targets may splice in arguments (`$1`..`$9`,
//! `$*`), the literal metacharacters `$L` `$G` `$B`, a literal dollar (`$$`),
//! and `$T`, which separates the expansion into multiple input lines.

use crate::wchar::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct Alias {
    name: WString,
    target: WString,
}

#[derive(Default)]
pub struct AliasTable {
    // Keyed by uppercased executable name; lookups are case-insensitive.
    exes: HashMap<WString, Vec<Alias>>,
}

fn fold_case(s: &wstr) -> WString {
    s.as_char_slice()
        .iter()
        .flat_map(|c| c.to_uppercase())
        .collect()
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) an alias. An empty target removes it.
    pub fn set(&mut self, exe: &wstr, name: &wstr, target: &wstr) {
        let list = self.exes.entry(fold_case(exe)).or_default();
        let folded = fold_case(name);
        list.retain(|a| fold_case(&a.name) != folded);
        if !target.is_empty() {
            list.push(Alias {
                name: name.to_owned(),
                target: target.to_owned(),
            });
        }
    }

    pub fn get(&self, exe: &wstr, name: &wstr) -> Option<&wstr> {
        let folded = fold_case(name);
        self.exes
            .get(&fold_case(exe))?
            .iter()
            .find(|a| fold_case(&a.name) == folded)
            .map(|a| a.target.as_utfstr())
    }

    /// Match `source` (one completed line, no terminator) against the table
    /// and expand. Returns the replacement text, terminated with CR LF per
    /// line, and the number of lines, capped at `capacity` characters.
    pub fn match_and_copy(
        &self,
        exe: &wstr,
        source: &wstr,
        capacity: usize,
    ) -> Option<(WString, usize)> {
        let chars = source.as_char_slice();
        let name_len = chars.iter().position(|c| c.is_whitespace()).unwrap_or(chars.len());
        let target = self.get(exe, &source[..name_len])?.to_owned();

        let args: Vec<&[char]> = chars[name_len..]
            .split(|c| c.is_whitespace())
            .filter(|w| !w.is_empty())
            .collect();
        let tail_start = chars[name_len..]
            .iter()
            .position(|c| !c.is_whitespace())
            .map(|i| name_len + i);

        let mut out = WString::new();
        let mut lines = 1;
        let mut iter = target.as_char_slice().iter().copied().peekable();
        while let Some(c) = iter.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match iter.next() {
                Some(d @ '1'..='9') => {
                    let i = d as usize - '1' as usize;
                    if let Some(arg) = args.get(i) {
                        for &a in arg.iter() {
                            out.push(a);
                        }
                    }
                }
                Some('*') => {
                    if let Some(start) = tail_start {
                        for &a in &chars[start..] {
                            out.push(a);
                        }
                    }
                }
                Some('l') | Some('L') => out.push('<'),
                Some('g') | Some('G') => out.push('>'),
                Some('b') | Some('B') => out.push('|'),
                Some('t') | Some('T') => {
                    out.push('\r');
                    out.push('\n');
                    lines += 1;
                }
                Some('$') => out.push('$'),
                Some(other) => {
                    out.push('$');
                    out.push(other);
                }
                None => out.push('$'),
            }
        }
        out.push('\r');
        out.push('\n');
        out.truncate(capacity);
        Some((out, lines))
    }
}
