use crate::alias::AliasTable;
use crate::wchar::prelude::*;

fn table() -> AliasTable {
    let mut t = AliasTable::new();
    t.set(L!("cmd.exe"), L!("ll"), L!("dir /w $*"));
    t.set(L!("cmd.exe"), L!("go"), L!("pushd $1$Tdir"));
    t.set(L!("cmd.exe"), L!("meta"), L!("echo $L $G $B $$"));
    t
}

#[test]
fn test_lookup_is_case_insensitive() {
    let t = table();
    assert_eq!(t.get(L!("CMD.EXE"), L!("LL")), Some(L!("dir /w $*")));
    assert_eq!(t.get(L!("cmd.exe"), L!("missing")), None);
}

#[test]
fn test_redefine_and_remove() {
    let mut t = table();
    t.set(L!("cmd.exe"), L!("ll"), L!("ls"));
    assert_eq!(t.get(L!("cmd.exe"), L!("ll")), Some(L!("ls")));
    t.set(L!("cmd.exe"), L!("ll"), L!(""));
    assert_eq!(t.get(L!("cmd.exe"), L!("ll")), None);
}

#[test]
fn test_expansion_star() {
    let t = table();
    let (out, lines) = t
        .match_and_copy(L!("cmd.exe"), L!("ll src tests"), 256)
        .unwrap();
    assert_eq!(out, L!("dir /w src tests\r\n").to_owned());
    assert_eq!(lines, 1);
}

#[test]
fn test_expansion_numbered_and_multiline() {
    let t = table();
    let (out, lines) = t.match_and_copy(L!("cmd.exe"), L!("go c:\\src"), 256).unwrap();
    assert_eq!(out, L!("pushd c:\\src\r\ndir\r\n").to_owned());
    assert_eq!(lines, 2);
}

#[test]
fn test_expansion_metacharacters() {
    let t = table();
    let (out, _) = t.match_and_copy(L!("cmd.exe"), L!("meta"), 256).unwrap();
    assert_eq!(out, L!("echo < > | $\r\n").to_owned());
}

#[test]
fn test_no_match_for_non_first_token() {
    let t = table();
    assert!(t.match_and_copy(L!("cmd.exe"), L!("echo ll"), 256).is_none());
}

#[test]
fn test_expansion_capped_at_capacity() {
    let t = table();
    let (out, _) = t.match_and_copy(L!("cmd.exe"), L!("ll src"), 5).unwrap();
    assert_eq!(out.len(), 5);
}
