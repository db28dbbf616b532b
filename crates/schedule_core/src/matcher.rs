//! Well-name matching: shell-style globs, well lists, and canonical ordering.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Glob matching
// ---------------------------------------------------------------------------

/// Shell-style match of `name` against `pattern` (`*`, `?` and `[...]` classes).
pub fn shmatch(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut pi, mut si) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while si < name.len() {
        if pattern.get(pi) == Some(&'*') {
            star = Some((pi, si));
            pi += 1;
            continue;
        }
        if pi < pattern.len() {
            if let Some(step) = match_at(&pattern, pi, name[si]) {
                pi += step;
                si += 1;
                continue;
            }
        }
        let Some((star_pi, star_si)) = star else {
            return false;
        };
        pi = star_pi + 1;
        si = star_si + 1;
        star = Some((star_pi, star_si + 1));
    }
    pattern[pi..].iter().all(|&c| c == '*')
}

pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn match_at(pattern: &[char], pi: usize, c: char) -> Option<usize> {
    match pattern[pi] {
        '?' => Some(1),
        '[' => match class_len(&pattern[pi..]) {
            Some(len) => class_matches(&pattern[pi + 1..pi + len - 1], c).then_some(len),
            None => (c == '[').then_some(1),
        },
        literal => (literal == c).then_some(1),
    }
}

/// Length of a bracket class including both brackets, if it is closed.
fn class_len(class: &[char]) -> Option<usize> {
    let mut i = 1;
    if matches!(class.get(i), Some('!' | '^')) {
        i += 1;
    }
    // A leading ']' is a member, not the terminator.
    if class.get(i) == Some(&']') {
        i += 1;
    }
    class[i..].iter().position(|&c| c == ']').map(|pos| i + pos + 1)
}

fn class_matches(members: &[char], c: char) -> bool {
    let (negated, members) = match members.first() {
        Some('!' | '^') => (true, &members[1..]),
        _ => (false, members),
    };
    let mut found = false;
    let mut i = 0;
    while i < members.len() {
        if i + 2 < members.len() && members[i + 1] == '-' {
            found |= (members[i]..=members[i + 2]).contains(&c);
            i += 3;
        } else {
            found |= members[i] == c;
            i += 1;
        }
    }
    found != negated
}

// ---------------------------------------------------------------------------
// Well lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WListOp {
    New,
    Add,
    Mov,
    Del,
}

impl FromStr for WListOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Ok(WListOp::New),
            "ADD" => Ok(WListOp::Add),
            "MOV" => Ok(WListOp::Mov),
            "DEL" => Ok(WListOp::Del),
            _ => Err(s.to_string()),
        }
    }
}

/// Named well lists (`*LIST1`), each holding wells in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WListManager {
    lists: BTreeMap<String, Vec<String>>,
}

impl WListManager {
    pub fn is_list_name(name: &str) -> bool {
        name.starts_with('*') && name.len() > 1
    }

    pub fn has_list(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn wells(&self, name: &str) -> Option<&[String]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    pub fn list_names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn apply(&mut self, op: WListOp, name: &str, wells: &[String]) {
        match op {
            WListOp::New => {
                self.lists.insert(name.to_string(), Vec::new());
                self.add_wells(name, wells);
            }
            WListOp::Add => self.add_wells(name, wells),
            WListOp::Mov => {
                for list in self.lists.values_mut() {
                    list.retain(|well| !wells.contains(well));
                }
                self.add_wells(name, wells);
            }
            WListOp::Del => {
                if let Some(list) = self.lists.get_mut(name) {
                    list.retain(|well| !wells.contains(well));
                }
            }
        }
    }

    fn add_wells(&mut self, name: &str, wells: &[String]) {
        let list = self.lists.entry(name.to_string()).or_default();
        for well in wells {
            if !list.contains(well) {
                list.push(well.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical ordering
// ---------------------------------------------------------------------------

/// Insertion order of names; defines the canonical well ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOrder {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl NameOrder {
    pub fn add(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.names.len());
            self.names.push(name.to_string());
        }
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sort by insertion order; unknown names go last, alphabetically.
    pub fn sort(&self, mut names: Vec<String>) -> Vec<String> {
        names.sort_by(|a, b| {
            let key_a = (self.index(a).unwrap_or(usize::MAX), a);
            let key_b = (self.index(b).unwrap_or(usize::MAX), b);
            key_a.cmp(&key_b)
        });
        names
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameOrder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut order = NameOrder::default();
        for name in iter {
            order.add(name.as_ref());
        }
        order
    }
}

/// Resolves well patterns and well-list references against the known wells.
#[derive(Debug, Clone, Default)]
pub struct WellMatcher {
    order: NameOrder,
    wlm: WListManager,
}

impl WellMatcher {
    pub fn new(order: NameOrder) -> Self {
        Self {
            order,
            wlm: WListManager::default(),
        }
    }

    pub fn with_lists(order: NameOrder, wlm: WListManager) -> Self {
        Self { order, wlm }
    }

    pub fn wells(&self) -> &[String] {
        self.order.names()
    }

    /// Wells matching `pattern`, in canonical order. A `*NAME` pattern naming
    /// an existing well list resolves to that list.
    pub fn wells_matching(&self, pattern: &str) -> Vec<String> {
        if WListManager::is_list_name(pattern) {
            if let Some(list) = self.wlm.wells(pattern) {
                return self.sort(list.to_vec());
            }
        }
        if !has_wildcard(pattern) {
            return if self.order.index(pattern).is_some() {
                vec![pattern.to_string()]
            } else {
                Vec::new()
            };
        }
        self.order
            .names()
            .iter()
            .filter(|well| shmatch(pattern, well))
            .cloned()
            .collect()
    }

    pub fn sort(&self, names: Vec<String>) -> Vec<String> {
        self.order.sort(names)
    }

    pub fn wlist_manager(&self) -> &WListManager {
        &self.wlm
    }
}
