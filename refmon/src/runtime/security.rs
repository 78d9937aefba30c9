//! Stack-inspection reference monitor.
//!
//! Permission sets are declared on function definitions; a privileged
//! operation is admitted only if every activation record currently on the
//! call chain grants the full requested set.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A single resource capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Read,
    Write,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
        }
    }
}

/// A finite set of capabilities over the two-element alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    read: bool,
    write: bool,
}

impl PermissionSet {
    pub const fn empty() -> Self {
        PermissionSet {
            read: false,
            write: false,
        }
    }

    pub fn of(permissions: &[Permission]) -> Self {
        let mut set = PermissionSet::empty();
        for permission in permissions {
            match permission {
                Permission::Read => set.read = true,
                Permission::Write => set.write = true,
            }
        }
        set
    }

    pub fn contains(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.read,
            Permission::Write => self.write,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.read && !self.write
    }

    pub fn union(&self, other: PermissionSet) -> PermissionSet {
        PermissionSet {
            read: self.read || other.read,
            write: self.write || other.write,
        }
    }

    pub fn intersection(&self, other: PermissionSet) -> PermissionSet {
        PermissionSet {
            read: self.read && other.read,
            write: self.write && other.write,
        }
    }

    /// Capabilities in `self` that `other` lacks.
    pub fn difference(&self, other: PermissionSet) -> PermissionSet {
        PermissionSet {
            read: self.read && !other.read,
            write: self.write && !other.write,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> {
        [(self.read, Permission::Read), (self.write, Permission::Write)]
            .into_iter()
            .filter(|(member, _)| *member)
            .map(|(_, permission)| permission)
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().map(|p| p.to_string()).join(", "))
    }
}

/// The three privileged operations of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    Read,
    Write,
    Open,
}

impl AccessMode {
    /// Capabilities a frame must grant for this operation. `Open` requires
    /// the read/write union satisfied together in a single frame check.
    pub fn required(&self) -> PermissionSet {
        match self {
            AccessMode::Read => PermissionSet::of(&[Permission::Read]),
            AccessMode::Write => PermissionSet::of(&[Permission::Write]),
            AccessMode::Open => PermissionSet::of(&[Permission::Read, Permission::Write]),
        }
    }

    /// Symbol this operation appends to the event trace.
    pub fn symbol(&self) -> char {
        match self {
            AccessMode::Read => 'r',
            AccessMode::Write => 'w',
            AccessMode::Open => 'o',
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read"),
            AccessMode::Write => write!(f, "write"),
            AccessMode::Open => write!(f, "open"),
        }
    }
}

/// Declared permission sets of the live call chain, most recent call first.
/// One frame is pushed per call of a permission-tagged closure; extension
/// builds a new stack, so the caller's chain resumes untouched on return.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionStack {
    frames: Vec<PermissionSet>,
}

impl PermissionStack {
    pub fn new() -> Self {
        PermissionStack { frames: Vec::new() }
    }

    /// A new stack with `granted` prepended as the most recent frame.
    pub fn pushed(&self, granted: PermissionSet) -> PermissionStack {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.push(granted);
        frames.extend(self.frames.iter().copied());
        PermissionStack { frames }
    }

    pub fn frames(&self) -> &[PermissionSet] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Conjunctive fail-fast stack walk: every frame on the chain must
/// independently grant the full requested set. An empty request permits
/// trivially, and so does an exhausted (or empty) stack.
pub fn check(requested: PermissionSet, stack: &PermissionStack) -> bool {
    deny_reason(requested, stack).is_none()
}

/// Capabilities missing at the first frame that refuses `requested`, or
/// `None` when every frame grants it.
pub fn deny_reason(requested: PermissionSet, stack: &PermissionStack) -> Option<PermissionSet> {
    if requested.is_empty() {
        return None;
    }
    for frame in stack.frames() {
        if frame.intersection(requested) != requested {
            return Some(requested.difference(*frame));
        }
    }
    None
}
