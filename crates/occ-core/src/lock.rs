//! Lock records and the insertion-ordered lock map produced by domain modules.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::verdict::{Verdict, VerdictClass};

/// A single named consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    /// Stable identifier, unique within a [`LockMap`].
    pub id: String,
    /// Whether the check held.
    pub pass: bool,
    /// Verdict tag describing how a violation should be classified.
    pub verdict: Verdict,
    /// Human readable note.
    pub note: String,
}

impl Lock {
    /// Creates a lock from all of its parts.
    pub fn new(id: impl Into<String>, pass: bool, verdict: Verdict, note: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pass,
            verdict,
            note: note.into(),
        }
    }

    /// A satisfied lock tagged `PASS`.
    pub fn passed(id: impl Into<String>, note: impl Into<String>) -> Self {
        Self::new(id, true, Verdict::pass(), note)
    }

    /// A violated lock tagged `FAIL(<id>)`.
    pub fn failed(id: impl Into<String>, note: impl Into<String>) -> Self {
        let id = id.into();
        let verdict = Verdict::fail(id.clone());
        Self::new(id, false, verdict, note)
    }

    /// A violated lock tagged `NO-EVAL(<id>)`.
    pub fn no_eval(id: impl Into<String>, note: impl Into<String>) -> Self {
        let id = id.into();
        let verdict = Verdict::no_eval(id.clone());
        Self::new(id, false, verdict, note)
    }

    /// Whether a violation of this lock is NoEval-class.
    pub fn is_no_eval_class(&self) -> bool {
        self.verdict.class() == VerdictClass::NoEval
    }
}

#[derive(Serialize, Deserialize)]
struct LockBody {
    pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verdict: Option<Verdict>,
    /// Older modules tag NoEval-class locks with `severity` only.
    #[serde(default, skip_serializing)]
    severity: Option<String>,
    #[serde(default)]
    note: String,
}

impl LockBody {
    fn into_lock(self, id: String) -> Lock {
        let verdict = match (self.verdict, self.severity.as_deref()) {
            (Some(verdict), _) => verdict,
            (None, Some(sev)) if sev.eq_ignore_ascii_case("NO-EVAL") => Verdict::no_eval(id.clone()),
            (None, _) if self.pass => Verdict::pass(),
            (None, _) => Verdict::fail(id.clone()),
        };
        Lock {
            id,
            pass: self.pass,
            verdict,
            note: self.note,
        }
    }
}

/// Locks in the order their module declared them.
///
/// Serialises as a JSON object whose key order is the declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockMap {
    locks: Vec<Lock>,
}

impl LockMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a lock. Re-inserting an existing id replaces it in place.
    pub fn insert(&mut self, lock: Lock) {
        match self.locks.iter_mut().find(|existing| existing.id == lock.id) {
            Some(slot) => *slot = lock,
            None => self.locks.push(lock),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, lock: Lock) -> Self {
        self.insert(lock);
        self
    }

    /// Looks up a lock by id.
    pub fn get(&self, id: &str) -> Option<&Lock> {
        self.locks.iter().find(|lock| lock.id == id)
    }

    /// Iterates in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Lock> {
        self.locks.iter()
    }

    /// Number of locks.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether the map holds no locks.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// First lock with `pass = false`, in declaration order.
    pub fn first_violation(&self) -> Option<&Lock> {
        self.locks.iter().find(|lock| !lock.pass)
    }

    /// Lock ids in declaration order.
    pub fn ids(&self) -> Vec<String> {
        self.locks.iter().map(|lock| lock.id.clone()).collect()
    }
}

impl FromIterator<Lock> for LockMap {
    fn from_iter<I: IntoIterator<Item = Lock>>(iter: I) -> Self {
        let mut map = LockMap::new();
        for lock in iter {
            map.insert(lock);
        }
        map
    }
}

impl<'a> IntoIterator for &'a LockMap {
    type Item = &'a Lock;
    type IntoIter = std::slice::Iter<'a, Lock>;

    fn into_iter(self) -> Self::IntoIter {
        self.locks.iter()
    }
}

impl Serialize for LockMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.locks.len()))?;
        for lock in &self.locks {
            let body = LockBody {
                pass: lock.pass,
                verdict: Some(lock.verdict.clone()),
                severity: None,
                note: lock.note.clone(),
            };
            map.serialize_entry(&lock.id, &body)?;
        }
        map.end()
    }
}

struct LockMapVisitor;

impl<'de> Visitor<'de> for LockMapVisitor {
    type Value = LockMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping lock ids to {pass, verdict, note}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = LockMap::new();
        while let Some((id, body)) = access.next_entry::<String, LockBody>()? {
            map.insert(body.into_lock(id));
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for LockMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LockMapVisitor)
    }
}
