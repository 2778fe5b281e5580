//! Domain models for the subject `AuthZ` cache module.
//!
//! Resource shapes follow the cluster RBAC model: bindings and accounts carry
//! a list of [`Subject`] entries, each of which maps to at most one
//! [`SubjectKey`].

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SubjectAccessError;

/// Marker requesting every object of a kind in the retrieval helpers.
pub const WILDCARD: &str = "*";

/// Canonical identifier of an authorization subject.
///
/// Formed as `"user:" + name` or `"group:" + name` so that user and group
/// names never collide in the stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub const USER_PREFIX: &'static str = "user:";
    pub const GROUP_PREFIX: &'static str = "group:";

    #[must_use]
    pub fn user(name: &str) -> Self {
        Self(format!("{}{name}", Self::USER_PREFIX))
    }

    #[must_use]
    pub fn group(name: &str) -> Self {
        Self(format!("{}{name}", Self::GROUP_PREFIX))
    }

    /// Key of the user a service account authenticates as.
    #[must_use]
    pub fn service_account(namespace: &str, name: &str) -> Self {
        Self::user(&format!("system:serviceaccount:{namespace}:{name}"))
    }

    /// Map a raw binding subject to its key.
    ///
    /// Returns `None` for unrecognized kinds and for service accounts
    /// without a namespace.
    #[must_use]
    pub fn from_subject(subject: &Subject) -> Option<Self> {
        match SubjectKind::parse(&subject.kind)? {
            SubjectKind::User => Some(Self::user(&subject.name)),
            SubjectKind::Group => Some(Self::group(&subject.name)),
            SubjectKind::ServiceAccount => subject
                .namespace
                .as_deref()
                .map(|ns| Self::service_account(ns, &subject.name)),
        }
    }

    /// Accept an already formatted key, rejecting anything without a known prefix.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw
            .strip_prefix(Self::USER_PREFIX)
            .or_else(|| raw.strip_prefix(Self::GROUP_PREFIX))?;
        if name.is_empty() {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SubjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SubjectKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Recognized subject kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl SubjectKind {
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "User" => Some(Self::User),
            "Group" => Some(Self::Group),
            "ServiceAccount" => Some(Self::ServiceAccount),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::ServiceAccount => "ServiceAccount",
        }
    }
}

/// A subject entry as declared on a binding or an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// `User`, `Group` or `ServiceAccount`; other values are ignored.
    pub kind: String,
    pub name: String,
    /// Only meaningful for service accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Subject {
    #[must_use]
    pub fn new(kind: SubjectKind, name: &str) -> Self {
        Self {
            kind: kind.as_str().to_owned(),
            name: name.to_owned(),
            namespace: None,
        }
    }

    #[must_use]
    pub fn user(name: &str) -> Self {
        Self::new(SubjectKind::User, name)
    }

    #[must_use]
    pub fn group(name: &str) -> Self {
        Self::new(SubjectKind::Group, name)
    }

    #[must_use]
    pub fn service_account(namespace: &str, name: &str) -> Self {
        Self {
            namespace: Some(namespace.to_owned()),
            ..Self::new(SubjectKind::ServiceAccount, name)
        }
    }
}

/// Verbs accepted by the read API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Get,
    List,
    Watch,
    Create,
    Update,
    Delete,
}

impl Verb {
    pub const ALL: [Self; 6] = [
        Self::Get,
        Self::List,
        Self::Watch,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Watch => "watch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for Verb {
    type Err = SubjectAccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| SubjectAccessError::UnsupportedVerb { verb: s.to_owned() })
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user supplied per read call. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPrincipal {
    name: String,
    groups: Vec<String>,
}

impl UserPrincipal {
    #[must_use]
    pub fn builder() -> UserPrincipalBuilder {
        UserPrincipalBuilder::default()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Keys to look up for this principal: the user key first, then one per group.
    #[must_use]
    pub fn subject_keys(&self) -> Vec<SubjectKey> {
        std::iter::once(SubjectKey::user(&self.name))
            .chain(self.groups.iter().map(|g| SubjectKey::group(g)))
            .collect()
    }
}

#[derive(Default)]
pub struct UserPrincipalBuilder {
    name: Option<String>,
    groups: Vec<String>,
}

impl UserPrincipalBuilder {
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    #[must_use]
    pub fn group(mut self, group: &str) -> Self {
        self.groups.push(group.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> UserPrincipal {
        UserPrincipal {
            name: self.name.unwrap_or_default(),
            groups: self.groups,
        }
    }
}

/// Objects addressable by name through an [`crate::ObjectClient`].
pub trait NamedObject: Clone + Send + Sync + 'static {
    /// Kind reported in not-found errors and logs.
    const KIND: &'static str;

    fn name(&self) -> &str;
}

/// Reference from a binding to the role it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// `Role` or `ClusterRole`.
    pub kind: String,
    pub name: String,
}

/// A role binding. `namespace == None` marks a cluster-scoped binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub role_ref: RoleRef,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl RoleBinding {
    #[must_use]
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_none()
    }
}

impl NamedObject for RoleBinding {
    const KIND: &'static str = "RoleBinding";

    fn name(&self) -> &str {
        &self.name
    }
}

/// A tenant boundary whose declared subjects are granted access to its namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Account {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            subjects: Vec::new(),
        }
    }
}

impl NamedObject for Account {
    const KIND: &'static str = "Account";

    fn name(&self) -> &str {
        &self.name
    }
}

/// A managed namespace, optionally owned by an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Namespace {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            account: None,
        }
    }
}

impl NamedObject for Namespace {
    const KIND: &'static str = "Namespace";

    fn name(&self) -> &str {
        &self.name
    }
}
