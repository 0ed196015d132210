use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Permission identifier.
///
/// Permissions are opaque capability names (e.g. "approve_drivers") granted
/// to staff accounts independently of their role. Authorization always
/// compares these raw names; labels come from the [`PermissionCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const APPROVE_DRIVERS: Permission = Permission(Cow::Borrowed("approve_drivers"));
    pub const ADD_PENALTIES: Permission = Permission(Cow::Borrowed("add_penalties"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display labels for permissions, as served by `GET /permissions`.
///
/// Display only: nothing in the access policy reads this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionCatalog {
    labels: BTreeMap<Permission, String>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(alias = "key", alias = "value")]
    name: Permission,
    #[serde(default, alias = "description")]
    label: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogWire {
    Map(BTreeMap<Permission, String>),
    List(Vec<CatalogEntry>),
}

impl<'de> Deserialize<'de> for PermissionCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let labels = match CatalogWire::deserialize(deserializer)? {
            CatalogWire::Map(labels) => labels,
            CatalogWire::List(entries) => entries
                .into_iter()
                .map(|e| {
                    let label = e.label.unwrap_or_else(|| e.name.as_str().to_string());
                    (e.name, label)
                })
                .collect(),
        };
        Ok(Self { labels })
    }
}

impl PermissionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, permission: Permission, label: impl Into<String>) {
        self.labels.insert(permission, label.into());
    }

    /// Human-readable label, falling back to the raw permission name.
    pub fn label<'a>(&'a self, permission: &'a Permission) -> &'a str {
        self.labels
            .get(permission)
            .map(String::as_str)
            .unwrap_or_else(|| permission.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Permission, &str)> {
        self.labels.iter().map(|(p, l)| (p, l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
