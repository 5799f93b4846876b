use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Hosting providers whose "Source" URL is preferred over the generic homepage.
const HOSTING_MARKERS: [&str; 3] = ["github", "bitbucket", "gitlab"];

/// Metadata for one package as published by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub info: PackageInfo,

    /// Release version string to the files uploaded for that release.
    #[serde(default, deserialize_with = "null_as_default")]
    pub releases: BTreeMap<String, Vec<ReleaseUpload>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    #[serde(default, deserialize_with = "non_empty")]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "non_empty")]
    pub home_page: Option<String>,

    #[serde(default, deserialize_with = "non_empty_urls")]
    pub project_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseUpload {
    pub upload_time: NaiveDateTime,
}

impl RegistryEntry {
    /// The canonical homepage of the package.
    ///
    /// A "Source" project URL on a recognized hosting provider wins. Otherwise the declared
    /// homepage is used, falling back to the "Homepage" project URL.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        let source = self
            .info
            .project_urls
            .get("Source")
            .filter(|url| HOSTING_MARKERS.iter().any(|marker| url.contains(marker)));

        source
            .or(self.info.home_page.as_ref())
            .or_else(|| self.info.project_urls.get("Homepage"))
            .map(String::as_str)
    }

    /// Number of releases, or `None` if the package has never been released.
    #[must_use]
    pub fn release_count(&self) -> Option<u64> {
        if self.releases.is_empty() {
            None
        } else {
            Some(self.releases.len() as u64)
        }
    }

    /// The most recent upload date across all releases.
    #[must_use]
    pub fn last_release_date(&self) -> Option<NaiveDate> {
        self.releases
            .values()
            .flatten()
            .map(|upload| upload.upload_time.date())
            .max()
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn non_empty_urls<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<BTreeMap<String, Option<String>>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(label, url)| url.filter(|u| !u.trim().is_empty()).map(|u| (label, u)))
        .collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
