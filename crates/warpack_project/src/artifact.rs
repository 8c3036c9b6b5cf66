//! Resolved build dependencies and their ordering.
//!
//! An [`Artifact`] is a dependency whose backing file is known. Artifacts are
//! ordered by [`Artifact::cmp`], which is the order used when overlays are
//! synthesized for dependencies that were not configured explicitly.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};

/// The packaging type of a dependency.
///
/// External type strings (as written in the project configuration) are mapped
/// to a variant through [`FromStr`]; anything not listed here is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactType {
    War,
    Zip,
    Jar,
    Ejb,
    EjbClient,
    Rar,
    Par,
    Aar,
    Mar,
    Xar,
    Tld,
    Pom,
}

impl ArtifactType {
    const ALL: [ArtifactType; 12] = [
        ArtifactType::War,
        ArtifactType::Zip,
        ArtifactType::Jar,
        ArtifactType::Ejb,
        ArtifactType::EjbClient,
        ArtifactType::Rar,
        ArtifactType::Par,
        ArtifactType::Aar,
        ArtifactType::Mar,
        ArtifactType::Xar,
        ArtifactType::Tld,
        ArtifactType::Pom,
    ];

    /// The external type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::War => "war",
            ArtifactType::Zip => "zip",
            ArtifactType::Jar => "jar",
            ArtifactType::Ejb => "ejb",
            ArtifactType::EjbClient => "ejb-client",
            ArtifactType::Rar => "rar",
            ArtifactType::Par => "par",
            ArtifactType::Aar => "aar",
            ArtifactType::Mar => "mar",
            ArtifactType::Xar => "xar",
            ArtifactType::Tld => "tld",
            ArtifactType::Pom => "pom",
        }
    }

    /// File extension of the artifact's backing file.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactType::Ejb | ArtifactType::EjbClient => "jar",
            other => other.as_str(),
        }
    }

    /// Whether artifacts of this type can be unpacked as an overlay.
    pub fn is_overlay_capable(&self) -> bool {
        matches!(self, ArtifactType::War | ArtifactType::Zip)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a type string has no [`ArtifactType`] mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeError(pub String);

impl fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown artifact type '{}'", self.0)
    }
}

impl std::error::Error for UnknownTypeError {}

impl FromStr for ArtifactType {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTypeError(s.to_string()))
    }
}

/// Collapse the different spellings of "no classifier" into `None`.
///
/// A missing classifier, an empty string and a whitespace-only string are all
/// treated as the same thing.
pub fn normalize_classifier(classifier: Option<&str>) -> Option<&str> {
    classifier.map(str::trim).filter(|c| !c.is_empty())
}

/// A resolved dependency with a backing file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    classifier: Option<String>,
    pub artifact_type: ArtifactType,
    pub file: Utf8PathBuf,
}

impl Artifact {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        artifact_type: ArtifactType,
        file: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            artifact_type,
            file: file.into(),
        }
    }

    /// Set the classifier. Empty classifiers are stored as `None`.
    pub fn with_classifier(mut self, classifier: Option<&str>) -> Self {
        self.classifier = normalize_classifier(classifier).map(str::to_string);
        self
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn file(&self) -> &Utf8Path {
        &self.file
    }

    /// `groupId:artifactId[:classifier]:type:version`
    pub fn id(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}:{}:{}:{}:{}",
                self.group_id, self.artifact_id, classifier, self.artifact_type, self.version
            ),
            None => format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.artifact_type, self.version
            ),
        }
    }

    /// Whether this artifact is the one described by the given coordinates.
    pub fn matches(
        &self,
        group_id: &str,
        artifact_id: &str,
        classifier: Option<&str>,
        artifact_type: ArtifactType,
    ) -> bool {
        self.group_id == group_id
            && self.artifact_id == artifact_id
            && self.classifier() == normalize_classifier(classifier)
            && self.artifact_type == artifact_type
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl Ord for Artifact {
    /// Group id, artifact id, version (see [`compare_versions`]), classifier
    /// (none first), type, then the raw version string and file path so the
    /// order stays total.
    fn cmp(&self, other: &Self) -> Ordering {
        self.group_id
            .cmp(&other.group_id)
            .then_with(|| self.artifact_id.cmp(&other.artifact_id))
            .then_with(|| compare_versions(&self.version, &other.version))
            .then_with(|| self.classifier.cmp(&other.classifier))
            .then_with(|| self.artifact_type.cmp(&other.artifact_type))
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.file.cmp(&other.file))
    }
}

impl PartialOrd for Artifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings.
///
/// Versions are split on `.` and `-` into segments. Numeric segments compare
/// numerically and rank above words, which compare case-insensitively. The
/// shorter version is padded with `0`, so `1.0` equals `1.0.0` and a trailing
/// word marks a pre-release (`1.0-SNAPSHOT` < `1.0`).
///
/// Every pair goes through the same rule, which keeps the order total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = version_segments(a);
    let right = version_segments(b);
    let padding = Segment::Number(0);

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).unwrap_or(&padding);
        let r = right.get(i).unwrap_or(&padding);
        let ord = l.cmp(r);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Variant order matters: words sort below numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Word(String),
    Number(u64),
}

fn version_segments(version: &str) -> Vec<Segment> {
    version
        .split(['.', '-'])
        .map(|segment| match segment.parse::<u64>() {
            Ok(n) => Segment::Number(n),
            Err(_) => Segment::Word(segment.to_ascii_lowercase()),
        })
        .collect()
}
