//! Computes the effective overlay list.
//!
//! The list is the configured overlays in their configured order, followed by
//! a synthesized overlay for every WAR dependency no configured overlay
//! references (in artifact order), followed by the current project if the
//! configuration did not place it. Without configured overlays the current
//! project comes first and every WAR dependency follows.

use warpack_project::{
    Artifact, ArtifactType, WarProject, DEFAULT_DEPENDENT_WAR_EXCLUDES,
    DEFAULT_DEPENDENT_WAR_INCLUDES,
};

use crate::error::{Error, Result};
use crate::overlay::Overlay;

/// Legacy include/exclude patterns for dependent WARs.
///
/// `None` means "not configured"; the defaults `**/**` and `META-INF/**` then
/// apply to synthesized overlays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyPatterns {
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
}

impl LegacyPatterns {
    pub fn is_configured(&self) -> bool {
        self.includes.is_some() || self.excludes.is_some()
    }

    fn includes_or_default(&self) -> Vec<String> {
        self.includes.clone().unwrap_or_else(|| {
            DEFAULT_DEPENDENT_WAR_INCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }

    fn excludes_or_default(&self) -> Vec<String> {
        self.excludes.clone().unwrap_or_else(|| {
            DEFAULT_DEPENDENT_WAR_EXCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }
}

#[derive(Debug, Clone)]
pub struct OverlayManager {
    overlays: Vec<Overlay>,
}

impl OverlayManager {
    /// Resolve the configured overlays against `dependencies` and complete
    /// the list.
    pub fn new(
        configured: Vec<Overlay>,
        dependencies: &[Artifact],
        legacy: &LegacyPatterns,
    ) -> Result<Self> {
        if !configured.is_empty() && legacy.is_configured() {
            return Err(Error::MutuallyExclusiveOptions(
                "dependent_war_includes/dependent_war_excludes cannot be combined with overlays"
                    .to_string(),
            ));
        }

        let mut wars: Vec<&Artifact> = dependencies
            .iter()
            .filter(|a| a.artifact_type == ArtifactType::War)
            .collect();
        wars.sort();

        let synthesize = |artifact: &Artifact| {
            Overlay::for_artifact(
                artifact,
                legacy.includes_or_default(),
                legacy.excludes_or_default(),
            )
        };

        if configured.is_empty() {
            let mut overlays = Vec::with_capacity(wars.len() + 1);
            overlays.push(Overlay::current_project());
            overlays.extend(wars.into_iter().map(synthesize));
            return Ok(Self::finish(overlays));
        }

        let candidates: Vec<Artifact> = dependencies
            .iter()
            .filter(|a| a.artifact_type.is_overlay_capable())
            .cloned()
            .collect();

        let mut overlays = Vec::with_capacity(configured.len() + wars.len() + 1);
        let mut has_current = false;
        for mut overlay in configured {
            if overlay.is_current_project() {
                if has_current {
                    return Err(Error::InvalidOverlay(
                        "the current project may only be configured once".to_string(),
                    ));
                }
                has_current = true;
            } else {
                overlay.resolve_artifact(&candidates)?;
                let artifact = overlay.artifact();
                if let Some(other) = overlays
                    .iter()
                    .find(|o: &&Overlay| artifact.is_some() && o.artifact() == artifact)
                {
                    return Err(Error::InvalidOverlay(format!(
                        "overlays [{}] and [{}] both reference {}",
                        other.id(),
                        overlay.id(),
                        artifact.map(Artifact::id).unwrap_or_default()
                    )));
                }
            }
            overlays.push(overlay);
        }

        for war in wars {
            let covered = overlays.iter().any(|o| o.artifact() == Some(war));
            if !covered {
                tracing::debug!("Adding default overlay for unreferenced dependency {}", war);
                overlays.push(synthesize(war));
            }
        }

        if !has_current {
            overlays.push(Overlay::current_project());
        }

        Ok(Self::finish(overlays))
    }

    /// Build the manager from a loaded project.
    pub fn from_project(project: &WarProject) -> Result<Self> {
        let configured = project
            .overlays
            .iter()
            .map(Overlay::from_config)
            .collect::<Result<Vec<_>>>()?;
        let legacy = LegacyPatterns {
            includes: project.dependent_war_includes.clone(),
            excludes: project.dependent_war_excludes.clone(),
        };
        Self::new(configured, &project.dependency_artifacts()?, &legacy)
    }

    fn finish(overlays: Vec<Overlay>) -> Self {
        tracing::debug!(
            "Effective overlays: [{}]",
            overlays.iter().map(Overlay::id).collect::<Vec<_>>().join(", ")
        );
        Self { overlays }
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay_ids(&self) -> Vec<String> {
        self.overlays.iter().map(Overlay::id).collect()
    }

    pub fn into_overlays(self) -> Vec<Overlay> {
        self.overlays
    }
}
