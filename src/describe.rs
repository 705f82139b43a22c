use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use futures::future::{self, LocalBoxFuture};

use crate::traits::{DescribeError, DescribeRequest, DescriptionService};
use crate::types::{ImagePayload, PlaneId, Scene};

/// Per-plane outcome of one batch
pub type BatchResults = BTreeMap<PlaneId, Result<String, DescribeError>>;

/// Reject payloads no description service could read
pub fn validate_payload(payload: &ImagePayload) -> Result<(), DescribeError> {
    if payload.mime_type().is_empty() || payload.bytes().is_empty() {
        return Err(DescribeError::InvalidImageData);
    }
    if !payload.mime_type().starts_with("image/") {
        return Err(DescribeError::InvalidMimeType(payload.mime_type().to_string()));
    }
    if payload.dimensions().is_none() {
        return Err(DescribeError::InvalidImageData);
    }
    Ok(())
}

/// Describe each requested plane in turn; one failure never stops the batch
///
/// A repeated id is described once. Ids that are not in the scene are left
/// out of the results.
pub async fn describe_batch(scene: &Scene, ids: &[PlaneId], service: &dyn DescriptionService) -> BatchResults {
    let mut results = BatchResults::new();

    for id in ids {
        if results.contains_key(id) {
            continue;
        }
        let Some(plane) = scene.object(id) else {
            log::warn!("describe: plane {id} is not in scene {}", scene.id());
            continue;
        };

        let result = match validate_payload(plane.image()) {
            Err(e) => Err(e),
            Ok(()) => {
                let request = DescribeRequest {
                    plane: id,
                    mime_type: plane.image().mime_type(),
                    data: plane.image().bytes(),
                };
                match service.describe(request).await {
                    Ok(text) if text.trim().is_empty() => Err(DescribeError::EmptyResponse),
                    other => other,
                }
            }
        };

        if let Err(e) = &result {
            log::warn!("describe: plane {id}: {e}");
        }
        results.insert(id.clone(), result);
    }

    results
}

/// Counts for one finished batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub requested: usize,
    pub described: usize,
    pub warnings: usize,
    pub failed: usize,
    /// Requested ids that got no result or are not in the scene
    pub missing: usize,
}

impl BatchReport {
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    pub fn summary(&self) -> String {
        if self.has_errors() {
            format!(
                "Finished processing with {} error(s) out of {} images.",
                self.failed, self.requested
            )
        } else {
            format!("Described {} of {} image(s).", self.described, self.requested)
        }
    }
}

/// Write every result into its plane's description, verbatim on failure
///
/// `requested` may repeat ids; each distinct id counts once.
pub fn apply_descriptions(scene: &mut Scene, requested: &[PlaneId], results: BatchResults) -> BatchReport {
    let distinct: BTreeSet<&PlaneId> = requested.iter().collect();
    let mut report = BatchReport {
        requested: distinct.len(),
        missing: distinct.iter().filter(|id| !results.contains_key(**id)).count(),
        ..BatchReport::default()
    };

    for (id, result) in results {
        let Some(plane) = scene.object_mut(&id) else {
            report.missing += 1;
            continue;
        };
        plane.description = match result {
            Ok(text) => {
                report.described += 1;
                text.trim().to_string()
            }
            Err(e) => {
                if e.is_warning() {
                    report.warnings += 1;
                } else {
                    report.failed += 1;
                }
                e.to_string()
            }
        };
    }

    report
}

/// Offline describer backed by a fixed map
///
/// Keys may be full plane ids or their short form. Unknown planes get an
/// empty response.
#[derive(Debug, Clone, Default)]
pub struct StaticDescriber {
    descriptions: HashMap<String, String>,
}

impl StaticDescriber {
    pub fn new(descriptions: HashMap<String, String>) -> Self {
        Self { descriptions }
    }

    /// Load a `{ "<plane id>": "<text>" }` JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read descriptions from {}", path.display()))?;
        let descriptions = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse descriptions in {}", path.display()))?;
        Ok(Self::new(descriptions))
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.descriptions.insert(key.into(), text.into());
    }
}

impl DescriptionService for StaticDescriber {
    fn describe<'a>(&'a self, request: DescribeRequest<'a>) -> LocalBoxFuture<'a, Result<String, DescribeError>> {
        let text = self
            .descriptions
            .get(request.plane.as_str())
            .or_else(|| self.descriptions.get(request.plane.short()))
            .cloned()
            .ok_or(DescribeError::EmptyResponse);
        Box::pin(future::ready(text))
    }
}
