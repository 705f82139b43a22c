use futures::future::{self, LocalBoxFuture};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::traits::{QueryError, QueryService};
use crate::types::{Scene, Vector3};

const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PromptError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("scene has no images to ask about")]
    NoObjects,
}

impl From<PromptError> for QueryError {
    fn from(e: PromptError) -> Self {
        match e {
            PromptError::EmptyQuery => QueryError::EmptyQuery,
            PromptError::NoObjects => QueryError::NoObjects,
        }
    }
}

/// What the assistant is told about one plane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectContext {
    pub id: String,
    pub description: String,
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: f32,
}

pub fn world_context(scene: &Scene) -> Vec<ObjectContext> {
    scene
        .objects()
        .iter()
        .map(|plane| ObjectContext {
            id: plane.id().short().to_string(),
            description: if plane.description.trim().is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                plane.description.clone()
            },
            position: plane.position,
            rotation: plane.rotation(),
            scale: plane.scale(),
        })
        .collect()
}

pub fn world_context_json(scene: &Scene) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&world_context(scene))
}

/// Assistant instruction with the scene state, followed by the user query
pub fn compose_prompt(scene: &Scene, query: &str) -> Result<String, PromptError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PromptError::EmptyQuery);
    }
    if scene.objects().is_empty() {
        return Err(PromptError::NoObjects);
    }

    // Serializing plain floats and strings cannot fail
    let context = world_context_json(scene).unwrap_or_default();

    Ok(format!(
        "You are an AI assistant helping to understand and interact with a 3D model composed of several images.\n\
         The user will provide a query about this model.\n\
         The model's current state is described by the following JSON data, where each object represents an image plane in the 3D scene:\n\
         {context}\n\n\
         Based on this data and the user's query, provide a concise and helpful response.\n\
         If the query asks to simulate a change, describe the likely outcome or what would need to happen. Do not actually modify the JSON data.\n\
         If a query is ambiguous or requires information not present in the descriptions or spatial data, state that clearly.\n\
         Focus on interpreting the spatial relationships and descriptive content of the images.\n\n\
         User Query: \"{query}\""
    ))
}

/// Compose the prompt for `query` and hand it to `service`
///
/// A blank answer counts as an empty response.
pub async fn submit_query(scene: &Scene, query: &str, service: &dyn QueryService) -> Result<String, QueryError> {
    let prompt = compose_prompt(scene, query)?;
    log::debug!("query on scene {} ({} plane(s))", scene.id(), scene.objects().len());

    let answer = match service.query(&prompt).await {
        Ok(text) if text.trim().is_empty() => Err(QueryError::EmptyResponse),
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => Err(e),
    };
    if let Err(e) = &answer {
        log::warn!("query on scene {}: {e}", scene.id());
    }
    answer
}

/// Offline query service answering from a fixed map of query to answer
///
/// Unknown queries get an empty response.
#[derive(Debug, Clone, Default)]
pub struct CannedAnswers {
    answers: HashMap<String, String>,
}

impl CannedAnswers {
    pub fn new(answers: HashMap<String, String>) -> Self {
        Self { answers }
    }

    /// Load a `{ "<query>": "<answer>" }` JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read answers from {}", path.display()))?;
        let answers = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse answers in {}", path.display()))?;
        Ok(Self::new(answers))
    }

    pub fn insert(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.answers.insert(query.into(), answer.into());
    }
}

impl QueryService for CannedAnswers {
    fn query<'a>(&'a self, prompt: &'a str) -> LocalBoxFuture<'a, Result<String, QueryError>> {
        let answer = self
            .answers
            .iter()
            .find(|(query, _)| prompt.ends_with(&format!("User Query: \"{}\"", query.trim())))
            .map(|(_, answer)| answer.clone())
            .ok_or(QueryError::EmptyResponse);
        Box::pin(future::ready(answer))
    }
}
